//! In-memory store of open document text

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::intel::selector::DocumentSelector;
use crate::intel::types::DocumentIdentity;

/// Text of every open document, keyed by URI. Cheap to clone; clones share
/// the same contents.
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    documents: Arc<RwLock<HashMap<String, String>>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `text` for `uri`, replacing anything already there
    pub fn open(&self, uri: impl Into<String>, text: impl Into<String>) {
        self.documents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(uri.into(), text.into());
    }

    pub fn update(&self, uri: impl Into<String>, text: impl Into<String>) {
        self.open(uri, text);
    }

    pub fn close(&self, uri: &str) {
        self.documents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(uri);
    }

    pub fn get(&self, uri: &str) -> Option<String> {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(uri)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Open documents the selector matches, ordered by URI
    pub fn documents_matching(&self, selector: &DocumentSelector) -> Vec<(DocumentIdentity, String)> {
        let documents = self.documents.read().unwrap_or_else(PoisonError::into_inner);

        let mut matching: Vec<(DocumentIdentity, String)> = documents
            .iter()
            .map(|(uri, text)| (DocumentIdentity::from_uri(uri.as_str()), text))
            .filter(|(document, _)| selector.matches(document))
            .map(|(document, text)| (document, text.clone()))
            .collect();

        matching.sort_by(|(a, _), (b, _)| a.uri().cmp(b.uri()));
        matching
    }
}
