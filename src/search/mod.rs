// Text-search providers backing the built-in languages
// - documents.rs: Open document text shared with the LSP layer
// - providers.rs: Keyword/identifier search implementing every capability

pub mod documents;
pub mod providers;

use std::sync::Arc;

use crate::intel::language::LanguageSpec;
use crate::intel::provider::{ProviderError, ProviderSet};
use crate::intel::registry::ProviderFactory;

pub use documents::DocumentStore;
pub use providers::SearchProviders;

/// Builds search providers over a shared [`DocumentStore`].
///
/// References and highlights are always registered. Definitions and hover need
/// definition keywords. Implementations need the language to support them and
/// to name implementation keywords.
#[derive(Debug, Clone, Default)]
pub struct SearchProviderFactory {
    store: DocumentStore,
}

impl SearchProviderFactory {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }
}

impl ProviderFactory for SearchProviderFactory {
    fn create(&self, spec: &LanguageSpec) -> Result<ProviderSet, ProviderError> {
        let providers = Arc::new(SearchProviders::new(spec, self.store.clone())?);

        let mut set = ProviderSet::empty()
            .with_references(providers.clone())
            .with_document_highlights(providers.clone());

        if providers.has_definitions() {
            set = set
                .with_definition(providers.clone())
                .with_hover(providers.clone());
        }
        if providers.has_implementations() {
            set = set.with_implementations(providers);
        }

        Ok(set)
    }
}
