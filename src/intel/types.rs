//! Value types shared by the dispatch core

use serde::{Deserialize, Serialize};

use crate::intel::language::{file_path_from_uri, language_id_from_path};

/// Zero-based position inside a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// Half-open span between two positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Range covering `[start, end)` on a single line
    pub fn on_line(line: u32, start: u32, end: u32) -> Self {
        Self::new(Position::new(line, start), Position::new(line, end))
    }
}

/// Canonical location returned to callers; `uri` is always absolute
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub uri: String,
    pub range: Range,
}

/// Hover contents for a position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hover {
    pub contents: String,
    pub range: Option<Range>,
}

impl Hover {
    pub fn new(contents: impl Into<String>) -> Self {
        Self {
            contents: contents.into(),
            range: None,
        }
    }

    pub fn with_range(mut self, range: Range) -> Self {
        self.range = Some(range);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HighlightKind {
    Text,
    Read,
    Write,
}

/// A span in the current document that relates to the symbol under the cursor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentHighlight {
    pub range: Range,
    pub kind: Option<HighlightKind>,
}

/// Extra input for reference lookups
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceContext {
    pub include_declaration: bool,
}

/// Raw request parameters as received from a caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextDocumentPosition {
    pub uri: String,
    pub position: Position,
}

impl TextDocumentPosition {
    pub fn new(uri: impl Into<String>, position: Position) -> Self {
        Self {
            uri: uri.into(),
            position,
        }
    }
}

/// Identity of the document a request targets.
///
/// `path` and `language_id` are derived from the URI once, when the identity is
/// built. The dispatch core never loads document text; providers that need it
/// fetch it themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentIdentity {
    uri: String,
    path: String,
    language_id: String,
    text: Option<String>,
}

impl DocumentIdentity {
    pub fn from_uri(uri: impl Into<String>) -> Self {
        let uri = uri.into();
        let path = file_path_from_uri(&uri);
        let language_id = language_id_from_path(&path).to_string();
        Self {
            uri,
            path,
            language_id,
            text: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// File path inside the repository or filesystem
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn language_id(&self) -> &str {
        &self.language_id
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Final path segment
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_uri_derives_path_and_language_without_text() {
        let document = DocumentIdentity::from_uri("file:///work/src/main.rs");

        assert_eq!(document.uri(), "file:///work/src/main.rs");
        assert_eq!(document.path(), "/work/src/main.rs");
        assert_eq!(document.language_id(), "rust");
        assert_eq!(document.file_name(), "main.rs");
        assert!(document.text().is_none());
    }

    #[test]
    fn from_uri_uses_fragment_of_repository_uri() {
        let document = DocumentIdentity::from_uri("git://github.com/foo/bar?v1.0#cmd/app/main.go");

        assert_eq!(document.path(), "cmd/app/main.go");
        assert_eq!(document.language_id(), "go");
        assert_eq!(document.file_name(), "main.go");
    }

    #[test]
    fn from_uri_ignores_anchor_on_file_url() {
        let document = DocumentIdentity::from_uri("file:///a/b.rs#L10");

        assert_eq!(document.path(), "/a/b.rs");
        assert_eq!(document.language_id(), "rust");
    }
}
