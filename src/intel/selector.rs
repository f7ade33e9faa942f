//! Declarative document selectors

use crate::intel::language::LanguageSpec;
use crate::intel::types::DocumentIdentity;

/// One rule inside a [`DocumentSelector`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorClause {
    /// Matches the document's derived language id exactly
    Language(String),
    /// Matches the final path segment exactly
    Filename(String),
    /// The `*.ext` glob: matches paths ending in `.ext` (case-sensitive)
    Extension(String),
}

impl SelectorClause {
    /// Parses a filename pattern: `*.ext` becomes [`SelectorClause::Extension`],
    /// anything else a verbatim [`SelectorClause::Filename`]
    pub fn pattern(pattern: &str) -> Self {
        match pattern.strip_prefix("*.") {
            Some(extension) => Self::Extension(extension.to_string()),
            None => Self::Filename(pattern.to_string()),
        }
    }

    pub fn matches(&self, document: &DocumentIdentity) -> bool {
        match self {
            Self::Language(language_id) => document.language_id() == language_id,
            Self::Filename(name) => document.file_name() == name,
            Self::Extension(extension) => document
                .path()
                .strip_suffix(extension.as_str())
                .is_some_and(|rest| rest.ends_with('.')),
        }
    }
}

/// Ordered set of clauses; a document matches if any clause does
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentSelector {
    clauses: Vec<SelectorClause>,
}

impl DocumentSelector {
    pub fn new(clauses: Vec<SelectorClause>) -> Self {
        Self { clauses }
    }

    /// Selector for a catalog entry: its language id, then its verbatim
    /// filenames, then one `*.ext` glob per extension
    pub fn for_spec(spec: &LanguageSpec) -> Self {
        let clauses = std::iter::once(SelectorClause::Language(spec.language_id.clone()))
            .chain(
                spec.verbatim_filenames
                    .iter()
                    .map(|name| SelectorClause::Filename(name.clone())),
            )
            .chain(
                spec.file_exts
                    .iter()
                    .map(|ext| SelectorClause::pattern(&format!("*.{}", ext))),
            )
            .collect();
        Self::new(clauses)
    }

    pub fn clauses(&self) -> &[SelectorClause] {
        &self.clauses
    }

    pub fn matches(&self, document: &DocumentIdentity) -> bool {
        self.clauses.iter().any(|clause| clause.matches(document))
    }
}
