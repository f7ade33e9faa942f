//! Provider registry and language resolution

use tracing::{debug, info, warn};

use crate::intel::error::IntelError;
use crate::intel::language::LanguageSpec;
use crate::intel::provider::{ProviderError, ProviderSet};
use crate::intel::selector::DocumentSelector;
use crate::intel::types::DocumentIdentity;

/// Builds the provider set for one language
#[cfg_attr(test, mockall::automock)]
pub trait ProviderFactory: Send + Sync {
    fn create(&self, spec: &LanguageSpec) -> Result<ProviderSet, ProviderError>;
}

/// A configured language with its selector and providers
#[derive(Debug, Clone)]
pub struct LanguageEntry {
    pub spec: LanguageSpec,
    pub selector: DocumentSelector,
    pub providers: ProviderSet,
}

impl LanguageEntry {
    pub fn new(spec: LanguageSpec, selector: DocumentSelector, providers: ProviderSet) -> Self {
        Self {
            spec,
            selector,
            providers,
        }
    }

    pub fn language_id(&self) -> &str {
        &self.spec.language_id
    }
}

/// Ordered routing table from documents to provider sets.
///
/// Entry order is resolution priority: the first entry whose selector matches a
/// document wins. The table is never mutated after it is built.
#[derive(Debug, Default)]
pub struct Registry {
    entries: Vec<LanguageEntry>,
    empty: ProviderSet,
}

impl Registry {
    /// Builds one entry per spec, calling the factory exactly once for each.
    ///
    /// A language whose providers cannot be constructed is left out of the table;
    /// the remaining specs are still built.
    pub fn build(specs: &[LanguageSpec], factory: &dyn ProviderFactory) -> Self {
        let mut entries = Vec::with_capacity(specs.len());

        for spec in specs {
            match factory.create(spec) {
                Ok(providers) => {
                    debug!("Built providers for {}: {:?}", spec.language_id, providers);
                    entries.push(LanguageEntry::new(
                        spec.clone(),
                        DocumentSelector::for_spec(spec),
                        providers,
                    ));
                }
                Err(source) => {
                    let err = IntelError::ProviderConstructionFailed {
                        language: spec.language_id.clone(),
                        source,
                    };
                    warn!("{}; language excluded from registry", err);
                }
            }
        }

        info!(
            "Provider registry built with {} of {} languages",
            entries.len(),
            specs.len()
        );

        Self::from_entries(entries)
    }

    pub fn from_entries(entries: Vec<LanguageEntry>) -> Self {
        Self {
            entries,
            empty: ProviderSet::empty(),
        }
    }

    pub fn entries(&self) -> &[LanguageEntry] {
        &self.entries
    }

    pub fn specs(&self) -> impl Iterator<Item = &LanguageSpec> {
        self.entries.iter().map(|entry| &entry.spec)
    }

    /// First entry whose selector matches the document
    pub fn find(&self, document: &DocumentIdentity) -> Option<&LanguageEntry> {
        self.entries
            .iter()
            .find(|entry| entry.selector.matches(document))
    }

    /// Providers for the document, or the empty set when no language matches
    pub fn resolve(&self, document: &DocumentIdentity) -> &ProviderSet {
        self.find(document)
            .map(|entry| &entry.providers)
            .unwrap_or(&self.empty)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::intel::provider::{CapabilityKind, NoopProvider};
    use crate::intel::selector::SelectorClause;
    use mockall::predicate::function;

    fn spec(id: &str, ext: &str) -> LanguageSpec {
        LanguageSpec::new(id).with_exts(&[ext])
    }

    fn hover_only() -> ProviderSet {
        ProviderSet::empty().with_hover(Arc::new(NoopProvider))
    }

    #[test]
    fn build_calls_factory_once_per_spec_and_keeps_order() {
        let mut factory = MockProviderFactory::new();
        factory
            .expect_create()
            .times(3)
            .returning(|_| Ok(ProviderSet::empty()));

        let specs = vec![spec("go", "go"), spec("rust", "rs"), spec("python", "py")];
        let registry = Registry::build(&specs, &factory);

        let ids: Vec<&str> = registry.entries().iter().map(|e| e.language_id()).collect();
        assert_eq!(ids, vec!["go", "rust", "python"]);
    }

    #[test]
    fn build_excludes_language_whose_construction_fails() {
        let mut factory = MockProviderFactory::new();
        factory
            .expect_create()
            .with(function(|spec: &LanguageSpec| spec.language_id == "rust"))
            .times(1)
            .returning(|_| Err(ProviderError::Failed("negotiation failed".to_string())));
        factory
            .expect_create()
            .with(function(|spec: &LanguageSpec| spec.language_id != "rust"))
            .times(2)
            .returning(|_| Ok(ProviderSet::empty()));

        let specs = vec![spec("go", "go"), spec("rust", "rs"), spec("python", "py")];
        let registry = Registry::build(&specs, &factory);

        let ids: Vec<&str> = registry.specs().map(|s| s.language_id.as_str()).collect();
        assert_eq!(ids, vec!["go", "python"]);
        let document = DocumentIdentity::from_uri("file:///src/lib.rs");
        assert!(registry.find(&document).is_none());
    }

    #[test]
    fn resolve_returns_first_matching_entry() {
        let registry = Registry::from_entries(vec![
            LanguageEntry::new(
                LanguageSpec::new("ts"),
                DocumentSelector::new(vec![SelectorClause::pattern("*.ts")]),
                hover_only(),
            ),
            LanguageEntry::new(
                LanguageSpec::new("generic"),
                DocumentSelector::new(vec![
                    SelectorClause::Language("text".to_string()),
                    SelectorClause::pattern("*.ts"),
                ]),
                ProviderSet::empty(),
            ),
        ]);

        let document = DocumentIdentity::from_uri("file:///src/a.ts");

        assert_eq!(registry.find(&document).unwrap().language_id(), "ts");
        assert!(registry.resolve(&document).has(CapabilityKind::Hover));
    }

    #[test]
    fn resolve_falls_back_to_empty_set() {
        let registry = Registry::from_entries(vec![LanguageEntry::new(
            LanguageSpec::new("ts"),
            DocumentSelector::new(vec![SelectorClause::pattern("*.ts")]),
            hover_only(),
        )]);

        let document = DocumentIdentity::from_uri("file:///src/main.go");
        let providers = registry.resolve(&document);

        for kind in CapabilityKind::ALL {
            assert!(!providers.has(kind));
        }
    }
}
