//! Capability provider traits and the per-language provider bundle

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tower_lsp::lsp_types::Url;

use crate::intel::types::{
    DocumentHighlight, DocumentIdentity, Hover, Position, Range, ReferenceContext,
};

/// Code-intelligence operations a provider set can offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CapabilityKind {
    Definition,
    References,
    Implementations,
    Hover,
    DocumentHighlights,
}

impl CapabilityKind {
    pub const ALL: [CapabilityKind; 5] = [
        CapabilityKind::Definition,
        CapabilityKind::References,
        CapabilityKind::Implementations,
        CapabilityKind::Hover,
        CapabilityKind::DocumentHighlights,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Definition => "definition",
            Self::References => "references",
            Self::Implementations => "implementations",
            Self::Hover => "hover",
            Self::DocumentHighlights => "documentHighlights",
        }
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Document not available: {0}")]
    DocumentUnavailable(String),

    #[error("{0}")]
    Failed(String),
}

/// Raw output of a list-shaped provider, before normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderResult<T> {
    Empty,
    Single(T),
    /// `None` entries stand for values the provider left undefined
    Many(Vec<Option<T>>),
}

impl<T> ProviderResult<T> {
    /// Collapses a vector into the narrowest shape
    pub fn from_vec(mut values: Vec<T>) -> Self {
        match values.len() {
            0 => Self::Empty,
            1 => values.pop().map_or(Self::Empty, Self::Single),
            _ => Self::Many(values.into_iter().map(Some).collect()),
        }
    }
}

impl<T> Default for ProviderResult<T> {
    fn default() -> Self {
        Self::Empty
    }
}

/// Document a provider location points into
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentRef {
    Url(Url),
    /// Path relative to the requesting document's URI
    Relative(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderLocation {
    pub target: DocumentRef,
    pub range: Range,
}

impl ProviderLocation {
    pub fn absolute(url: Url, range: Range) -> Self {
        Self {
            target: DocumentRef::Url(url),
            range,
        }
    }

    pub fn relative(path: impl Into<String>, range: Range) -> Self {
        Self {
            target: DocumentRef::Relative(path.into()),
            range,
        }
    }
}

pub type LocationResult = Result<ProviderResult<ProviderLocation>, ProviderError>;

#[async_trait]
pub trait DefinitionProvider: Send + Sync {
    async fn provide_definition(
        &self,
        document: &DocumentIdentity,
        position: Position,
    ) -> LocationResult;
}

#[async_trait]
pub trait ReferencesProvider: Send + Sync {
    async fn provide_references(
        &self,
        document: &DocumentIdentity,
        position: Position,
        context: ReferenceContext,
    ) -> LocationResult;
}

#[async_trait]
pub trait ImplementationsProvider: Send + Sync {
    async fn provide_locations(
        &self,
        document: &DocumentIdentity,
        position: Position,
    ) -> LocationResult;
}

#[async_trait]
pub trait HoverProvider: Send + Sync {
    /// `Ok(None)` means "no hover", which is not the same as an empty hover
    async fn provide_hover(
        &self,
        document: &DocumentIdentity,
        position: Position,
    ) -> Result<Option<Hover>, ProviderError>;
}

#[async_trait]
pub trait DocumentHighlightProvider: Send + Sync {
    async fn provide_document_highlights(
        &self,
        document: &DocumentIdentity,
        position: Position,
    ) -> Result<Option<Vec<DocumentHighlight>>, ProviderError>;
}

/// Stands in for every capability a language does not provide
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProvider;

#[async_trait]
impl DefinitionProvider for NoopProvider {
    async fn provide_definition(&self, _: &DocumentIdentity, _: Position) -> LocationResult {
        Ok(ProviderResult::Empty)
    }
}

#[async_trait]
impl ReferencesProvider for NoopProvider {
    async fn provide_references(
        &self,
        _: &DocumentIdentity,
        _: Position,
        _: ReferenceContext,
    ) -> LocationResult {
        Ok(ProviderResult::Empty)
    }
}

#[async_trait]
impl ImplementationsProvider for NoopProvider {
    async fn provide_locations(&self, _: &DocumentIdentity, _: Position) -> LocationResult {
        Ok(ProviderResult::Empty)
    }
}

#[async_trait]
impl HoverProvider for NoopProvider {
    async fn provide_hover(
        &self,
        _: &DocumentIdentity,
        _: Position,
    ) -> Result<Option<Hover>, ProviderError> {
        Ok(None)
    }
}

#[async_trait]
impl DocumentHighlightProvider for NoopProvider {
    async fn provide_document_highlights(
        &self,
        _: &DocumentIdentity,
        _: Position,
    ) -> Result<Option<Vec<DocumentHighlight>>, ProviderError> {
        Ok(Some(Vec::new()))
    }
}

/// Bundle of capability providers registered for one language.
///
/// Missing capabilities are answered by [`NoopProvider`], so partial language
/// support needs no special casing at call sites.
#[derive(Clone, Default)]
pub struct ProviderSet {
    definition: Option<Arc<dyn DefinitionProvider>>,
    references: Option<Arc<dyn ReferencesProvider>>,
    implementations: Option<Arc<dyn ImplementationsProvider>>,
    hover: Option<Arc<dyn HoverProvider>>,
    document_highlights: Option<Arc<dyn DocumentHighlightProvider>>,
}

impl ProviderSet {
    /// A set where every capability is a no-op
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_definition(mut self, provider: Arc<dyn DefinitionProvider>) -> Self {
        self.definition = Some(provider);
        self
    }

    pub fn with_references(mut self, provider: Arc<dyn ReferencesProvider>) -> Self {
        self.references = Some(provider);
        self
    }

    pub fn with_implementations(mut self, provider: Arc<dyn ImplementationsProvider>) -> Self {
        self.implementations = Some(provider);
        self
    }

    pub fn with_hover(mut self, provider: Arc<dyn HoverProvider>) -> Self {
        self.hover = Some(provider);
        self
    }

    pub fn with_document_highlights(
        mut self,
        provider: Arc<dyn DocumentHighlightProvider>,
    ) -> Self {
        self.document_highlights = Some(provider);
        self
    }

    /// Whether a real (non no-op) provider is registered for `kind`
    pub fn has(&self, kind: CapabilityKind) -> bool {
        match kind {
            CapabilityKind::Definition => self.definition.is_some(),
            CapabilityKind::References => self.references.is_some(),
            CapabilityKind::Implementations => self.implementations.is_some(),
            CapabilityKind::Hover => self.hover.is_some(),
            CapabilityKind::DocumentHighlights => self.document_highlights.is_some(),
        }
    }

    pub fn definition(&self) -> &dyn DefinitionProvider {
        self.definition.as_deref().unwrap_or(&NoopProvider)
    }

    pub fn references(&self) -> &dyn ReferencesProvider {
        self.references.as_deref().unwrap_or(&NoopProvider)
    }

    pub fn implementations(&self) -> &dyn ImplementationsProvider {
        self.implementations.as_deref().unwrap_or(&NoopProvider)
    }

    pub fn hover(&self) -> &dyn HoverProvider {
        self.hover.as_deref().unwrap_or(&NoopProvider)
    }

    pub fn document_highlights(&self) -> &dyn DocumentHighlightProvider {
        self.document_highlights.as_deref().unwrap_or(&NoopProvider)
    }
}

impl fmt::Debug for ProviderSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(CapabilityKind::ALL.iter().filter(|kind| self.has(**kind)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_vec_picks_narrowest_shape() {
        assert_eq!(ProviderResult::<u32>::from_vec(vec![]), ProviderResult::Empty);
        assert_eq!(ProviderResult::from_vec(vec![7]), ProviderResult::Single(7));
        assert_eq!(
            ProviderResult::from_vec(vec![1, 2]),
            ProviderResult::Many(vec![Some(1), Some(2)])
        );
    }

    #[test]
    fn empty_set_has_no_capabilities() {
        let set = ProviderSet::empty();

        for kind in CapabilityKind::ALL {
            assert!(!set.has(kind), "{} should be absent", kind);
        }
    }

    #[test]
    fn partial_set_reports_only_registered_capabilities() {
        let set = ProviderSet::empty().with_hover(Arc::new(NoopProvider));

        assert!(set.has(CapabilityKind::Hover));
        assert!(!set.has(CapabilityKind::Definition));
        assert_eq!(format!("{:?}", set), "[Hover]");
    }

    #[tokio::test]
    async fn missing_capabilities_fall_back_to_noop() {
        let set = ProviderSet::empty();
        let document = DocumentIdentity::from_uri("file:///a.rs");
        let position = Position::new(0, 0);

        let definition = set
            .definition()
            .provide_definition(&document, position)
            .await
            .unwrap();
        let hover = set.hover().provide_hover(&document, position).await.unwrap();
        let highlights = set
            .document_highlights()
            .provide_document_highlights(&document, position)
            .await
            .unwrap();

        assert_eq!(definition, ProviderResult::Empty);
        assert_eq!(hover, None);
        assert_eq!(highlights, Some(Vec::new()));
    }
}
