//! Dispatch façade: the single entry point for code-intelligence requests

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::intel::error::IntelError;
use crate::intel::normalize::{normalize_highlights, normalize_hover, normalize_locations};
use crate::intel::provider::{CapabilityKind, ProviderError, ProviderResult, ProviderSet};
use crate::intel::registry::{ProviderFactory, Registry};
use crate::intel::types::{
    DocumentHighlight, DocumentIdentity, Hover, Location, Position, ReferenceContext,
    TextDocumentPosition,
};
use crate::settings::Settings;

/// Label used in logs when no language matched a document
const NO_LANGUAGE: &str = "<none>";

/// A request after language resolution
struct LanguageRequest<'a> {
    document: DocumentIdentity,
    position: Position,
    language: &'a str,
    providers: &'a ProviderSet,
}

/// Routes each capability request to the provider set of the document's
/// language and normalizes what comes back.
///
/// Every provider call is bounded by `timeout`. A call that runs past it
/// resolves to the capability's empty result; a call that fails is reported
/// as [`IntelError::Provider`].
#[derive(Debug)]
pub struct CodeIntel {
    registry: Registry,
    timeout: Duration,
}

impl CodeIntel {
    pub fn new(registry: Registry, timeout: Duration) -> Self {
        Self { registry, timeout }
    }

    /// Builds the registry from the settings' language catalog
    pub fn from_settings(settings: &Settings, factory: &dyn ProviderFactory) -> Self {
        let registry = Registry::build(&settings.language_catalog(), factory);
        Self::new(registry, settings.provider_timeout())
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether the document's language has a real provider for `kind`
    pub fn has_provider(&self, uri: &str, kind: CapabilityKind) -> bool {
        let document = DocumentIdentity::from_uri(uri);
        self.registry
            .find(&document)
            .is_some_and(|entry| entry.providers.has(kind))
    }

    /// Whether any language claims the document
    pub fn has_reference_providers(&self, uri: &str) -> bool {
        self.registry
            .find(&DocumentIdentity::from_uri(uri))
            .is_some()
    }

    pub async fn get_definition(
        &self,
        params: &TextDocumentPosition,
    ) -> Result<Vec<Location>, IntelError> {
        let request = self.request_for(params);
        let raw = self
            .guarded(
                &request,
                CapabilityKind::Definition,
                request
                    .providers
                    .definition()
                    .provide_definition(&request.document, request.position),
                ProviderResult::Empty,
            )
            .await?;
        Ok(normalize_locations(raw, &request.document))
    }

    pub async fn get_references(
        &self,
        params: &TextDocumentPosition,
        context: ReferenceContext,
    ) -> Result<Vec<Location>, IntelError> {
        let request = self.request_for(params);
        let raw = self
            .guarded(
                &request,
                CapabilityKind::References,
                request.providers.references().provide_references(
                    &request.document,
                    request.position,
                    context,
                ),
                ProviderResult::Empty,
            )
            .await?;
        Ok(normalize_locations(raw, &request.document))
    }

    pub async fn get_implementations(
        &self,
        params: &TextDocumentPosition,
    ) -> Result<Vec<Location>, IntelError> {
        let request = self.request_for(params);
        let raw = self
            .guarded(
                &request,
                CapabilityKind::Implementations,
                request
                    .providers
                    .implementations()
                    .provide_locations(&request.document, request.position),
                ProviderResult::Empty,
            )
            .await?;
        Ok(normalize_locations(raw, &request.document))
    }

    /// Hover is not list-normalized: `Ok(None)` means there is nothing to show
    pub async fn get_hover(
        &self,
        params: &TextDocumentPosition,
    ) -> Result<Option<Hover>, IntelError> {
        let request = self.request_for(params);
        let raw = self
            .guarded(
                &request,
                CapabilityKind::Hover,
                request
                    .providers
                    .hover()
                    .provide_hover(&request.document, request.position),
                None,
            )
            .await?;
        Ok(normalize_hover(raw))
    }

    pub async fn get_document_highlights(
        &self,
        params: &TextDocumentPosition,
    ) -> Result<Vec<DocumentHighlight>, IntelError> {
        let request = self.request_for(params);
        let raw = self
            .guarded(
                &request,
                CapabilityKind::DocumentHighlights,
                request
                    .providers
                    .document_highlights()
                    .provide_document_highlights(&request.document, request.position),
                None,
            )
            .await?;
        Ok(normalize_highlights(raw))
    }

    fn request_for(&self, params: &TextDocumentPosition) -> LanguageRequest<'_> {
        let document = DocumentIdentity::from_uri(params.uri.as_str());
        let (language, providers) = match self.registry.find(&document) {
            Some(entry) => (entry.language_id(), &entry.providers),
            None => (NO_LANGUAGE, self.registry.resolve(&document)),
        };

        LanguageRequest {
            document,
            position: params.position,
            language,
            providers,
        }
    }

    /// Races a provider call against the timeout
    async fn guarded<T, F>(
        &self,
        request: &LanguageRequest<'_>,
        capability: CapabilityKind,
        call: F,
        on_timeout: T,
    ) -> Result<T, IntelError>
    where
        F: Future<Output = Result<T, ProviderError>>,
    {
        debug!(
            "Dispatching {} for {} at {}:{} to {}",
            capability,
            request.document.uri(),
            request.position.line,
            request.position.character,
            request.language
        );

        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(source)) => Err(IntelError::Provider {
                capability,
                language: request.language.to_string(),
                source,
            }),
            Err(_) => {
                let err = IntelError::ProviderTimeout {
                    capability,
                    language: request.language.to_string(),
                    timeout: self.timeout,
                };
                warn!("{}; returning empty result", err);
                Ok(on_timeout)
            }
        }
    }
}
