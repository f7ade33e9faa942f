use std::sync::Arc;

use serde_json::Value;
use tokio::sync::watch;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};
use tracing::{debug, info, warn};

use crate::intel::{BootstrapState, Bootstrapper, CodeIntel, ProviderFactory};
use crate::lsp::convert::{
    to_lsp_highlights, to_lsp_hover, to_lsp_locations, to_request, to_rpc_error,
};
use crate::search::{DocumentStore, SearchProviderFactory};
use crate::settings::{Settings, SettingsCascade};

pub struct Backend {
    client: Client,
    documents: DocumentStore,
    bootstrapper: Arc<Bootstrapper>,
    settings: watch::Sender<Option<SettingsCascade>>,
    /// Snapshot read from the settings file at startup
    file_settings: SettingsCascade,
}

impl Backend {
    /// Backend serving the built-in search providers
    pub fn with_settings(client: Client, file_settings: SettingsCascade) -> Self {
        let documents = DocumentStore::new();
        let factory = Arc::new(SearchProviderFactory::new(documents.clone()));
        Self::build(client, file_settings, documents, factory)
    }

    pub fn build(
        client: Client,
        file_settings: SettingsCascade,
        documents: DocumentStore,
        factory: Arc<dyn ProviderFactory>,
    ) -> Self {
        let (settings, receiver) = watch::channel(None);
        Self {
            client,
            documents,
            bootstrapper: Arc::new(Bootstrapper::new(receiver, factory)),
            settings,
            file_settings,
        }
    }

    pub fn server_capabilities() -> ServerCapabilities {
        ServerCapabilities {
            text_document_sync: Some(TextDocumentSyncCapability::Options(
                TextDocumentSyncOptions {
                    open_close: Some(true),
                    change: Some(TextDocumentSyncKind::FULL),
                    ..Default::default()
                },
            )),
            definition_provider: Some(OneOf::Left(true)),
            references_provider: Some(OneOf::Left(true)),
            implementation_provider: Some(ImplementationProviderCapability::Simple(true)),
            hover_provider: Some(HoverProviderCapability::Simple(true)),
            document_highlight_provider: Some(OneOf::Left(true)),
            ..Default::default()
        }
    }

    fn publish(&self, cascade: SettingsCascade) {
        if self.bootstrapper.state() == BootstrapState::Ready {
            info!("Ignoring settings change: code intelligence is already initialized");
            return;
        }
        self.settings.send_replace(Some(cascade));
    }

    async fn intel(&self) -> Result<Arc<CodeIntel>> {
        self.bootstrapper.get().await.map_err(to_rpc_error)
    }

    fn spawn_bootstrap(&self) {
        let bootstrapper = Arc::clone(&self.bootstrapper);
        tokio::spawn(async move {
            if let Err(e) = bootstrapper.get().await {
                warn!("Code intelligence is not available yet: {}", e);
            }
        });
    }
}

/// Overlays client-provided settings on a base snapshot.
///
/// A non-object overlay makes the snapshot invalid. A base that is still
/// loading or already invalid is returned as is.
pub fn overlay_settings(base: &SettingsCascade, overlay: Option<Value>) -> SettingsCascade {
    let overlay = match overlay {
        None | Some(Value::Null) => return base.clone(),
        Some(value) => value,
    };

    let Some(overrides) = Settings::from_json(overlay) else {
        let mut cascade = base.clone();
        cascade
            .errors
            .push("Client settings must be a JSON object".to_string());
        return cascade;
    };

    match (&base.final_settings, base.errors.is_empty()) {
        (Some(settings), true) => {
            let mut merged = settings.clone();
            merged.merge(overrides);
            SettingsCascade::valid(merged)
        }
        _ => base.clone(),
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        self.client
            .log_message(MessageType::INFO, "LSP server initializing")
            .await;

        self.publish(overlay_settings(
            &self.file_settings,
            params.initialization_options,
        ));

        Ok(InitializeResult {
            capabilities: Self::server_capabilities(),
            server_info: Some(ServerInfo {
                name: "codeintel-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        self.client
            .log_message(MessageType::INFO, "LSP server initialized")
            .await;
        self.spawn_bootstrap();
    }

    async fn shutdown(&self) -> Result<()> {
        self.client
            .log_message(MessageType::INFO, "LSP server shutting down")
            .await;
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri.as_str();

        self.client
            .log_message(MessageType::LOG, format!("Document opened: {}", uri))
            .await;

        self.documents.open(uri, params.text_document.text);
    }

    async fn did_change(&self, mut params: DidChangeTextDocumentParams) {
        // Full sync: the last change carries the whole document
        let Some(change) = params.content_changes.pop() else {
            return;
        };
        debug!("Document changed: {}", params.text_document.uri);
        self.documents
            .update(params.text_document.uri.as_str(), change.text);
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        debug!("Document closed: {}", params.text_document.uri);
        self.documents.close(params.text_document.uri.as_str());
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        self.publish(overlay_settings(&self.file_settings, Some(params.settings)));
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let request = to_request(&params.text_document_position_params);
        let locations = self
            .intel()
            .await?
            .get_definition(&request)
            .await
            .map_err(to_rpc_error)?;
        Ok(Some(GotoDefinitionResponse::Array(to_lsp_locations(
            locations,
        ))))
    }

    async fn references(&self, params: ReferenceParams) -> Result<Option<Vec<Location>>> {
        let request = to_request(&params.text_document_position);
        let context = crate::intel::types::ReferenceContext {
            include_declaration: params.context.include_declaration,
        };
        let locations = self
            .intel()
            .await?
            .get_references(&request, context)
            .await
            .map_err(to_rpc_error)?;
        Ok(Some(to_lsp_locations(locations)))
    }

    async fn goto_implementation(
        &self,
        params: request::GotoImplementationParams,
    ) -> Result<Option<request::GotoImplementationResponse>> {
        let request = to_request(&params.text_document_position_params);
        let locations = self
            .intel()
            .await?
            .get_implementations(&request)
            .await
            .map_err(to_rpc_error)?;
        Ok(Some(GotoDefinitionResponse::Array(to_lsp_locations(
            locations,
        ))))
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let request = to_request(&params.text_document_position_params);
        let hover = self
            .intel()
            .await?
            .get_hover(&request)
            .await
            .map_err(to_rpc_error)?;
        Ok(hover.map(to_lsp_hover))
    }

    async fn document_highlight(
        &self,
        params: DocumentHighlightParams,
    ) -> Result<Option<Vec<DocumentHighlight>>> {
        let request = to_request(&params.text_document_position_params);
        let highlights = self
            .intel()
            .await?
            .get_document_highlights(&request)
            .await
            .map_err(to_rpc_error)?;
        Ok(Some(to_lsp_highlights(highlights)))
    }
}
