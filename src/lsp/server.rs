use std::path::PathBuf;

use tower_lsp::{LspService, Server};
use tracing::info;

use crate::config::{load_settings, settings_path};
use crate::log::init;
use crate::lsp::backend::Backend;

/// Runs the server over stdio until the client disconnects.
///
/// `settings` overrides the default settings file and `log_filter` overrides
/// `RUST_LOG`.
pub async fn run_server(settings: Option<PathBuf>, log_filter: Option<String>) -> anyhow::Result<()> {
    let _log_guard = init(log_filter.as_deref())?;

    info!("Starting codeintel-lsp server");

    let settings_path = settings.unwrap_or_else(settings_path);
    let file_settings = load_settings(&settings_path);

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) =
        LspService::new(|client| Backend::with_settings(client, file_settings));
    Server::new(stdin, stdout, socket).serve(service).await;

    info!("codeintel-lsp server stopped");
    Ok(())
}
