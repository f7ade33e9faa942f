use std::path::PathBuf;

use clap::Parser;

use codeintel_lsp::lsp::server::run_server;

/// Code-intelligence language server speaking LSP over stdio
#[derive(Debug, Parser)]
#[command(name = "codeintel-lsp", version, about)]
struct Cli {
    /// Settings file to read instead of the default location
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Log filter directives, e.g. `debug` or `codeintel_lsp=trace`
    #[arg(long, value_name = "FILTER")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_server(cli.settings, cli.log_level).await
}
