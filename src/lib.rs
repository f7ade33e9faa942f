pub mod config;
pub mod intel;
pub mod log;
pub mod lsp;
pub mod search;
pub mod settings;
