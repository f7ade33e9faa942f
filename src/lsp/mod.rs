// LSP protocol layer
// - server.rs: stdio server setup
// - backend.rs: LanguageServer trait implementation
// - convert.rs: lsp_types <-> dispatch core conversions

pub mod backend;
pub mod convert;
pub mod server;
