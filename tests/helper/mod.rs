//! Shared fixtures for the end-to-end LSP tests
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tower::Service;
use tower_lsp::jsonrpc::{Request, Response};
use tower_lsp::{ClientSocket, LspService};

use codeintel_lsp::intel::ProviderFactory;
use codeintel_lsp::lsp::backend::Backend;
use codeintel_lsp::search::{DocumentStore, SearchProviderFactory};
use codeintel_lsp::settings::{Settings, SettingsCascade};

pub const LIB_URI: &str = "file:///workspace/src/lib.rs";
pub const MAIN_URI: &str = "file:///workspace/src/main.rs";

pub const LIB_RS: &str = r#"pub struct Config {
    pub name: String,
}

impl Config {
    pub fn new(name: &str) -> Config {
        Config { name: name.to_string() }
    }
}
"#;

pub const MAIN_RS: &str = r#"use workspace::Config;

fn main() {
    let config = Config::new("demo");
    println!("{}", config.name);
}
"#;

pub fn empty_settings() -> SettingsCascade {
    SettingsCascade::valid(Settings::new())
}

/// Service backed by the built-in search providers
pub fn search_service(file_settings: SettingsCascade) -> (LspService<Backend>, ClientSocket) {
    let documents = DocumentStore::new();
    let factory = Arc::new(SearchProviderFactory::new(documents.clone()));
    service_with_factory(file_settings, documents, factory)
}

pub fn service_with_factory(
    file_settings: SettingsCascade,
    documents: DocumentStore,
    factory: Arc<dyn ProviderFactory>,
) -> (LspService<Backend>, ClientSocket) {
    LspService::build(|client| Backend::build(client, file_settings, documents, factory)).finish()
}

pub fn create_initialize_request(id: i64) -> Request {
    create_initialize_request_with_options(id, Value::Null)
}

pub fn create_initialize_request_with_options(id: i64, options: Value) -> Request {
    Request::build("initialize")
        .params(json!({
            "capabilities": {},
            "initializationOptions": options,
        }))
        .id(id)
        .finish()
}

pub fn create_initialized_notification() -> Request {
    Request::build("initialized").params(json!({})).finish()
}

pub fn create_did_open_notification(uri: &str, text: &str) -> Request {
    Request::build("textDocument/didOpen")
        .params(json!({
            "textDocument": {
                "uri": uri,
                "languageId": "rust",
                "version": 1,
                "text": text,
            }
        }))
        .finish()
}

pub fn create_did_change_notification(uri: &str, version: i32, text: &str) -> Request {
    Request::build("textDocument/didChange")
        .params(json!({
            "textDocument": { "uri": uri, "version": version },
            "contentChanges": [{ "text": text }],
        }))
        .finish()
}

pub fn create_did_close_notification(uri: &str) -> Request {
    Request::build("textDocument/didClose")
        .params(json!({ "textDocument": { "uri": uri } }))
        .finish()
}

pub fn create_did_change_configuration_notification(settings: Value) -> Request {
    Request::build("workspace/didChangeConfiguration")
        .params(json!({ "settings": settings }))
        .finish()
}

/// A position request such as `textDocument/definition`
pub fn create_position_request(
    id: i64,
    method: &'static str,
    uri: &str,
    line: u32,
    character: u32,
) -> Request {
    Request::build(method)
        .params(json!({
            "textDocument": { "uri": uri },
            "position": { "line": line, "character": character },
        }))
        .id(id)
        .finish()
}

pub fn create_references_request(
    id: i64,
    uri: &str,
    line: u32,
    character: u32,
    include_declaration: bool,
) -> Request {
    Request::build("textDocument/references")
        .params(json!({
            "textDocument": { "uri": uri },
            "position": { "line": line, "character": character },
            "context": { "includeDeclaration": include_declaration },
        }))
        .id(id)
        .finish()
}

/// Initializes the server and opens each document
pub async fn start(service: &mut LspService<Backend>, options: Value, documents: &[(&str, &str)]) {
    service
        .call(create_initialize_request_with_options(1, options))
        .await
        .unwrap();
    service
        .call(create_initialized_notification())
        .await
        .unwrap();

    for (uri, text) in documents {
        service
            .call(create_did_open_notification(uri, text))
            .await
            .unwrap();
    }
}

/// Sends a request and returns its successful result
pub async fn call_ok(service: &mut LspService<Backend>, request: Request) -> Value {
    let (_, result) = call(service, request).await.into_parts();
    result.unwrap()
}

pub async fn call(service: &mut LspService<Backend>, request: Request) -> Response {
    service
        .call(request)
        .await
        .unwrap()
        .expect("Expected a response")
}

/// Drains server-to-client messages so the client never blocks
pub fn spawn_notification_collector(mut socket: ClientSocket) -> mpsc::UnboundedReceiver<Request> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Some(message) = socket.next().await {
            if tx.send(message).is_err() {
                break;
            }
        }
    });
    rx
}

pub async fn wait_for_notification(
    rx: &mut mpsc::UnboundedReceiver<Request>,
    method: &str,
) -> Option<Request> {
    tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(message) = rx.recv().await {
            if message.method() == method {
                return Some(message);
            }
        }
        None
    })
    .await
    .ok()
    .flatten()
}

/// `(uri, start line, start character)` of each location in a result
pub fn location_starts(value: &Value) -> Vec<(String, u64, u64)> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|location| {
            (
                location["uri"].as_str().unwrap().to_string(),
                location["range"]["start"]["line"].as_u64().unwrap(),
                location["range"]["start"]["character"].as_u64().unwrap(),
            )
        })
        .collect()
}
