//! Conversions between `lsp_types` and the dispatch core's value types

use tower_lsp::jsonrpc;
use tower_lsp::lsp_types::{self, Url};
use tracing::warn;

use crate::intel::error::IntelError;
use crate::intel::types::{
    DocumentHighlight, HighlightKind, Hover, Location, Position, Range, TextDocumentPosition,
};

pub fn to_request(params: &lsp_types::TextDocumentPositionParams) -> TextDocumentPosition {
    TextDocumentPosition::new(
        params.text_document.uri.as_str(),
        Position::new(params.position.line, params.position.character),
    )
}

pub fn to_lsp_range(range: Range) -> lsp_types::Range {
    lsp_types::Range::new(
        lsp_types::Position::new(range.start.line, range.start.character),
        lsp_types::Position::new(range.end.line, range.end.character),
    )
}

/// Converts canonical locations; a URI `lsp_types` cannot represent is dropped
pub fn to_lsp_locations(locations: Vec<Location>) -> Vec<lsp_types::Location> {
    locations
        .into_iter()
        .filter_map(|location| match Url::parse(&location.uri) {
            Ok(uri) => Some(lsp_types::Location::new(uri, to_lsp_range(location.range))),
            Err(e) => {
                warn!("Dropping location with invalid URI {}: {}", location.uri, e);
                None
            }
        })
        .collect()
}

pub fn to_lsp_hover(hover: Hover) -> lsp_types::Hover {
    lsp_types::Hover {
        contents: lsp_types::HoverContents::Markup(lsp_types::MarkupContent {
            kind: lsp_types::MarkupKind::Markdown,
            value: hover.contents,
        }),
        range: hover.range.map(to_lsp_range),
    }
}

pub fn to_lsp_highlights(highlights: Vec<DocumentHighlight>) -> Vec<lsp_types::DocumentHighlight> {
    highlights
        .into_iter()
        .map(|highlight| lsp_types::DocumentHighlight {
            range: to_lsp_range(highlight.range),
            kind: highlight.kind.map(|kind| match kind {
                HighlightKind::Text => lsp_types::DocumentHighlightKind::TEXT,
                HighlightKind::Read => lsp_types::DocumentHighlightKind::READ,
                HighlightKind::Write => lsp_types::DocumentHighlightKind::WRITE,
            }),
        })
        .collect()
}

/// Internal error whose message is the failure's display text
pub fn to_rpc_error(error: IntelError) -> jsonrpc::Error {
    let mut rpc_error = jsonrpc::Error::internal_error();
    rpc_error.message = error.to_string().into();
    rpc_error
}
