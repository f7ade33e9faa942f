//! Conversion of raw provider output into canonical results.
//!
//! List-shaped capabilities collapse "nothing" into an empty list. Hover keeps
//! `None` distinct from an empty hover so callers can skip showing a popover.

use tower_lsp::lsp_types::Url;
use tracing::warn;

use crate::intel::language::repository_path;
use crate::intel::provider::{DocumentRef, ProviderLocation, ProviderResult};
use crate::intel::types::{DocumentHighlight, DocumentIdentity, Hover, Location};

/// Flattens a location result and resolves every target to an absolute URI.
///
/// Relative targets are resolved against the requesting document. Targets
/// that cannot be made absolute are dropped.
pub fn normalize_locations(
    raw: ProviderResult<ProviderLocation>,
    document: &DocumentIdentity,
) -> Vec<Location> {
    let base = Url::parse(document.uri()).ok();

    let locations: Vec<ProviderLocation> = match raw {
        ProviderResult::Empty => Vec::new(),
        ProviderResult::Single(location) => vec![location],
        ProviderResult::Many(locations) => locations.into_iter().flatten().collect(),
    };

    locations
        .into_iter()
        .filter_map(|location| {
            let uri = resolve_target(&location.target, base.as_ref());
            if uri.is_none() {
                warn!(
                    "Dropping location {:?}: cannot resolve against {}",
                    location.target,
                    document.uri()
                );
            }
            uri.map(|uri| Location {
                uri,
                range: location.range,
            })
        })
        .collect()
}

pub fn normalize_highlights(raw: Option<Vec<DocumentHighlight>>) -> Vec<DocumentHighlight> {
    raw.unwrap_or_default()
}

/// Passes hover through untouched: `None` stays `None`, `""` stays `""`
pub fn normalize_hover(raw: Option<Hover>) -> Option<Hover> {
    raw
}

fn resolve_target(target: &DocumentRef, base: Option<&Url>) -> Option<String> {
    match target {
        DocumentRef::Url(url) => Some(url.to_string()),
        DocumentRef::Relative(path) => {
            let base = base?;
            if let Some(file) = repository_path(base) {
                let mut url = base.clone();
                url.set_fragment(Some(&join_path(file, path)));
                return Some(url.to_string());
            }

            // `a:b.rs` would otherwise parse as a URL with scheme `a`
            let joined = base.join(&dot_relative(path)).ok()?;
            (joined.scheme() == base.scheme()).then(|| joined.to_string())
        }
    }
}

/// Prefixes `./` unless the path is already rooted or dot-relative
fn dot_relative(path: &str) -> String {
    if path.starts_with('/') || path.starts_with("./") || path.starts_with("../") {
        path.to_string()
    } else {
        format!("./{}", path)
    }
}

fn join_path(base_file: &str, relative: &str) -> String {
    let mut segments: Vec<&str> = if relative.starts_with('/') {
        Vec::new()
    } else {
        let dir = base_file.rsplit_once('/').map_or("", |(dir, _)| dir);
        dir.split('/').filter(|s| !s.is_empty()).collect()
    };

    for segment in relative.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            segment => segments.push(segment),
        }
    }

    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intel::types::{HighlightKind, Range};
    use rstest::rstest;

    fn range() -> Range {
        Range::on_line(1, 4, 8)
    }

    fn absolute(uri: &str) -> ProviderLocation {
        ProviderLocation::absolute(Url::parse(uri).unwrap(), range())
    }

    fn uris(locations: &[Location]) -> Vec<&str> {
        locations.iter().map(|l| l.uri.as_str()).collect()
    }

    #[test]
    fn empty_result_becomes_empty_list() {
        let document = DocumentIdentity::from_uri("file:///a/b.rs");
        assert!(normalize_locations(ProviderResult::Empty, &document).is_empty());
        assert!(normalize_locations(ProviderResult::Many(vec![]), &document).is_empty());
    }

    #[test]
    fn single_result_becomes_one_element_list() {
        let document = DocumentIdentity::from_uri("file:///a/b.rs");
        let result = normalize_locations(
            ProviderResult::Single(absolute("file:///a/c.rs")),
            &document,
        );

        assert_eq!(
            result,
            vec![Location {
                uri: "file:///a/c.rs".to_string(),
                range: range(),
            }]
        );
    }

    #[test]
    fn many_result_keeps_order_and_drops_undefined_entries() {
        let document = DocumentIdentity::from_uri("file:///a/b.rs");
        let raw = ProviderResult::Many(vec![
            Some(absolute("file:///a/3.rs")),
            None,
            Some(absolute("file:///a/1.rs")),
            None,
        ]);

        let result = normalize_locations(raw, &document);

        assert_eq!(uris(&result), vec!["file:///a/3.rs", "file:///a/1.rs"]);
    }

    #[rstest]
    #[case("file:///work/src/main.rs", "lib.rs", "file:///work/src/lib.rs")]
    #[case("file:///work/src/main.rs", "../README.md", "file:///work/README.md")]
    #[case("file:///w/a:b.rs", "a:b.rs", "file:///w/a:b.rs")]
    #[case("file:///work/src/main.rs#L3", "lib.rs", "file:///work/src/lib.rs")]
    #[case(
        "git://github.com/foo/bar?v1#src/app/main.ts",
        "util.ts",
        "git://github.com/foo/bar?v1#src/app/util.ts"
    )]
    #[case(
        "git://github.com/foo/bar?v1#src/app/main.ts",
        "../../index.ts",
        "git://github.com/foo/bar?v1#index.ts"
    )]
    fn relative_targets_resolve_against_document(
        #[case] document_uri: &str,
        #[case] relative: &str,
        #[case] expected: &str,
    ) {
        let document = DocumentIdentity::from_uri(document_uri);
        let raw = ProviderResult::Single(ProviderLocation::relative(relative, range()));

        let result = normalize_locations(raw, &document);

        assert_eq!(uris(&result), vec![expected]);
    }

    #[test]
    fn relative_target_without_absolute_base_is_dropped() {
        let document = DocumentIdentity::from_uri("src/main.rs");
        let raw = ProviderResult::Many(vec![
            Some(ProviderLocation::relative("lib.rs", range())),
            Some(absolute("file:///elsewhere/lib.rs")),
        ]);

        let result = normalize_locations(raw, &document);

        assert_eq!(uris(&result), vec!["file:///elsewhere/lib.rs"]);
    }

    #[test]
    fn missing_highlights_become_empty_list() {
        assert!(normalize_highlights(None).is_empty());

        let highlight = DocumentHighlight {
            range: range(),
            kind: Some(HighlightKind::Read),
        };
        assert_eq!(
            normalize_highlights(Some(vec![highlight.clone()])),
            vec![highlight]
        );
    }

    #[test]
    fn hover_keeps_none_distinct_from_empty_contents() {
        assert_eq!(normalize_hover(None), None);
        assert_eq!(normalize_hover(Some(Hover::new(""))), Some(Hover::new("")));
    }
}
