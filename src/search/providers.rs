//! Text-search providers
//!
//! Answers every capability from the text of open documents using a
//! language's identifier pattern and definition/implementation keywords.
//! Results are heuristic: a definition is any line where a keyword such as
//! `fn` or `class` is followed by the word under the cursor.
//!
//! Columns are UTF-16 code units, the LSP default position encoding. Scans
//! run on the blocking pool so a caller's timeout can abandon them.

use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use tower_lsp::lsp_types::Url;

use crate::intel::language::LanguageSpec;
use crate::intel::provider::{
    DefinitionProvider, DocumentHighlightProvider, HoverProvider, ImplementationsProvider,
    LocationResult, ProviderError, ProviderLocation, ProviderResult, ReferencesProvider,
};
use crate::intel::selector::DocumentSelector;
use crate::intel::types::{
    DocumentHighlight, DocumentIdentity, HighlightKind, Hover, Position, Range, ReferenceContext,
};
use crate::search::documents::DocumentStore;

/// A line where a keyword introduces the searched word
#[derive(Debug, Clone, PartialEq, Eq)]
struct Site {
    range: Range,
    line: String,
}

/// The word under the cursor and the text of the document it was read from
struct Target {
    text: String,
    word: String,
    range: Range,
}

pub struct SearchProviders {
    searcher: Arc<Searcher>,
}

impl SearchProviders {
    pub fn new(spec: &LanguageSpec, store: DocumentStore) -> Result<Self, ProviderError> {
        Ok(Self {
            searcher: Arc::new(Searcher::new(spec, store)?),
        })
    }

    pub fn has_definitions(&self) -> bool {
        self.searcher.definition_keywords.is_some()
    }

    pub fn has_implementations(&self) -> bool {
        self.searcher.implementation_keywords.is_some()
    }

    async fn run<T, F>(&self, task: F) -> Result<T, ProviderError>
    where
        T: Send + 'static,
        F: FnOnce(&Searcher) -> Result<T, ProviderError> + Send + 'static,
    {
        let searcher = Arc::clone(&self.searcher);
        tokio::task::spawn_blocking(move || task(&searcher))
            .await
            .map_err(|e| ProviderError::Failed(format!("Search task failed: {}", e)))?
    }
}

/// Synchronous search over the document store
struct Searcher {
    language_id: String,
    selector: DocumentSelector,
    store: DocumentStore,
    identifier: Regex,
    /// Escaped alternation of definition keywords
    definition_keywords: Option<String>,
    /// Escaped alternation of implementation keywords
    implementation_keywords: Option<String>,
}

impl Searcher {
    fn new(spec: &LanguageSpec, store: DocumentStore) -> Result<Self, ProviderError> {
        let identifier = Regex::new(&spec.identifier_pattern)?;
        if identifier.is_match("") {
            return Err(ProviderError::Failed(format!(
                "identifier pattern {:?} matches the empty string",
                spec.identifier_pattern
            )));
        }

        let implementation_keywords = if spec.implementations_supported {
            alternation(&spec.implementation_keywords)
        } else {
            None
        };

        Ok(Self {
            language_id: spec.language_id.clone(),
            selector: DocumentSelector::for_spec(spec),
            store,
            identifier,
            definition_keywords: alternation(&spec.definition_keywords),
            implementation_keywords,
        })
    }

    fn text_of(&self, document: &DocumentIdentity) -> Result<String, ProviderError> {
        if let Some(text) = document.text() {
            return Ok(text.to_string());
        }
        self.store
            .get(document.uri())
            .ok_or_else(|| ProviderError::DocumentUnavailable(document.uri().to_string()))
    }

    fn target(
        &self,
        document: &DocumentIdentity,
        position: Position,
    ) -> Result<Option<Target>, ProviderError> {
        let text = self.text_of(document)?;
        Ok(self
            .word_at(&text, position)
            .map(|(word, range)| Target { text, word, range }))
    }

    /// The requesting document first, then other open documents of the same
    /// language ordered by URI
    fn corpus(&self, document: &DocumentIdentity, text: String) -> Vec<(DocumentIdentity, String)> {
        let others = self
            .store
            .documents_matching(&self.selector)
            .into_iter()
            .filter(|(other, _)| other.uri() != document.uri());

        std::iter::once((document.clone(), text)).chain(others).collect()
    }

    /// The identifier under (or immediately before) the cursor
    fn word_at(&self, text: &str, position: Position) -> Option<(String, Range)> {
        let line = text.lines().nth(position.line as usize)?;

        self.identifier.find_iter(line).find_map(|m| {
            let start = utf16_column(line, m.start());
            let end = utf16_column(line, m.end());
            (start <= position.character && position.character <= end).then(|| {
                (
                    m.as_str().to_string(),
                    Range::on_line(position.line, start, end),
                )
            })
        })
    }

    fn occurrences(&self, text: &str, word: &str) -> Vec<Range> {
        text.lines()
            .enumerate()
            .flat_map(|(index, line)| {
                self.identifier
                    .find_iter(line)
                    .filter(move |m| m.as_str() == word)
                    .map(move |m| {
                        Range::on_line(
                            line_number(index),
                            utf16_column(line, m.start()),
                            utf16_column(line, m.end()),
                        )
                    })
            })
            .collect()
    }

    fn definition_regex(&self, word: &str) -> Result<Option<Regex>, ProviderError> {
        self.definition_keywords
            .as_ref()
            .map(|keywords| {
                Regex::new(&format!(r"\b(?:{})\s+({})\b", keywords, regex::escape(word)))
            })
            .transpose()
            .map_err(ProviderError::from)
    }

    fn implementation_regex(&self, word: &str) -> Result<Option<Regex>, ProviderError> {
        self.implementation_keywords
            .as_ref()
            .map(|keywords| {
                Regex::new(&format!(r"\b(?:{})\b.*?\b({})\b", keywords, regex::escape(word)))
            })
            .transpose()
            .map_err(ProviderError::from)
    }

    fn location(
        &self,
        requested: &DocumentIdentity,
        target: &DocumentIdentity,
        range: Range,
    ) -> Option<ProviderLocation> {
        if target.uri() == requested.uri() {
            return Some(ProviderLocation::relative(requested.file_name(), range));
        }
        Url::parse(target.uri())
            .ok()
            .map(|url| ProviderLocation::absolute(url, range))
    }

    /// Runs `ranges` over every document in the corpus and collects locations
    fn locate<F>(
        &self,
        document: &DocumentIdentity,
        text: String,
        ranges: F,
    ) -> ProviderResult<ProviderLocation>
    where
        F: Fn(&str) -> Vec<Range>,
    {
        let mut locations = Vec::new();
        for (target, target_text) in self.corpus(document, text) {
            for range in ranges(&target_text) {
                locations.extend(self.location(document, &target, range));
            }
        }
        ProviderResult::from_vec(locations)
    }

    fn definitions(&self, document: &DocumentIdentity, position: Position) -> LocationResult {
        let Some(target) = self.target(document, position)? else {
            return Ok(ProviderResult::Empty);
        };
        let Some(regex) = self.definition_regex(&target.word)? else {
            return Ok(ProviderResult::Empty);
        };

        Ok(self.locate(document, target.text, |text| site_ranges(&regex, text)))
    }

    fn references(
        &self,
        document: &DocumentIdentity,
        position: Position,
        context: ReferenceContext,
    ) -> LocationResult {
        let Some(target) = self.target(document, position)? else {
            return Ok(ProviderResult::Empty);
        };
        let declarations = if context.include_declaration {
            None
        } else {
            self.definition_regex(&target.word)?
        };

        Ok(self.locate(document, target.text, |text| {
            let occurrences = self.occurrences(text, &target.word);
            match &declarations {
                Some(regex) => {
                    let declared = site_ranges(regex, text);
                    occurrences
                        .into_iter()
                        .filter(|range| !declared.contains(range))
                        .collect()
                }
                None => occurrences,
            }
        }))
    }

    fn implementations(&self, document: &DocumentIdentity, position: Position) -> LocationResult {
        let Some(target) = self.target(document, position)? else {
            return Ok(ProviderResult::Empty);
        };
        let Some(regex) = self.implementation_regex(&target.word)? else {
            return Ok(ProviderResult::Empty);
        };

        Ok(self.locate(document, target.text, |text| site_ranges(&regex, text)))
    }

    fn hover(
        &self,
        document: &DocumentIdentity,
        position: Position,
    ) -> Result<Option<Hover>, ProviderError> {
        let Some(target) = self.target(document, position)? else {
            return Ok(None);
        };
        let Some(regex) = self.definition_regex(&target.word)? else {
            return Ok(None);
        };

        let hover = self
            .corpus(document, target.text)
            .iter()
            .find_map(|(_, text)| keyword_sites(&regex, text).into_iter().next())
            .map(|site| {
                let contents = format!("```{}\n{}\n```", self.language_id, site.line.trim());
                Hover::new(contents).with_range(target.range)
            });

        Ok(hover)
    }

    fn highlights(
        &self,
        document: &DocumentIdentity,
        position: Position,
    ) -> Result<Option<Vec<DocumentHighlight>>, ProviderError> {
        let Some(target) = self.target(document, position)? else {
            return Ok(None);
        };
        let definitions = match self.definition_regex(&target.word)? {
            Some(regex) => site_ranges(&regex, &target.text),
            None => Vec::new(),
        };

        let highlights = self
            .occurrences(&target.text, &target.word)
            .into_iter()
            .map(|range| {
                let kind = if definitions.contains(&range) {
                    HighlightKind::Write
                } else {
                    HighlightKind::Read
                };
                DocumentHighlight {
                    range,
                    kind: Some(kind),
                }
            })
            .collect();

        Ok(Some(highlights))
    }
}

#[async_trait]
impl DefinitionProvider for SearchProviders {
    async fn provide_definition(
        &self,
        document: &DocumentIdentity,
        position: Position,
    ) -> LocationResult {
        let document = document.clone();
        self.run(move |searcher| searcher.definitions(&document, position))
            .await
    }
}

#[async_trait]
impl ReferencesProvider for SearchProviders {
    async fn provide_references(
        &self,
        document: &DocumentIdentity,
        position: Position,
        context: ReferenceContext,
    ) -> LocationResult {
        let document = document.clone();
        self.run(move |searcher| searcher.references(&document, position, context))
            .await
    }
}

#[async_trait]
impl ImplementationsProvider for SearchProviders {
    async fn provide_locations(
        &self,
        document: &DocumentIdentity,
        position: Position,
    ) -> LocationResult {
        let document = document.clone();
        self.run(move |searcher| searcher.implementations(&document, position))
            .await
    }
}

#[async_trait]
impl HoverProvider for SearchProviders {
    async fn provide_hover(
        &self,
        document: &DocumentIdentity,
        position: Position,
    ) -> Result<Option<Hover>, ProviderError> {
        let document = document.clone();
        self.run(move |searcher| searcher.hover(&document, position))
            .await
    }
}

#[async_trait]
impl DocumentHighlightProvider for SearchProviders {
    async fn provide_document_highlights(
        &self,
        document: &DocumentIdentity,
        position: Position,
    ) -> Result<Option<Vec<DocumentHighlight>>, ProviderError> {
        let document = document.clone();
        self.run(move |searcher| searcher.highlights(&document, position))
            .await
    }
}

fn alternation(keywords: &[String]) -> Option<String> {
    if keywords.is_empty() {
        return None;
    }
    Some(
        keywords
            .iter()
            .map(|keyword| regex::escape(keyword))
            .collect::<Vec<_>>()
            .join("|"),
    )
}

/// Every line match of `regex`, with the range of its first capture group
fn keyword_sites(regex: &Regex, text: &str) -> Vec<Site> {
    text.lines()
        .enumerate()
        .flat_map(|(index, line)| {
            regex
                .captures_iter(line)
                .filter_map(|captures| captures.get(1))
                .map(move |m| Site {
                    range: Range::on_line(
                        line_number(index),
                        utf16_column(line, m.start()),
                        utf16_column(line, m.end()),
                    ),
                    line: line.to_string(),
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

fn site_ranges(regex: &Regex, text: &str) -> Vec<Range> {
    keyword_sites(regex, text)
        .into_iter()
        .map(|site| site.range)
        .collect()
}

fn line_number(index: usize) -> u32 {
    u32::try_from(index).unwrap_or(u32::MAX)
}

fn utf16_column(line: &str, byte_offset: usize) -> u32 {
    u32::try_from(line[..byte_offset].encode_utf16().count()).unwrap_or(u32::MAX)
}
