use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use eyre::Result;
use regex::RegexBuilder;

use crate::book::Document;
use crate::error;
use crate::models::{DocPath, Span};
use crate::overlay::Annotation;
use crate::settings::SearchSettings;
use crate::view::View;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatchOptions {
    pub match_case: bool,
    pub match_diacritics: bool,
    pub match_whole_words: bool,
}

impl From<&SearchSettings> for MatchOptions {
    fn from(settings: &SearchSettings) -> Self {
        Self {
            match_case: settings.match_case,
            match_diacritics: settings.match_diacritics,
            match_whole_words: settings.match_whole_words,
        }
    }
}

/// Matched text with its surrounding context.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Excerpt {
    pub pre: String,
    pub matched: String,
    pub post: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextMatch {
    pub span: Span,
    pub excerpt: Excerpt,
}

/// Finds query matches in a section document.
pub trait Matcher {
    fn find(&self, doc: &dyn Document, query: &str, options: &MatchOptions) -> Result<Vec<TextMatch>>;
}

/// Literal matcher over the document's text nodes. Matches never cross
/// node boundaries.
#[derive(Debug, Clone)]
pub struct RegexMatcher {
    context_length: usize,
}

impl Default for RegexMatcher {
    fn default() -> Self {
        Self::new(50)
    }
}

impl RegexMatcher {
    pub fn new(context_length: usize) -> Self {
        Self { context_length }
    }

    fn excerpt(&self, chars: &[char], start: usize, end: usize) -> Excerpt {
        let pre_start = start.saturating_sub(self.context_length);
        let post_end = (end + self.context_length).min(chars.len());
        Excerpt {
            pre: chars[pre_start..start].iter().collect(),
            matched: chars[start..end].iter().collect(),
            post: chars[end..post_end].iter().collect(),
        }
    }
}

impl Matcher for RegexMatcher {
    fn find(&self, doc: &dyn Document, query: &str, options: &MatchOptions) -> Result<Vec<TextMatch>> {
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let fold = !options.match_diacritics;
        let needle = if fold {
            fold_diacritics(&query.chars().collect::<Vec<_>>()).0
        } else {
            query.to_string()
        };
        let mut pattern = regex::escape(&needle);
        if options.match_whole_words {
            pattern = format!(r"\b{}\b", pattern);
        }
        let regex = RegexBuilder::new(&pattern)
            .case_insensitive(!options.match_case)
            .build()?;

        let mut matches = Vec::new();
        for node in doc.text_nodes() {
            let chars: Vec<char> = node.text.chars().collect();
            // `origin[i]` is the position in `chars` of haystack char `i`
            let (haystack, origin) = if fold {
                fold_diacritics(&chars)
            } else {
                (node.text.clone(), (0..chars.len()).collect())
            };
            let (mut byte_pos, mut char_pos) = (0, 0);
            for found in regex.find_iter(&haystack) {
                char_pos += haystack[byte_pos..found.start()].chars().count();
                byte_pos = found.start();
                let start = char_pos;
                let end = start + found.as_str().chars().count();
                if end == start {
                    continue;
                }
                // marks dropped by folding stay with the char before them
                let start = origin[start];
                let end = origin.get(end).copied().unwrap_or(chars.len());
                matches.push(TextMatch {
                    span: Span::Range(DocPath::char_range(&node.path, start, end)),
                    excerpt: self.excerpt(&chars, start, end),
                });
            }
        }
        Ok(matches)
    }
}

/// Strip accents from common Latin letters and drop combining marks.
/// Returns the folded text and, per folded char, its source position.
fn fold_diacritics(chars: &[char]) -> (String, Vec<usize>) {
    let mut folded = String::with_capacity(chars.len());
    let mut origin = Vec::with_capacity(chars.len());
    for (i, &c) in chars.iter().enumerate() {
        let base = match c {
            '\u{300}'..='\u{36f}' => continue,
            'À'..='Å' => 'A',
            'à'..='å' => 'a',
            'Ç' => 'C',
            'ç' => 'c',
            'È'..='Ë' => 'E',
            'è'..='ë' => 'e',
            'Ì'..='Ï' => 'I',
            'ì'..='ï' => 'i',
            'Ñ' => 'N',
            'ñ' => 'n',
            'Ò'..='Ö' | 'Ø' => 'O',
            'ò'..='ö' | 'ø' => 'o',
            'Ù'..='Ü' => 'U',
            'ù'..='ü' => 'u',
            'Ý' => 'Y',
            'ý' | 'ÿ' => 'y',
            other => other,
        };
        folded.push(base);
        origin.push(i);
    }
    (folded, origin)
}

/// Shared flag that stops a running search at the next pull.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub query: String,
    /// Search a single section instead of the whole book
    pub index: Option<usize>,
    pub matching: MatchOptions,
    pub cancel: Option<CancelToken>,
}

impl SearchOptions {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn in_section(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub fn matching(mut self, matching: MatchOptions) -> Self {
        self.matching = matching;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub address: String,
    pub excerpt: Excerpt,
}

impl SearchHit {
    pub fn annotation(&self) -> Annotation {
        Annotation::SearchHit(self.address.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchEvent {
    /// A hit of a single-section search
    Hit(SearchHit),
    /// Share of the book searched so far
    Progress(f64),
    /// Hits of one section in a whole-book search
    Section { index: usize, subitems: Vec<SearchHit> },
    Done,
}

enum Mode {
    Section(usize),
    Book { next: usize },
}

pub struct SearchStream<'v> {
    view: &'v mut View,
    query: String,
    matching: MatchOptions,
    cancel: Option<CancelToken>,
    mode: Mode,
    queue: VecDeque<error::Result<SearchEvent>>,
    finished: bool,
}

impl<'v> SearchStream<'v> {
    fn new(view: &'v mut View, options: SearchOptions) -> Self {
        let mode = match options.index {
            Some(index) => Mode::Section(index),
            None => Mode::Book { next: 0 },
        };
        Self {
            view,
            query: options.query,
            matching: options.matching,
            cancel: options.cancel,
            mode,
            queue: VecDeque::new(),
            finished: false,
        }
    }

    fn cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    /// Run the matcher against `doc` and turn matches into addressed hits.
    fn hits_in(&self, index: usize, doc: &dyn Document) -> Vec<SearchHit> {
        match self.view.matcher.find(doc, &self.query, &self.matching) {
            Ok(found) => found
                .into_iter()
                .map(|found| SearchHit {
                    address: self.view.address_of(index, Some(&found.span)),
                    excerpt: found.excerpt,
                })
                .collect(),
            Err(err) => {
                log::warn!("Search failed in section {}: {}", index, err);
                Vec::new()
            }
        }
    }

    /// Hits of one section from a freshly built document. `None` when the
    /// section cannot build documents off-screen.
    fn search_fresh(&self, index: usize) -> Option<error::Result<Vec<SearchHit>>> {
        let created = self.view.book.section(index)?.create_document()?;
        Some(created.map(|doc| self.hits_in(index, doc.as_ref())))
    }

    fn register(&mut self, index: usize, hits: &[SearchHit]) {
        for hit in hits {
            let annotation = hit.annotation();
            self.view.overlays.record_search_hit(index, annotation.clone());
            self.view.add_annotation(&annotation);
        }
    }

    fn run_section(&mut self, index: usize) {
        let found = match self.search_fresh(index) {
            Some(found) => found,
            None => Ok(match self.view.live_document(index) {
                Some(doc) => self.hits_in(index, doc),
                None => {
                    log::warn!("section {} cannot be searched: no document", index);
                    Vec::new()
                }
            }),
        };
        match found {
            Ok(hits) => {
                self.register(index, &hits);
                self.queue
                    .extend(hits.into_iter().map(|hit| Ok(SearchEvent::Hit(hit))));
            }
            Err(err) => self.queue.push_back(Err(err)),
        }
        self.queue.push_back(Ok(SearchEvent::Done));
    }

    /// Advance to the next searchable section and queue its events.
    fn run_next_section(&mut self, mut next: usize) -> usize {
        let count = self.view.book.section_count();
        while next < count {
            let index = next;
            next += 1;
            let Some(found) = self.search_fresh(index) else {
                continue;
            };
            let hits = match found {
                Ok(hits) => hits,
                Err(err) => {
                    log::error!("Could not load section {} for search: {}", index, err);
                    self.queue.push_back(Err(err));
                    Vec::new()
                }
            };
            self.register(index, &hits);
            self.queue
                .push_back(Ok(SearchEvent::Progress((index + 1) as f64 / count as f64)));
            if !hits.is_empty() {
                self.queue.push_back(Ok(SearchEvent::Section {
                    index,
                    subitems: hits,
                }));
            }
            return next;
        }
        self.queue.push_back(Ok(SearchEvent::Done));
        next
    }
}

impl Iterator for SearchStream<'_> {
    type Item = error::Result<SearchEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.finished {
                return None;
            }
            if self.cancelled() {
                log::debug!("search for {:?} cancelled", self.query);
                self.finished = true;
                return None;
            }
            if let Some(event) = self.queue.pop_front() {
                if matches!(event, Ok(SearchEvent::Done)) {
                    self.finished = true;
                }
                return Some(event);
            }
            match self.mode {
                Mode::Section(index) => {
                    self.run_section(index);
                    self.mode = Mode::Book { next: usize::MAX };
                }
                Mode::Book { next } => {
                    let next = self.run_next_section(next);
                    self.mode = Mode::Book { next };
                }
            }
        }
    }
}

impl View {
    /// Start a search. Earlier search hits are cleared first; persistent
    /// annotations are untouched.
    pub fn search(&mut self, options: SearchOptions) -> SearchStream<'_> {
        self.clear_search();
        log::debug!(
            "searching {} for {:?}",
            options
                .index
                .map_or_else(|| "book".to_string(), |index| format!("section {}", index)),
            options.query
        );
        SearchStream::new(self, options)
    }

    /// Search options seeded from the configured matcher settings.
    pub fn search_options(&self, query: impl Into<String>) -> SearchOptions {
        SearchOptions::new(query).matching(MatchOptions::from(&self.settings.search))
    }

    /// Remove every search hit from the overlays and the result lists.
    pub fn clear_search(&mut self) {
        for (index, hit) in self.overlays.take_search_results() {
            self.overlays.erase(index, &hit);
        }
    }
}
