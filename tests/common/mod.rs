#![allow(dead_code)]

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::rc::Rc;

use eyre::{Result, eyre};

use folio::book::{Book, Document, Section, TextNode, TocFragments};
use folio::error;
use folio::events::EventLog;
use folio::models::{
    Anchor, DocPath, Landmark, NavItem, ReadingDirection, ResolvedTarget, Span,
};
use folio::overlay::{DrawStyle, Overlay};
use folio::renderer::{Renderer, SpanGeometry};
use folio::settings::Settings;
use folio::view::View;

pub type Shared<T> = Rc<RefCell<T>>;

#[derive(Debug, Clone, Default)]
pub struct FakeDocument {
    texts: Vec<String>,
    ids: Vec<String>,
}

impl FakeDocument {
    pub fn new(texts: &[&str]) -> Self {
        Self {
            texts: texts.iter().map(|t| t.to_string()).collect(),
            ids: Vec::new(),
        }
    }

    pub fn with_ids(mut self, ids: &[&str]) -> Self {
        self.ids = ids.iter().map(|id| id.to_string()).collect();
        self
    }
}

/// Numeric steps of a path like `/4/6/1,:2,:5`.
fn steps(span: &Span) -> Vec<u64> {
    match span {
        Span::Range(path) => path
            .as_str()
            .split(|c: char| !c.is_ascii_digit())
            .filter(|s| !s.is_empty())
            .filter_map(|s| s.parse().ok())
            .collect(),
        _ => Vec::new(),
    }
}

impl Document for FakeDocument {
    fn resolve_path(&self, path: &DocPath) -> Option<Span> {
        Some(Span::Range(path.clone()))
    }

    fn fragment_span(&self, id: &str) -> Option<Span> {
        let position = self.ids.iter().position(|known| known == id)?;
        Some(Span::Range(DocPath::new(format!("/4/{}", (position + 1) * 2))))
    }

    fn text_nodes(&self) -> Vec<TextNode> {
        self.texts
            .iter()
            .enumerate()
            .map(|(i, text)| TextNode {
                path: DocPath::new(format!("/4/{}/1", (i + 1) * 2)),
                text: text.clone(),
            })
            .collect()
    }

    fn compare(&self, a: &Span, b: &Span) -> Option<Ordering> {
        Some(steps(a).cmp(&steps(b)))
    }
}

#[derive(Debug, Clone)]
pub struct FakeSection {
    pub id: String,
    pub size: u64,
    pub linear: bool,
    pub doc: FakeDocument,
    pub can_create: bool,
    pub load_error: bool,
}

impl FakeSection {
    pub fn new(id: &str, size: u64, doc: FakeDocument) -> Self {
        Self {
            id: id.to_string(),
            size,
            linear: true,
            doc,
            can_create: true,
            load_error: false,
        }
    }

    pub fn non_linear(mut self) -> Self {
        self.linear = false;
        self
    }

    pub fn without_documents(mut self) -> Self {
        self.can_create = false;
        self
    }

    pub fn failing(mut self) -> Self {
        self.load_error = true;
        self
    }
}

impl Section for FakeSection {
    fn id(&self) -> &str {
        &self.id
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn linear(&self) -> bool {
        self.linear
    }

    fn resolve_href(&self, href: &str) -> Option<String> {
        match href.strip_prefix('#') {
            Some(fragment) => Some(format!("{}#{}", self.id, fragment)),
            None => None,
        }
    }

    fn create_document(&self) -> Option<error::Result<Box<dyn Document>>> {
        if !self.can_create {
            return None;
        }
        if self.load_error {
            return Some(Err(error::Error::NotFound(self.id.clone())));
        }
        Some(Ok(Box::new(self.doc.clone())))
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeBook {
    pub sections: Vec<FakeSection>,
    pub toc: Vec<NavItem>,
    pub page_list: Vec<NavItem>,
    pub landmarks: Vec<Landmark>,
    pub dir: ReadingDirection,
}

fn split(href: &str) -> (String, Option<String>) {
    match href.split_once('#') {
        Some((path, fragment)) => (path.to_string(), Some(fragment.to_string())),
        None => (href.to_string(), None),
    }
}

impl TocFragments for FakeBook {
    fn split_href(&self, href: &str) -> Option<(String, Option<String>)> {
        Some(split(href))
    }

    fn fragment(&self, doc: &dyn Document, fragment: &str) -> Option<Span> {
        doc.fragment_span(fragment)
    }
}

impl Book for FakeBook {
    fn section_count(&self) -> usize {
        self.sections.len()
    }

    fn section(&self, index: usize) -> Option<&dyn Section> {
        self.sections.get(index).map(|s| s as &dyn Section)
    }

    fn resolve_href(&self, href: &str) -> Result<ResolvedTarget> {
        let (path, fragment) = split(href);
        let index = self
            .sections
            .iter()
            .position(|section| section.id == path)
            .ok_or_else(|| eyre!("no section named {}", path))?;
        Ok(ResolvedTarget {
            index,
            anchor: fragment.map(Anchor::Fragment),
            select: false,
        })
    }

    fn toc_fragments(&self) -> Option<&dyn TocFragments> {
        Some(self as &dyn TocFragments)
    }

    fn toc(&self) -> &[NavItem] {
        &self.toc
    }

    fn page_list(&self) -> &[NavItem] {
        &self.page_list
    }

    fn landmarks(&self) -> &[Landmark] {
        &self.landmarks
    }

    fn dir(&self) -> ReadingDirection {
        self.dir
    }
}

pub fn nav(label: &str, href: &str, subitems: Vec<NavItem>) -> NavItem {
    NavItem {
        label: label.to_string(),
        href: href.to_string(),
        subitems,
    }
}

/// Cover, three chapters, a TOC with a nested part and a bodymatter landmark.
pub fn sample_book() -> FakeBook {
    FakeBook {
        sections: vec![
            FakeSection::new("cover.xhtml", 500, FakeDocument::new(&["Cover"])).non_linear(),
            FakeSection::new(
                "ch1.xhtml",
                1000,
                FakeDocument::new(&[
                    "Call me Ishmael. Some years ago, never mind how long precisely.",
                    "The whale surfaced near the ship.",
                ])
                .with_ids(&["intro", "part2"]),
            ),
            FakeSection::new(
                "ch2.xhtml",
                2000,
                FakeDocument::new(&["No mention of it here.", "A white whale, then another whale."]),
            ),
            FakeSection::new("ch3.xhtml", 1000, FakeDocument::new(&["Epilogue."])),
        ],
        toc: vec![
            nav("Chapter 1", "ch1.xhtml", vec![nav("Part two", "ch1.xhtml#part2", vec![])]),
            nav("Chapter 2", "ch2.xhtml", vec![]),
            nav("Chapter 3", "ch3.xhtml", vec![]),
        ],
        page_list: vec![nav("1", "ch1.xhtml", vec![]), nav("2", "ch2.xhtml", vec![])],
        landmarks: vec![Landmark {
            kinds: vec!["bodymatter".to_string()],
            label: "Start".to_string(),
            href: "ch1.xhtml".to_string(),
        }],
        dir: ReadingDirection::Ltr,
    }
}

/// Everything the fake renderer observed or was told to do.
#[derive(Debug, Default)]
pub struct RendererProbe {
    pub gone_to: Vec<ResolvedTarget>,
    pub loaded: Vec<usize>,
    pub next_calls: usize,
    pub prev_calls: usize,
    pub fail_go_to: bool,
    pub fail_set_class: bool,
    pub at_end: bool,
    pub scrolled: bool,
    pub geometry: Option<SpanGeometry>,
    pub classes: Vec<(usize, Span, String, bool)>,
    pub selection_cleared: bool,
}

pub struct FakeRenderer {
    docs: HashMap<usize, FakeDocument>,
    probe: Shared<RendererProbe>,
}

impl FakeRenderer {
    pub fn for_book(book: &FakeBook) -> (Self, Shared<RendererProbe>) {
        let probe: Shared<RendererProbe> = Rc::new(RefCell::new(RendererProbe::default()));
        let docs = book
            .sections
            .iter()
            .enumerate()
            .map(|(i, section)| (i, section.doc.clone()))
            .collect();
        (
            Self {
                docs,
                probe: probe.clone(),
            },
            probe,
        )
    }
}

impl Renderer for FakeRenderer {
    fn go_to(&mut self, target: &ResolvedTarget) -> Result<()> {
        let mut probe = self.probe.borrow_mut();
        if probe.fail_go_to {
            return Err(eyre!("navigation rejected"));
        }
        probe.gone_to.push(target.clone());
        probe.loaded = vec![target.index];
        Ok(())
    }

    fn next(&mut self) -> Result<()> {
        self.probe.borrow_mut().next_calls += 1;
        Ok(())
    }

    fn prev(&mut self, _distance: Option<f64>) -> Result<()> {
        self.probe.borrow_mut().prev_calls += 1;
        Ok(())
    }

    fn loaded_indices(&self) -> Vec<usize> {
        self.probe.borrow().loaded.clone()
    }

    fn document(&self, index: usize) -> Option<&dyn Document> {
        self.docs.get(&index).map(|doc| doc as &dyn Document)
    }

    fn at_end(&self) -> bool {
        self.probe.borrow().at_end
    }

    fn is_scrolled(&self) -> bool {
        self.probe.borrow().scrolled
    }

    fn span_geometry(&self, _index: usize, _span: &Span) -> Option<SpanGeometry> {
        self.probe.borrow().geometry.clone()
    }

    fn set_class(&mut self, index: usize, span: &Span, class: &str, on: bool) -> Result<()> {
        let mut probe = self.probe.borrow_mut();
        if probe.fail_set_class {
            return Err(eyre!("element is gone"));
        }
        probe.classes.push((index, span.clone(), class.to_string(), on));
        Ok(())
    }

    fn clear_selection(&mut self) {
        self.probe.borrow_mut().selection_cleared = true;
    }
}

pub type Drawn = Shared<Vec<(String, Span, DrawStyle)>>;

pub struct FakeOverlay {
    drawn: Drawn,
}

impl FakeOverlay {
    pub fn new() -> (Box<dyn Overlay>, Drawn) {
        let drawn: Drawn = Rc::new(RefCell::new(Vec::new()));
        (
            Box::new(Self {
                drawn: drawn.clone(),
            }),
            drawn,
        )
    }
}

impl Overlay for FakeOverlay {
    fn add(&mut self, value: &str, span: &Span, style: &DrawStyle) {
        self.drawn
            .borrow_mut()
            .push((value.to_string(), span.clone(), style.clone()));
    }

    fn remove(&mut self, value: &str) {
        self.drawn.borrow_mut().retain(|(v, _, _)| v != value);
    }

    fn hit_test(&self, _x: f64, _y: f64) -> Option<(String, Span)> {
        self.drawn
            .borrow()
            .last()
            .map(|(value, span, _)| (value.clone(), span.clone()))
    }
}

pub struct Harness {
    pub view: View,
    pub probe: Shared<RendererProbe>,
    pub events: EventLog,
}

pub fn open(book: FakeBook) -> Harness {
    open_with(book, Settings::default())
}

pub fn open_with(book: FakeBook, settings: Settings) -> Harness {
    let (renderer, probe) = FakeRenderer::for_book(&book);
    let events = EventLog::new();
    let view = View::open(
        Box::new(book),
        Box::new(renderer),
        Box::new(events.clone()),
        settings,
    );
    Harness {
        view,
        probe,
        events,
    }
}

impl Harness {
    /// Render section `index` and give it a fresh overlay.
    pub fn show_section(&mut self, index: usize) -> Drawn {
        self.probe.borrow_mut().loaded = vec![index];
        let (overlay, drawn) = FakeOverlay::new();
        self.view.on_create_overlay(index, overlay);
        drawn
    }

    pub fn drawn_values(drawn: &Drawn) -> Vec<String> {
        drawn.borrow().iter().map(|(v, _, _)| v.clone()).collect()
    }
}
