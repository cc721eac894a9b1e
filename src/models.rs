use chrono::{DateTime, Utc};
use std::fmt;

use crate::address;
use crate::book::Document;

/// Any of the four ways a location in a book can be named.
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationTarget {
    Index(usize),
    Fraction(f64),
    Address(String),
    Href(String),
}

impl NavigationTarget {
    /// Classify a raw string as an address or an href.
    pub fn parse(raw: &str) -> Self {
        if address::is_address(raw) {
            NavigationTarget::Address(raw.to_string())
        } else {
            NavigationTarget::Href(raw.to_string())
        }
    }
}

impl From<usize> for NavigationTarget {
    fn from(index: usize) -> Self {
        NavigationTarget::Index(index)
    }
}

impl From<&str> for NavigationTarget {
    fn from(raw: &str) -> Self {
        NavigationTarget::parse(raw)
    }
}

impl fmt::Display for NavigationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavigationTarget::Index(index) => write!(f, "section {}", index),
            NavigationTarget::Fraction(fraction) => write!(f, "fraction {}", fraction),
            NavigationTarget::Address(address) => f.write_str(address),
            NavigationTarget::Href(href) => f.write_str(href),
        }
    }
}

/// Path inside a single section document. Opaque to this crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocPath(pub String);

impl DocPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Character range `start..end` inside the text node at `node`.
    pub fn char_range(node: &DocPath, start: usize, end: usize) -> Self {
        Self(format!("{},:{},:{}", node.0, start, end))
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A point or range within a rendered section.
#[derive(Debug, Clone, PartialEq)]
pub enum Span {
    Range(DocPath),
    /// Offset inside the section expressed as a fraction of its length
    Fraction(f64),
    /// Pre-resolved target that is not part of a document (e.g. a fixed-layout page)
    Object(String),
}

impl Span {
    pub fn path(&self) -> Option<&DocPath> {
        match self {
            Span::Range(path) => Some(path),
            _ => None,
        }
    }
}

/// Something that can produce a [`Span`] once the live document is known.
pub trait SpanResolver {
    fn resolve(&self, doc: &dyn Document) -> Option<Span>;
}

/// Deferred anchor of a resolved target, addressable before its document exists.
#[derive(Debug, Clone, PartialEq)]
pub enum Anchor {
    Path(DocPath),
    Fragment(String),
    Fraction(f64),
    Resolved(Span),
}

impl SpanResolver for Anchor {
    fn resolve(&self, doc: &dyn Document) -> Option<Span> {
        match self {
            Anchor::Path(path) => doc.resolve_path(path),
            Anchor::Fragment(id) => doc.fragment_span(id),
            Anchor::Fraction(fraction) => Some(Span::Fraction(*fraction)),
            Anchor::Resolved(span) => Some(span.clone()),
        }
    }
}

/// In-session pointer the renderer can jump to directly.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTarget {
    pub index: usize,
    pub anchor: Option<Anchor>,
    pub select: bool,
}

impl ResolvedTarget {
    pub fn index(index: usize) -> Self {
        Self {
            index,
            anchor: None,
            select: false,
        }
    }

    pub fn with_anchor(index: usize, anchor: Anchor) -> Self {
        Self {
            index,
            anchor: Some(anchor),
            select: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HistoryEntry {
    Target(NavigationTarget),
    Index(usize),
    Fraction(f64),
}

impl From<NavigationTarget> for HistoryEntry {
    fn from(target: NavigationTarget) -> Self {
        match target {
            NavigationTarget::Index(index) => HistoryEntry::Index(index),
            NavigationTarget::Fraction(fraction) => HistoryEntry::Fraction(fraction),
            other => HistoryEntry::Target(other),
        }
    }
}

impl HistoryEntry {
    pub fn target(&self) -> NavigationTarget {
        match self {
            HistoryEntry::Target(target) => target.clone(),
            HistoryEntry::Index(index) => NavigationTarget::Index(*index),
            HistoryEntry::Fraction(fraction) => NavigationTarget::Fraction(*fraction),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadingDirection {
    #[default]
    Ltr,
    Rtl,
}

/// Axis-aligned rectangle in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    pub fn area(&self) -> f64 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    pub fn is_degenerate(&self) -> bool {
        !(self.width() > 0.0 && self.height() > 0.0)
    }

    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let rect = Rect {
            left: self.left.max(other.left),
            top: self.top.max(other.top),
            right: self.right.min(other.right),
            bottom: self.bottom.min(other.bottom),
        };
        if rect.is_degenerate() { None } else { Some(rect) }
    }
}

/// One narrated span of a media overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaOverlayItem {
    pub begin: f64,
    pub end: f64,
    pub text: NavigationTarget,
}

impl MediaOverlayItem {
    pub fn duration(&self) -> f64 {
        self.end - self.begin
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitInfo {
    pub visible_ratio: f64,
    pub off_screen_ratio: f64,
}

/// Table of contents or page list node as published by the book.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NavItem {
    pub label: String,
    pub href: String,
    pub subitems: Vec<NavItem>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Landmark {
    pub kinds: Vec<String>,
    pub label: String,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BookMetadata {
    pub title: Option<String>,
    pub creator: Option<String>,
    pub language: Option<String>,
    pub identifier: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LibraryItem {
    pub last_read: DateTime<Utc>,
    pub filepath: String,
    pub title: Option<String>,
    pub author: Option<String>,
    pub reading_progress: Option<f64>,
}
