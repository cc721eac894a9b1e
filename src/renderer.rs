use eyre::Result;

use crate::book::Document;
use crate::models::{Rect, ResolvedTarget, Span};

/// Why the renderer moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelocateReason {
    Page,
    Scroll,
    Snap,
    Navigation,
    Selection,
    Unknown,
}

impl RelocateReason {
    pub fn parse(reason: &str) -> Self {
        match reason {
            "page" => RelocateReason::Page,
            "scroll" => RelocateReason::Scroll,
            "snap" => RelocateReason::Snap,
            "navigation" => RelocateReason::Navigation,
            "selection" => RelocateReason::Selection,
            _ => RelocateReason::Unknown,
        }
    }

    /// Passive movement that refines the current history entry.
    pub fn is_passive(self) -> bool {
        matches!(
            self,
            RelocateReason::Page | RelocateReason::Scroll | RelocateReason::Snap
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelocateEvent {
    pub reason: RelocateReason,
    pub range: Option<Span>,
    pub index: usize,
    /// Position inside the section
    pub fraction: f64,
    /// Visible share of the section
    pub size: f64,
}

/// Live layout geometry of a span.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpanGeometry {
    /// One rectangle per line or column fragment
    pub rects: Vec<Rect>,
    pub viewport: Option<Rect>,
    /// Bounding rectangle of the surrounding frame, same coordinate space
    pub frame: Option<Rect>,
    pub vertical: bool,
}

pub trait Renderer {
    fn go_to(&mut self, target: &ResolvedTarget) -> Result<()>;

    fn next(&mut self) -> Result<()>;

    fn prev(&mut self, distance: Option<f64>) -> Result<()>;

    /// Indices of the sections currently rendered.
    fn loaded_indices(&self) -> Vec<usize>;

    fn document(&self, index: usize) -> Option<&dyn Document>;

    /// True on the last page of the book.
    fn at_end(&self) -> bool;

    /// Continuous-scroll mode, no page boundaries.
    fn is_scrolled(&self) -> bool;

    fn span_geometry(&self, index: usize, span: &Span) -> Option<SpanGeometry>;

    fn set_class(&mut self, index: usize, span: &Span, class: &str, on: bool) -> Result<()>;

    fn clear_selection(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relocate_reason() {
        assert_eq!(RelocateReason::parse("page"), RelocateReason::Page);
        assert_eq!(RelocateReason::parse("bogus"), RelocateReason::Unknown);
        assert!(RelocateReason::Snap.is_passive());
        assert!(RelocateReason::Scroll.is_passive());
        assert!(!RelocateReason::Navigation.is_passive());
        assert!(!RelocateReason::Selection.is_passive());
    }
}
