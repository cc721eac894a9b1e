use std::cell::RefCell;
use std::rc::Rc;

use crate::models::Span;
use crate::overlay::{Annotation, DrawStyle};
use crate::progress::{Progress, TocItem};

/// Consolidated location after every renderer move.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub index: usize,
    pub progress: Progress,
    pub toc_item: Option<TocItem>,
    pub page_item: Option<TocItem>,
    pub address: String,
    pub range: Option<Span>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    Relocate(Location),
    Load { index: usize },
    /// Cancelable: returning false suppresses navigation
    Link { index: usize, href: String },
    /// Cancelable: returning false means the shell did not open it
    ExternalLink { index: usize, href: String },
    ShowAnnotation { value: String, index: usize, span: Span },
    CreateOverlay { index: usize },
    HistoryChanged { can_go_back: bool, can_go_forward: bool },
}

pub trait EventSink {
    /// Deliver an event. The return value is the default-action verdict of
    /// cancelable events and ignored otherwise.
    fn emit(&mut self, event: &ViewEvent) -> bool;

    /// Style for a persistent annotation about to be drawn; `None` skips it.
    fn draw_annotation(
        &mut self,
        _annotation: &Annotation,
        _index: usize,
        _span: &Span,
    ) -> Option<DrawStyle> {
        Some(DrawStyle::default())
    }
}

/// Shared event recorder, usable as a sink while the shell keeps a handle.
#[derive(Debug, Clone)]
pub struct EventLog {
    events: Rc<RefCell<Vec<ViewEvent>>>,
    allow: Rc<RefCell<bool>>,
}

impl Default for EventLog {
    fn default() -> Self {
        Self {
            events: Rc::new(RefCell::new(Vec::new())),
            allow: Rc::new(RefCell::new(true)),
        }
    }
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Verdict returned for cancelable events.
    pub fn set_allow(&self, allow: bool) {
        *self.allow.borrow_mut() = allow;
    }

    pub fn events(&self) -> Vec<ViewEvent> {
        self.events.borrow().clone()
    }

    pub fn take(&self) -> Vec<ViewEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }
}

impl EventSink for EventLog {
    fn emit(&mut self, event: &ViewEvent) -> bool {
        self.events.borrow_mut().push(event.clone());
        *self.allow.borrow()
    }
}
