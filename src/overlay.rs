use std::collections::{BTreeMap, HashMap};

use crate::models::Span;

/// Reserved prefix marking search hits in the external value form.
pub const SEARCH_PREFIX: &str = "foliate-search:";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Annotation {
    Persistent(String),
    SearchHit(String),
}

impl Annotation {
    pub fn from_value(value: &str) -> Self {
        match value.strip_prefix(SEARCH_PREFIX) {
            Some(address) => Annotation::SearchHit(address.to_string()),
            None => Annotation::Persistent(value.to_string()),
        }
    }

    /// External value, prefixed for search hits.
    pub fn value(&self) -> String {
        match self {
            Annotation::Persistent(value) => value.clone(),
            Annotation::SearchHit(address) => format!("{}{}", SEARCH_PREFIX, address),
        }
    }

    /// Address the annotation points at.
    pub fn address(&self) -> &str {
        match self {
            Annotation::Persistent(value) => value,
            Annotation::SearchHit(address) => address,
        }
    }

    pub fn is_search_hit(&self) -> bool {
        matches!(self, Annotation::SearchHit(_))
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DrawStyle {
    #[default]
    Highlight,
    Underline,
    StrikeThrough,
    Squiggly,
    /// Fixed style for search hits
    Outline,
    Colored {
        kind: Box<DrawStyle>,
        color: String,
    },
}

/// Drawing surface of one rendered section.
pub trait Overlay {
    fn add(&mut self, value: &str, span: &Span, style: &DrawStyle);

    fn remove(&mut self, value: &str);

    /// Value and span drawn at a point, topmost first.
    fn hit_test(&self, x: f64, y: f64) -> Option<(String, Span)>;
}

#[derive(Default)]
struct OverlaySlot {
    overlay: Option<Box<dyn Overlay>>,
    drawn: Vec<Annotation>,
}

#[derive(Default)]
pub struct OverlayRegistry {
    slots: HashMap<usize, OverlaySlot>,
    search_results: BTreeMap<usize, Vec<Annotation>>,
}

impl OverlayRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a fresh overlay for `index`. Returns the search hits to replay.
    pub fn attach(&mut self, index: usize, overlay: Box<dyn Overlay>) -> Vec<Annotation> {
        let slot = self.slots.entry(index).or_default();
        slot.overlay = Some(overlay);
        slot.drawn.clear();
        self.search_results.get(&index).cloned().unwrap_or_default()
    }

    pub fn detach(&mut self, index: usize) {
        if let Some(slot) = self.slots.get_mut(&index) {
            slot.overlay = None;
            slot.drawn.clear();
        }
    }

    pub fn is_live(&self, index: usize) -> bool {
        self.slots
            .get(&index)
            .is_some_and(|slot| slot.overlay.is_some())
    }

    /// Draw `annotation`, replacing any earlier drawing of the same value.
    pub fn draw(&mut self, index: usize, annotation: &Annotation, span: &Span, style: &DrawStyle) {
        let Some(slot) = self.slots.get_mut(&index) else {
            return;
        };
        let Some(overlay) = slot.overlay.as_mut() else {
            return;
        };
        let value = annotation.value();
        overlay.remove(&value);
        overlay.add(&value, span, style);
        slot.drawn.retain(|drawn| drawn != annotation);
        slot.drawn.push(annotation.clone());
    }

    pub fn erase(&mut self, index: usize, annotation: &Annotation) {
        let Some(slot) = self.slots.get_mut(&index) else {
            return;
        };
        if let Some(overlay) = slot.overlay.as_mut() {
            overlay.remove(&annotation.value());
        }
        slot.drawn.retain(|drawn| drawn != annotation);
    }

    pub fn drawn(&self, index: usize) -> &[Annotation] {
        self.slots
            .get(&index)
            .map(|slot| slot.drawn.as_slice())
            .unwrap_or(&[])
    }

    pub fn hit_test(&self, index: usize, x: f64, y: f64) -> Option<(Annotation, Span)> {
        let overlay = self.slots.get(&index)?.overlay.as_ref()?;
        let (value, span) = overlay.hit_test(x, y)?;
        Some((Annotation::from_value(&value), span))
    }

    pub fn record_search_hit(&mut self, index: usize, annotation: Annotation) {
        let list = self.search_results.entry(index).or_default();
        if !list.contains(&annotation) {
            list.push(annotation);
        }
    }

    pub fn search_results(&self, index: usize) -> &[Annotation] {
        self.search_results
            .get(&index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn has_search_results(&self) -> bool {
        self.search_results.values().any(|list| !list.is_empty())
    }

    /// Remove and return every recorded search hit, in section order.
    pub fn take_search_results(&mut self) -> Vec<(usize, Annotation)> {
        std::mem::take(&mut self.search_results)
            .into_iter()
            .flat_map(|(index, list)| list.into_iter().map(move |hit| (index, hit)))
            .collect()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.search_results.clear();
    }
}
