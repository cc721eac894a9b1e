use crate::address::{AddressCodec, SyntheticCodec};
use crate::book::{Book, Document};
use crate::error;
use crate::events::{EventSink, Location, ViewEvent};
use crate::history::History;
use crate::models::{
    Anchor, HistoryEntry, NavigationTarget, ReadingDirection, ResolvedTarget, Span, SpanResolver,
};
use crate::narration::Narration;
use crate::overlay::{Annotation, DrawStyle, Overlay, OverlayRegistry};
use crate::progress::{ProgressTracker, TocItem};
use crate::renderer::{RelocateEvent, Renderer};
use crate::resolver::Resolver;
use crate::search::{Matcher, RegexMatcher};
use crate::settings::Settings;

/// Where an annotation lives, returned even when it could not be drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationPlacement {
    pub index: usize,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProgressOf {
    pub toc_item: Option<TocItem>,
    pub page_item: Option<TocItem>,
}

pub struct View {
    pub(crate) book: Box<dyn Book>,
    pub(crate) renderer: Box<dyn Renderer>,
    pub(crate) sink: Box<dyn EventSink>,
    pub(crate) settings: Settings,
    pub(crate) codec: Box<dyn AddressCodec>,
    pub(crate) progress: ProgressTracker,
    pub(crate) history: History,
    pub(crate) overlays: OverlayRegistry,
    pub(crate) matcher: Box<dyn Matcher>,
    pub(crate) narration: Narration,
    last_location: Option<Location>,
}

impl View {
    pub fn open(
        book: Box<dyn Book>,
        renderer: Box<dyn Renderer>,
        sink: Box<dyn EventSink>,
        settings: Settings,
    ) -> Self {
        let progress = ProgressTracker::new(book.as_ref(), &settings.progress);
        log::debug!(
            "opened book with {} sections (toc progress: {}, page list: {})",
            book.section_count(),
            progress.has_toc(),
            progress.has_page_list()
        );
        Self {
            history: History::new(settings.history_limit),
            matcher: Box::new(RegexMatcher::new(settings.search.context_length)),
            narration: Narration::new(settings.narration.auto_navigate),
            codec: Box::new(SyntheticCodec),
            overlays: OverlayRegistry::new(),
            last_location: None,
            progress,
            book,
            renderer,
            sink,
            settings,
        }
    }

    pub fn with_codec(mut self, codec: Box<dyn AddressCodec>) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_matcher(mut self, matcher: Box<dyn Matcher>) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn book(&self) -> &dyn Book {
        self.book.as_ref()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn overlays(&self) -> &OverlayRegistry {
        &self.overlays
    }

    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    pub fn last_location(&self) -> Option<&Location> {
        self.last_location.as_ref()
    }

    pub(crate) fn resolver(&self) -> Resolver<'_> {
        Resolver::new(
            self.book.as_ref(),
            self.progress.section(),
            self.codec.as_ref(),
        )
    }

    pub fn resolve(&self, target: &NavigationTarget) -> Option<ResolvedTarget> {
        self.resolver().resolve(target)
    }

    pub fn address_of(&self, index: usize, span: Option<&Span>) -> String {
        self.resolver().address_of(index, span)
    }

    /// Open at the saved location, the start of the text, or the first page.
    pub fn init(&mut self, last_location: Option<NavigationTarget>, show_text_start: bool) {
        if let Some(target) = last_location {
            if let Some(resolved) = self.resolve(&target) {
                if self.navigate(&resolved, target.clone()) {
                    return;
                }
            }
        }
        if show_text_start {
            self.go_to_text_start();
        } else {
            self.push_history(HistoryEntry::Index(0));
            self.next();
        }
    }

    pub fn go_to_text_start(&mut self) -> Option<ResolvedTarget> {
        let landmark = self
            .book
            .landmarks()
            .iter()
            .find(|landmark| {
                landmark
                    .kinds
                    .iter()
                    .any(|kind| kind == "bodymatter" || kind == "text")
            })
            .map(|landmark| landmark.href.clone());
        if let Some(href) = landmark {
            return self.go_to(NavigationTarget::parse(&href));
        }
        let first_linear = (0..self.book.section_count()).find(|&index| {
            self.book
                .section(index)
                .is_some_and(|section| section.linear())
        });
        match first_linear {
            Some(index) => self.go_to(NavigationTarget::Index(index)),
            None => {
                log::warn!("book has no linear section to start from");
                None
            }
        }
    }

    pub fn go_to(&mut self, target: NavigationTarget) -> Option<ResolvedTarget> {
        let resolved = self.resolve(&target)?;
        self.navigate(&resolved, target).then_some(resolved)
    }

    pub fn go_to_fraction(&mut self, fraction: f64) -> Option<ResolvedTarget> {
        self.go_to(NavigationTarget::Fraction(fraction))
    }

    /// Jump to an offset inside one section; history records the matching
    /// global fraction.
    pub fn go_to_fraction_in_section(&mut self, index: usize, fraction: f64) -> Option<ResolvedTarget> {
        if index >= self.book.section_count() {
            log::warn!("Could not go to section {}: out of range", index);
            return None;
        }
        let fraction = fraction.clamp(0.0, 1.0);
        let resolved = ResolvedTarget::with_anchor(index, Anchor::Fraction(fraction));
        let fractions = self.progress.section().section_fractions();
        let start = fractions.get(index).copied().unwrap_or(0.0);
        let end = fractions.get(index + 1).copied().unwrap_or(start);
        let global = start + (end - start) * fraction;
        self.navigate(&resolved, NavigationTarget::Fraction(global))
            .then_some(resolved)
    }

    /// Navigate and select the target.
    pub fn select(&mut self, target: NavigationTarget) -> Option<ResolvedTarget> {
        let mut resolved = self.resolve(&target)?;
        resolved.select = true;
        self.navigate(&resolved, target).then_some(resolved)
    }

    pub fn deselect(&mut self) {
        self.renderer.clear_selection();
    }

    /// Drive the renderer, then record the target. History only changes
    /// after a successful move.
    fn navigate(&mut self, resolved: &ResolvedTarget, target: NavigationTarget) -> bool {
        if let Err(err) = self.renderer.go_to(resolved) {
            log::error!("Could not go to {}: {}", target, err);
            return false;
        }
        self.push_history(HistoryEntry::from(target));
        true
    }

    fn push_history(&mut self, entry: HistoryEntry) {
        if self.history.push_state(entry) {
            self.emit_history_change();
        }
    }

    fn emit_history_change(&mut self) {
        let event = ViewEvent::HistoryChanged {
            can_go_back: self.history.can_go_back(),
            can_go_forward: self.history.can_go_forward(),
        };
        self.sink.emit(&event);
    }

    pub fn back(&mut self) -> Option<ResolvedTarget> {
        let entry = self.history.back()?;
        self.emit_history_change();
        self.restore(entry)
    }

    pub fn forward(&mut self) -> Option<ResolvedTarget> {
        let entry = self.history.forward()?;
        self.emit_history_change();
        self.restore(entry)
    }

    fn restore(&mut self, entry: HistoryEntry) -> Option<ResolvedTarget> {
        let target = entry.target();
        let resolved = self.resolve(&target)?;
        if let Err(err) = self.renderer.go_to(&resolved) {
            log::error!("Could not go to {}: {}", target, err);
            return None;
        }
        Some(resolved)
    }

    pub fn next(&mut self) -> bool {
        match self.renderer.next() {
            Ok(()) => true,
            Err(err) => {
                log::warn!("Could not turn to next page: {}", err);
                false
            }
        }
    }

    pub fn prev(&mut self) -> bool {
        match self.renderer.prev(None) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("Could not turn to previous page: {}", err);
                false
            }
        }
    }

    pub fn go_left(&mut self) -> bool {
        match self.book.dir() {
            ReadingDirection::Rtl => self.next(),
            ReadingDirection::Ltr => self.prev(),
        }
    }

    pub fn go_right(&mut self) -> bool {
        match self.book.dir() {
            ReadingDirection::Rtl => self.prev(),
            ReadingDirection::Ltr => self.next(),
        }
    }

    pub fn section_fractions(&self) -> &[f64] {
        self.progress.section().section_fractions()
    }

    pub fn progress_of(&self, index: usize, range: Option<&Span>) -> ProgressOf {
        let doc = self.live_document(index);
        let pair = match (doc, range) {
            (Some(doc), Some(span)) => Some((doc, span)),
            _ => None,
        };
        ProgressOf {
            toc_item: self.progress.toc_item(self.book.as_ref(), index, pair),
            page_item: self.progress.page_item(self.book.as_ref(), index, pair),
        }
    }

    /// TOC item containing `target`, loading the section off-screen.
    pub fn toc_item_of(&self, target: &NavigationTarget) -> error::Result<Option<TocItem>> {
        let Some(resolved) = self.resolve(target) else {
            return Ok(None);
        };
        let Some(section) = self.book.section(resolved.index) else {
            return Ok(None);
        };
        let Some(created) = section.create_document() else {
            return Ok(self.progress.toc_item(self.book.as_ref(), resolved.index, None));
        };
        let doc = created?;
        let span = resolved
            .anchor
            .as_ref()
            .and_then(|anchor| anchor.resolve(doc.as_ref()));
        let pair = span.as_ref().map(|span| (doc.as_ref(), span));
        Ok(self.progress.toc_item(self.book.as_ref(), resolved.index, pair))
    }

    /// The rendered document of section `index`, if it is on screen.
    pub(crate) fn live_document(&self, index: usize) -> Option<&dyn Document> {
        if !self.renderer.loaded_indices().contains(&index) {
            return None;
        }
        self.renderer.document(index)
    }

    pub(crate) fn live_span(&self, resolved: &ResolvedTarget) -> Option<Span> {
        let anchor = resolved.anchor.as_ref()?;
        match self.live_document(resolved.index) {
            Some(doc) => anchor.resolve(doc),
            None => match anchor {
                Anchor::Resolved(span) => Some(span.clone()),
                Anchor::Fraction(fraction) => Some(Span::Fraction(*fraction)),
                _ => None,
            },
        }
    }

    fn overlay_live(&self, index: usize) -> bool {
        self.overlays.is_live(index) && self.renderer.loaded_indices().contains(&index)
    }

    pub fn on_load(&mut self, index: usize) {
        log::debug!("section {} loaded", index);
        self.sink.emit(&ViewEvent::Load { index });
    }

    pub fn on_relocate(&mut self, event: RelocateEvent) {
        let index = event.index;
        let progress = self.progress.progress(index, event.fraction, event.size);
        let ProgressOf {
            toc_item,
            page_item,
        } = self.progress_of(index, event.range.as_ref());
        let address = self.address_of(index, event.range.as_ref());
        if event.reason.is_passive() {
            self.history
                .replace_state(HistoryEntry::Target(NavigationTarget::Address(address.clone())));
        }
        let location = Location {
            index,
            progress,
            toc_item,
            page_item,
            address,
            range: event.range,
        };
        self.sink.emit(&ViewEvent::Relocate(location.clone()));
        self.last_location = Some(location);
    }

    /// A fresh overlay for section `index`; search hits are replayed on it.
    pub fn on_create_overlay(&mut self, index: usize, overlay: Box<dyn Overlay>) {
        let replay = self.overlays.attach(index, overlay);
        for hit in &replay {
            self.add_annotation(hit);
        }
        self.sink.emit(&ViewEvent::CreateOverlay { index });
    }

    pub fn on_unload(&mut self, index: usize) {
        self.overlays.detach(index);
    }

    /// Hit-test a click on a section overlay. Search hits are not reported.
    pub fn on_overlay_click(&mut self, index: usize, x: f64, y: f64) -> bool {
        let Some((annotation, span)) = self.overlays.hit_test(index, x, y) else {
            return false;
        };
        if annotation.is_search_hit() {
            return false;
        }
        self.sink.emit(&ViewEvent::ShowAnnotation {
            value: annotation.value(),
            index,
            span,
        });
        true
    }

    /// A link was activated inside section `index`.
    pub fn on_link(&mut self, index: usize, href: &str) -> Option<ResolvedTarget> {
        let href = self
            .book
            .section(index)
            .and_then(|section| section.resolve_href(href))
            .unwrap_or_else(|| href.to_string());
        if self.book.is_external(&href) {
            self.sink.emit(&ViewEvent::ExternalLink { index, href });
            return None;
        }
        let allowed = self.sink.emit(&ViewEvent::Link {
            index,
            href: href.clone(),
        });
        if !allowed {
            log::debug!("navigation to {} cancelled by the shell", href);
            return None;
        }
        self.go_to(NavigationTarget::parse(&href))
    }

    pub fn add_annotation(&mut self, annotation: &Annotation) -> Option<AnnotationPlacement> {
        self.update_annotation(annotation, false)
    }

    pub fn delete_annotation(&mut self, annotation: &Annotation) -> Option<AnnotationPlacement> {
        self.update_annotation(annotation, true)
    }

    fn update_annotation(&mut self, annotation: &Annotation, remove: bool) -> Option<AnnotationPlacement> {
        let resolved = self.resolve(&NavigationTarget::parse(annotation.address()))?;
        let index = resolved.index;
        if self.overlay_live(index) {
            let span = self.live_span(&resolved);
            match annotation {
                Annotation::SearchHit(_) if remove => self.overlays.erase(index, annotation),
                Annotation::SearchHit(_) => match span {
                    Some(span) => self
                        .overlays
                        .draw(index, annotation, &span, &DrawStyle::Outline),
                    None => log::debug!("search hit {} has no span", annotation.address()),
                },
                Annotation::Persistent(_) => {
                    self.overlays.erase(index, annotation);
                    if !remove {
                        if let Some(span) = span {
                            if let Some(style) = self.sink.draw_annotation(annotation, index, &span) {
                                self.overlays.draw(index, annotation, &span, &style);
                            }
                        }
                    }
                }
            }
        }
        let label = self
            .progress
            .toc_item(self.book.as_ref(), index, None)
            .map(|item| item.label)
            .unwrap_or_default();
        Some(AnnotationPlacement { index, label })
    }

    /// Navigate to an annotation and report it to the shell.
    pub fn show_annotation(&mut self, annotation: &Annotation) -> Option<ResolvedTarget> {
        let resolved = self.go_to(NavigationTarget::parse(annotation.address()))?;
        if let Some(span) = self.live_span(&resolved) {
            self.sink.emit(&ViewEvent::ShowAnnotation {
                value: annotation.value(),
                index: resolved.index,
                span,
            });
        }
        Some(resolved)
    }

    /// Drop all per-document state: history, overlays, search hits and any
    /// pending narration flip.
    pub fn close(&mut self) {
        self.narration.reset();
        self.history.clear();
        self.overlays.clear();
        self.last_location = None;
        log::debug!("view closed");
    }
}
