pub mod split;

use crate::models::{MediaOverlayItem, Span};
use crate::view::View;

/// Position of the highlighted span, re-resolved against the renderer
/// whenever it is touched.
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightHandle {
    pub index: usize,
    pub span: Span,
}

#[derive(Debug, Clone, Default)]
pub struct Narration {
    auto_navigate: bool,
    pending_flip: Option<f64>,
    highlighted: Option<HighlightHandle>,
}

impl Narration {
    pub fn new(auto_navigate: bool) -> Self {
        Self {
            auto_navigate,
            ..Self::default()
        }
    }

    pub fn auto_navigate(&self) -> bool {
        self.auto_navigate
    }

    pub fn pending_flip(&self) -> Option<f64> {
        self.pending_flip
    }

    pub fn highlighted(&self) -> Option<&HighlightHandle> {
        self.highlighted.as_ref()
    }

    fn cancel_flip(&mut self) {
        if let Some(at) = self.pending_flip.take() {
            log::debug!("page flip at {:.3}s cancelled", at);
        }
    }

    pub(crate) fn reset(&mut self) {
        self.cancel_flip();
        self.highlighted = None;
    }
}

impl View {
    pub fn narration(&self) -> &Narration {
        &self.narration
    }

    pub fn set_narration_auto_navigate(&mut self, auto_navigate: bool) {
        self.narration.auto_navigate = auto_navigate;
    }

    /// Playback time of the armed page flip.
    pub fn pending_flip(&self) -> Option<f64> {
        self.narration.pending_flip
    }

    /// A span starts narrating.
    pub fn on_narration_highlight(&mut self, item: &MediaOverlayItem) {
        self.narration.cancel_flip();
        self.clear_highlight();
        let Some(resolved) = self.resolve(&item.text) else {
            return;
        };
        if self.narration.auto_navigate {
            if let Err(err) = self.renderer.go_to(&resolved) {
                log::warn!("Could not follow narration to {}: {}", item.text, err);
                return;
            }
        }
        let Some(span) = self.live_span(&resolved) else {
            log::warn!("narrated span {} is not rendered", item.text);
            return;
        };
        let index = resolved.index;
        let class = self.settings.narration.active_class.clone();
        if let Err(err) = self.renderer.set_class(index, &span, &class, true) {
            log::warn!("Could not highlight narrated span: {}", err);
        }
        self.narration.highlighted = Some(HighlightHandle {
            index,
            span: span.clone(),
        });
        if self.narration.auto_navigate {
            self.schedule_flip(item, index, &span);
        }
    }

    fn schedule_flip(&mut self, item: &MediaOverlayItem, index: usize, span: &Span) {
        let geometry = self.renderer.span_geometry(index, span);
        let Some(split) = split::detect(
            geometry.as_ref(),
            self.renderer.is_scrolled(),
            self.book.dir(),
        ) else {
            return;
        };
        if self.renderer.at_end() || item.duration() <= self.settings.narration.min_flip_duration {
            return;
        }
        let at = split::flip_time(
            item.begin,
            item.end,
            split.visible_ratio,
            self.settings.narration.early_offset,
        );
        log::debug!(
            "narrated span is {:.0}% off screen, flipping at {:.3}s",
            split.off_screen_ratio * 100.0,
            at
        );
        self.narration.pending_flip = Some(at);
    }

    /// Narration of the current span ended or stopped.
    pub fn on_narration_unhighlight(&mut self) {
        self.narration.cancel_flip();
        self.clear_highlight();
    }

    fn clear_highlight(&mut self) {
        let Some(handle) = self.narration.highlighted.take() else {
            return;
        };
        if !self.renderer.loaded_indices().contains(&handle.index) {
            return;
        }
        let class = self.settings.narration.active_class.clone();
        if let Err(err) = self
            .renderer
            .set_class(handle.index, &handle.span, &class, false)
        {
            log::warn!("Could not clear narration highlight: {}", err);
        }
    }

    /// Playback reached `time`. Returns true when the armed flip fired.
    pub fn on_narration_time_update(&mut self, time: f64) -> bool {
        match self.narration.pending_flip {
            Some(at) if time >= at => {
                self.narration.pending_flip = None;
                self.next();
                true
            }
            _ => false,
        }
    }
}
