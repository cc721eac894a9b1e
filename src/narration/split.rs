use crate::models::{ReadingDirection, Rect, SplitInfo};
use crate::renderer::SpanGeometry;

/// Above this visible share the overflow is not worth a flip.
const NEGLIGIBLE_OVERFLOW: f64 = 0.98;

/// Minimum share hidden in the reading direction.
const MIN_PROGRESSION: f64 = 0.10;

/// Split detection over live geometry. Scrolled layouts, vertical writing
/// and incomplete geometry never split.
pub fn detect(
    geometry: Option<&SpanGeometry>,
    scrolled: bool,
    dir: ReadingDirection,
) -> Option<SplitInfo> {
    if scrolled {
        return None;
    }
    let geometry = geometry?;
    if geometry.vertical {
        return None;
    }
    let viewport = geometry.viewport?.intersect(&geometry.frame?)?;
    detect_split(&geometry.rects, &viewport, dir)
}

pub fn detect_split(rects: &[Rect], viewport: &Rect, dir: ReadingDirection) -> Option<SplitInfo> {
    let mut total = 0.0;
    let mut visible = 0.0;
    let mut hidden_right = 0.0;
    let mut hidden_left = 0.0;

    for rect in rects.iter().filter(|rect| !rect.is_degenerate()) {
        total += rect.area();
        if let Some(overlap) = rect.intersect(viewport) {
            visible += overlap.area();
        }
        let row = rect.bottom.min(viewport.bottom) - rect.top.max(viewport.top);
        if row <= 0.0 {
            continue;
        }
        let right = (rect.right - rect.left.max(viewport.right)).max(0.0);
        let left = (rect.right.min(viewport.left) - rect.left).max(0.0);
        hidden_right += right * row;
        hidden_left += left * row;
    }

    if total <= 0.0 || visible <= 0.0 {
        return None;
    }
    let visible_ratio = visible / total;
    if visible_ratio >= NEGLIGIBLE_OVERFLOW {
        return None;
    }
    let (forward, backward) = match dir {
        ReadingDirection::Ltr => (hidden_right, hidden_left),
        ReadingDirection::Rtl => (hidden_left, hidden_right),
    };
    let progression = forward / total;
    let opposite = backward / total;
    if progression < MIN_PROGRESSION || progression <= opposite {
        return None;
    }
    Some(SplitInfo {
        visible_ratio,
        off_screen_ratio: progression,
    })
}

/// Playback time at which to turn the page, never before `begin`.
pub fn flip_time(begin: f64, end: f64, visible_ratio: f64, early_offset: f64) -> f64 {
    (begin + (end - begin) * visible_ratio - early_offset).max(begin)
}
