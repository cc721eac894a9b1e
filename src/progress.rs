use std::cmp::Ordering;
use std::collections::HashMap;

use crate::book::{self, Book, Document, TocFragments};
use crate::models::{NavItem, Span};
use crate::settings::ProgressSettings;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionPosition {
    pub current: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationPosition {
    pub current: u64,
    pub next: u64,
    pub total: u64,
}

/// Remaining reading time, in the configured time unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeRemaining {
    pub section: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub fraction: f64,
    pub section: SectionPosition,
    pub location: LocationPosition,
    pub time: TimeRemaining,
}

#[derive(Debug, Clone)]
pub struct SectionProgress {
    sizes: Vec<u64>,
    size_total: u64,
    size_per_loc: f64,
    size_per_time_unit: f64,
    section_fractions: Vec<f64>,
}

impl SectionProgress {
    pub fn new(book: &dyn Book, settings: &ProgressSettings) -> Self {
        let sizes = (0..book.section_count())
            .map(|index| match book.section(index) {
                Some(section) if section.linear() => section.size(),
                _ => 0,
            })
            .collect();
        Self::from_sizes(sizes, settings)
    }

    pub fn from_sizes(sizes: Vec<u64>, settings: &ProgressSettings) -> Self {
        let size_total = sizes.iter().sum();
        let mut section_fractions = Vec::with_capacity(sizes.len() + 1);
        section_fractions.push(0.0);
        let mut sum = 0u64;
        for size in &sizes {
            sum += size;
            section_fractions.push(ratio(sum as f64, size_total as f64));
        }
        Self {
            sizes,
            size_total,
            size_per_loc: settings.size_per_loc,
            size_per_time_unit: settings.size_per_time_unit,
            section_fractions,
        }
    }

    /// Cumulative start fraction of every section, plus a trailing `1.0`.
    pub fn section_fractions(&self) -> &[f64] {
        &self.section_fractions
    }

    pub fn progress(&self, index: usize, fraction_in_section: f64, page_fraction: f64) -> Progress {
        let size_in_section = self.sizes.get(index).copied().unwrap_or(0) as f64;
        let size_before: u64 = self.sizes.iter().take(index).sum();
        let size = size_before as f64 + fraction_in_section * size_in_section;
        let next_size = size + page_fraction * size_in_section;
        let size_total = self.size_total as f64;
        let remaining_total = size_total - size;
        let remaining_section = (1.0 - fraction_in_section) * size_in_section;
        Progress {
            fraction: ratio(next_size, size_total),
            section: SectionPosition {
                current: index,
                total: self.sizes.len(),
            },
            location: LocationPosition {
                current: (size / self.size_per_loc).floor() as u64,
                next: (next_size / self.size_per_loc).floor() as u64,
                total: (size_total / self.size_per_loc).ceil() as u64,
            },
            time: TimeRemaining {
                section: remaining_section / self.size_per_time_unit,
                total: remaining_total / self.size_per_time_unit,
            },
        }
    }

    /// Inverse of [`SectionProgress::progress`]: global fraction to
    /// `(index, fraction_in_section)`.
    pub fn section_at(&self, fraction: f64) -> (usize, f64) {
        let last = self.sizes.len().saturating_sub(1);
        if fraction <= 0.0 || self.size_total == 0 {
            return (0, 0.0);
        }
        if fraction >= 1.0 {
            return (last, 1.0);
        }
        let fraction = fraction + f64::EPSILON;
        let total = self.size_total as f64;
        let mut sum = 0.0;
        for (index, &size) in self.sizes.iter().enumerate() {
            let share = size as f64 / total;
            let new_sum = sum + share;
            if new_sum > fraction {
                return (index, (fraction - sum) / share);
            }
            sum = new_sum;
        }
        (last, 1.0)
    }
}

fn ratio(part: f64, total: f64) -> f64 {
    if total > 0.0 { part / total } else { 0.0 }
}

/// Flattened TOC or page-list item with a stable depth-first id.
#[derive(Debug, Clone, PartialEq)]
pub struct TocItem {
    pub id: usize,
    pub label: String,
    pub href: String,
}

#[derive(Debug, Clone)]
struct TocGroup {
    prev: Option<TocItem>,
    items: Vec<(Option<String>, TocItem)>,
}

#[derive(Debug, Clone, Default)]
pub struct TocProgress {
    ids: Vec<String>,
    groups: HashMap<String, TocGroup>,
}

impl TocProgress {
    pub fn new(items: &[NavItem], ids: Vec<String>, splitter: &dyn TocFragments) -> Self {
        let mut flat = Vec::new();
        flatten(items, &mut flat);

        let mut grouped: HashMap<String, TocGroup> = HashMap::new();
        for (i, item) in flat.iter().enumerate() {
            let Some((id, fragment)) = splitter.split_href(&item.href) else {
                continue;
            };
            match grouped.get_mut(&id) {
                Some(group) => group.items.push((fragment, item.clone())),
                None => {
                    let prev = i.checked_sub(1).map(|p| flat[p].clone());
                    grouped.insert(
                        id,
                        TocGroup {
                            prev,
                            items: vec![(fragment, item.clone())],
                        },
                    );
                }
            }
        }

        // Sections without their own items inherit the previous section's group.
        let mut groups: HashMap<String, TocGroup> = HashMap::new();
        let mut carried: Option<TocGroup> = None;
        for id in &ids {
            if let Some(group) = grouped.remove(id) {
                carried = Some(group);
            }
            if let Some(group) = &carried {
                groups.insert(id.clone(), group.clone());
            }
        }

        Self { ids, groups }
    }

    /// Item containing `range` in section `index`; the first item of the
    /// section when no range is known.
    pub fn item_at(
        &self,
        index: usize,
        range: Option<(&dyn Document, &Span)>,
        splitter: &dyn TocFragments,
    ) -> Option<TocItem> {
        let id = self.ids.get(index)?;
        let group = self.groups.get(id)?;
        let Some((_, first)) = group.items.first() else {
            return group.prev.clone();
        };
        let Some((doc, range)) = range else {
            return Some(first.clone());
        };
        if group.items.len() == 1 && group.items[0].0.is_none() {
            return Some(first.clone());
        }
        for (i, (fragment, _)) in group.items.iter().enumerate() {
            let Some(fragment) = fragment else { continue };
            let Some(target) = splitter.fragment(doc, fragment) else {
                continue;
            };
            if doc.compare(&target, range) == Some(Ordering::Greater) {
                return match i.checked_sub(1) {
                    Some(p) => Some(group.items[p].1.clone()),
                    None => group.prev.clone(),
                };
            }
        }
        group.items.last().map(|(_, item)| item.clone())
    }
}

fn flatten(items: &[NavItem], out: &mut Vec<TocItem>) {
    for item in items {
        out.push(TocItem {
            id: out.len(),
            label: item.label.clone(),
            href: item.href.clone(),
        });
        flatten(&item.subitems, out);
    }
}

/// Section, TOC and page-list progress behind one contract.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    section: SectionProgress,
    toc: Option<TocProgress>,
    pages: Option<TocProgress>,
}

impl ProgressTracker {
    pub fn new(book: &dyn Book, settings: &ProgressSettings) -> Self {
        let section = SectionProgress::new(book, settings);
        let (toc, pages) = match book.toc_fragments() {
            Some(splitter) => {
                let ids = book::section_ids(book);
                let toc = (!book.toc().is_empty())
                    .then(|| TocProgress::new(book.toc(), ids.clone(), splitter));
                let pages = (!book.page_list().is_empty())
                    .then(|| TocProgress::new(book.page_list(), ids, splitter));
                (toc, pages)
            }
            None => {
                log::debug!("book cannot split TOC hrefs, TOC and page-list progress disabled");
                (None, None)
            }
        };
        Self {
            section,
            toc,
            pages,
        }
    }

    pub fn section(&self) -> &SectionProgress {
        &self.section
    }

    pub fn has_toc(&self) -> bool {
        self.toc.is_some()
    }

    pub fn has_page_list(&self) -> bool {
        self.pages.is_some()
    }

    pub fn progress(&self, index: usize, fraction: f64, size: f64) -> Progress {
        self.section.progress(index, fraction, size)
    }

    pub fn toc_item(
        &self,
        book: &dyn Book,
        index: usize,
        range: Option<(&dyn Document, &Span)>,
    ) -> Option<TocItem> {
        let splitter = book.toc_fragments()?;
        self.toc.as_ref()?.item_at(index, range, splitter)
    }

    pub fn page_item(
        &self,
        book: &dyn Book,
        index: usize,
        range: Option<(&dyn Document, &Span)>,
    ) -> Option<TocItem> {
        let splitter = book.toc_fragments()?;
        self.pages.as_ref()?.item_at(index, range, splitter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(sizes: Vec<u64>) -> SectionProgress {
        SectionProgress::from_sizes(sizes, &ProgressSettings::default())
    }

    #[test]
    fn test_section_fractions() {
        let p = progress(vec![1000, 3000, 0, 1000]);
        assert_eq!(p.section_fractions(), &[0.0, 0.2, 0.8, 0.8, 1.0]);
    }

    #[test]
    fn test_progress_midway() {
        let p = progress(vec![1500, 3000]);
        let report = p.progress(1, 0.5, 0.0);
        assert!((report.fraction - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(report.section, SectionPosition { current: 1, total: 2 });
        assert_eq!(report.location.current, 2);
        assert_eq!(report.location.total, 3);
        assert!((report.time.section - 1500.0 / 1600.0).abs() < 1e-9);
    }

    #[test]
    fn test_progress_page_fraction_moves_next_location() {
        let p = progress(vec![3000]);
        let report = p.progress(0, 0.0, 0.5);
        assert_eq!(report.location.current, 0);
        assert_eq!(report.location.next, 1);
        assert!((report.fraction - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_section_at_bounds() {
        let p = progress(vec![100, 100]);
        assert_eq!(p.section_at(-0.5), (0, 0.0));
        assert_eq!(p.section_at(0.0), (0, 0.0));
        assert_eq!(p.section_at(1.0), (1, 1.0));
        assert_eq!(p.section_at(7.0), (1, 1.0));
    }

    #[test]
    fn test_section_at_inverts_progress() {
        let p = progress(vec![1000, 3000, 1000]);
        let (index, within) = p.section_at(0.5);
        assert_eq!(index, 1);
        assert!((within - 0.5).abs() < 1e-6);
        let back = p.progress(index, within, 0.0).fraction;
        assert!((back - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_section_at_skips_empty_sections() {
        let p = progress(vec![0, 100, 0, 100]);
        assert_eq!(p.section_at(0.25).0, 1);
        assert_eq!(p.section_at(0.75).0, 3);
    }

    #[test]
    fn test_empty_book_progress() {
        let p = progress(vec![]);
        assert_eq!(p.section_at(0.5), (0, 0.0));
        assert_eq!(p.progress(0, 0.0, 0.0).fraction, 0.0);
    }
}
