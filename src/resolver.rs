use eyre::{Result, eyre};

use crate::address::AddressCodec;
use crate::book::Book;
use crate::models::{Anchor, NavigationTarget, ResolvedTarget, Span};
use crate::progress::SectionProgress;

pub struct Resolver<'a> {
    book: &'a dyn Book,
    progress: &'a SectionProgress,
    codec: &'a dyn AddressCodec,
}

impl<'a> Resolver<'a> {
    pub fn new(book: &'a dyn Book, progress: &'a SectionProgress, codec: &'a dyn AddressCodec) -> Self {
        Self {
            book,
            progress,
            codec,
        }
    }

    pub fn resolve(&self, target: &NavigationTarget) -> Option<ResolvedTarget> {
        match self.try_resolve(target) {
            Ok(resolved) => Some(resolved),
            Err(err) => {
                log::warn!("Could not resolve target {}: {}", target, err);
                None
            }
        }
    }

    fn try_resolve(&self, target: &NavigationTarget) -> Result<ResolvedTarget> {
        let resolved = match target {
            NavigationTarget::Index(index) => ResolvedTarget::index(*index),
            NavigationTarget::Fraction(fraction) => {
                if !fraction.is_finite() {
                    return Err(eyre!("fraction is not a number"));
                }
                let (index, within) = self.progress.section_at(*fraction);
                ResolvedTarget::with_anchor(index, Anchor::Fraction(within))
            }
            NavigationTarget::Address(address) => self.resolve_address(address)?,
            NavigationTarget::Href(href) if self.codec.is_address(href) => {
                self.resolve_address(href)?
            }
            NavigationTarget::Href(href) => self.book.resolve_href(href)?,
        };
        self.check_index(resolved)
    }

    fn resolve_address(&self, address: &str) -> Result<ResolvedTarget> {
        if let Some(resolved) = self.book.resolve_address(address) {
            return resolved;
        }
        let parsed = self
            .codec
            .parse(address)
            .ok_or_else(|| eyre!("malformed address"))?;
        Ok(ResolvedTarget {
            index: parsed.index,
            anchor: parsed.path.map(Anchor::Path),
            select: false,
        })
    }

    fn check_index(&self, resolved: ResolvedTarget) -> Result<ResolvedTarget> {
        let count = self.book.section_count();
        if resolved.index >= count {
            return Err(eyre!(
                "section {} out of range ({} sections)",
                resolved.index,
                count
            ));
        }
        Ok(resolved)
    }

    /// Address string for a span in section `index`, or for the whole section.
    pub fn address_of(&self, index: usize, span: Option<&Span>) -> String {
        let base = self
            .book
            .section(index)
            .and_then(|section| section.base_address())
            .map(str::to_string)
            .unwrap_or_else(|| self.codec.from_index(index));
        match span.and_then(Span::path) {
            Some(path) => self.codec.join(&base, path),
            None => base,
        }
    }
}
