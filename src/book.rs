use std::cmp::Ordering;

use eyre::Result;

use crate::error;
use crate::models::{
    BookMetadata, DocPath, Landmark, NavItem, ReadingDirection, ResolvedTarget, Span,
};

/// A text node of a section document, as seen by search matchers.
#[derive(Debug, Clone, PartialEq)]
pub struct TextNode {
    pub path: DocPath,
    pub text: String,
}

/// A section document, either rendered or constructed off-screen.
pub trait Document {
    /// Resolve an intra-document path, `None` if it does not exist here.
    fn resolve_path(&self, path: &DocPath) -> Option<Span>;

    /// Span of the element carrying `id`.
    fn fragment_span(&self, id: &str) -> Option<Span>;

    fn text_nodes(&self) -> Vec<TextNode>;

    /// Document order of two spans.
    fn compare(&self, a: &Span, b: &Span) -> Option<Ordering>;
}

pub trait Section {
    fn id(&self) -> &str;

    /// Content size used for progress interpolation.
    fn size(&self) -> u64;

    /// Non-linear sections (covers, notes) are outside the reading order.
    fn linear(&self) -> bool {
        true
    }

    /// Format-specific base address of this section.
    fn base_address(&self) -> Option<&str> {
        None
    }

    /// Resolve an href relative to this section into a book-level href.
    fn resolve_href(&self, _href: &str) -> Option<String> {
        None
    }

    /// Construct a fresh document. `None` when the section cannot be loaded
    /// outside the renderer.
    fn create_document(&self) -> Option<error::Result<Box<dyn Document>>> {
        None
    }
}

/// Book capability for splitting TOC hrefs into section id + fragment.
pub trait TocFragments {
    fn split_href(&self, href: &str) -> Option<(String, Option<String>)>;

    fn fragment(&self, doc: &dyn Document, fragment: &str) -> Option<Span>;
}

pub trait Book {
    fn section_count(&self) -> usize;

    fn section(&self, index: usize) -> Option<&dyn Section>;

    fn resolve_href(&self, href: &str) -> Result<ResolvedTarget>;

    /// Format-aware address resolution, preferred over the generic codec.
    fn resolve_address(&self, _address: &str) -> Option<Result<ResolvedTarget>> {
        None
    }

    /// Absent when the format cannot locate TOC fragments; TOC and page-list
    /// progress are disabled then.
    fn toc_fragments(&self) -> Option<&dyn TocFragments> {
        None
    }

    fn toc(&self) -> &[NavItem] {
        &[]
    }

    fn page_list(&self) -> &[NavItem] {
        &[]
    }

    fn landmarks(&self) -> &[Landmark] {
        &[]
    }

    fn dir(&self) -> ReadingDirection {
        ReadingDirection::Ltr
    }

    fn metadata(&self) -> BookMetadata {
        BookMetadata::default()
    }

    fn is_external(&self, href: &str) -> bool {
        has_url_scheme(href)
    }
}

/// True for hrefs starting with a `scheme:` prefix.
pub fn has_url_scheme(href: &str) -> bool {
    match href.split_once(':') {
        Some((scheme, _)) => {
            !scheme.is_empty() && scheme.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    }
}

/// Section ids in book order.
pub fn section_ids(book: &dyn Book) -> Vec<String> {
    (0..book.section_count())
        .map(|index| {
            book.section(index)
                .map(|section| section.id().to_string())
                .unwrap_or_default()
        })
        .collect()
}
