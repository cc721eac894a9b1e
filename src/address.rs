use crate::models::DocPath;

const PREFIX: &str = "epubcfi(";
const SUFFIX: &str = ")";
const SPINE_STEP: &str = "/6/";

/// Format test shared by every codec.
pub fn is_address(raw: &str) -> bool {
    raw.starts_with(PREFIX) && raw.ends_with(SUFFIX) && raw.len() > PREFIX.len()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedAddress {
    pub index: usize,
    pub path: Option<DocPath>,
}

pub trait AddressCodec {
    fn is_address(&self, raw: &str) -> bool {
        is_address(raw)
    }

    fn parse(&self, address: &str) -> Option<ParsedAddress>;

    /// Address of a whole section.
    fn from_index(&self, index: usize) -> String;

    /// Append an intra-document path to a section address.
    fn join(&self, base: &str, path: &DocPath) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticCodec;

impl SyntheticCodec {
    fn inner(address: &str) -> Option<&str> {
        address.strip_prefix(PREFIX)?.strip_suffix(SUFFIX)
    }

    /// Last step of the section part, e.g. `4` in `/6/4[chap01]`.
    fn section_step(section: &str) -> Option<usize> {
        let step = section.rsplit('/').next()?;
        let step = step.split('[').next()?;
        step.parse().ok()
    }
}

impl AddressCodec for SyntheticCodec {
    fn parse(&self, address: &str) -> Option<ParsedAddress> {
        let inner = Self::inner(address)?;
        let (section, path) = match inner.split_once('!') {
            Some((section, path)) => (section, Some(path)),
            None => (inner, None),
        };
        let step = Self::section_step(section)?;
        if step < 2 || step % 2 != 0 {
            return None;
        }
        Some(ParsedAddress {
            index: step / 2 - 1,
            path: path.filter(|p| !p.is_empty()).map(DocPath::new),
        })
    }

    fn from_index(&self, index: usize) -> String {
        format!("{}{}{}{}", PREFIX, SPINE_STEP, (index + 1) * 2, SUFFIX)
    }

    fn join(&self, base: &str, path: &DocPath) -> String {
        match Self::inner(base) {
            Some(inner) => format!("{}{}!{}{}", PREFIX, inner, path, SUFFIX),
            None => format!("{}!{}", base, path),
        }
    }
}
