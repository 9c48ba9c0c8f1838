/// Core domain types for eftalink: document IDs, dataset references, and rewrite spans.
use std::hash::{Hash, Hasher};
use std::ops::Range;

/// Lowest valid DOJ dataset number.
pub const DATASET_MIN: u8 = 1;

/// Highest valid DOJ dataset number.
pub const DATASET_MAX: u8 = 12;

/// Fixed textual prefix of every EFTA document ID.
pub const EFTA_PREFIX: &str = "EFTA";

/// One contiguous serial range belonging to a DOJ dataset.
/// Bounds are inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetInterval {
    /// Dataset number in `1..=12`.
    pub dataset_id: u8,
    /// Last serial in the dataset.
    pub end: u32,
    /// First serial in the dataset.
    pub start: u32,
}

impl DatasetInterval {
    /// Whether `serial` lies within `[start, end]`.
    pub const fn contains(&self, serial: u32) -> bool {
        return self.start <= serial && serial <= self.end;
    }
}

/// A reference to one of the twelve DOJ datasets.
/// Only constructible for numbers in `1..=12`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DatasetReference(
    /// The validated dataset number.
    u8,
);

impl DatasetReference {
    /// The dataset number.
    pub const fn get(self) -> u8 {
        return self.0;
    }

    /// Validate a raw number against the DOJ dataset domain.
    pub fn new(number: u32) -> Option<Self> {
        let n = u8::try_from(number).ok()?;
        if (DATASET_MIN..=DATASET_MAX).contains(&n) {
            return Some(Self(n));
        }
        return None;
    }

    /// Parse a decimal string such as `"9"` or `"11"`.
    pub fn parse(digits: &str) -> Option<Self> {
        let number: u32 = digits.parse().ok()?;
        return Self::new(number);
    }
}

/// An EFTA document identifier such as `EFTA00027019`.
/// Equality and hashing consider only the numeric serial, so
/// `EFTA0027019` and `EFTA00027019` name the same document.
#[derive(Debug, Clone)]
pub struct DocumentId {
    /// Original text as it appeared in the buffer.
    pub raw: String,
    /// Numeric suffix used for dataset resolution.
    pub serial: u32,
}

impl DocumentId {
    /// Parse `EFTA` followed by 7–8 digits. Returns `None` for anything else.
    pub fn parse(text: &str) -> Option<Self> {
        let digits = text.strip_prefix(EFTA_PREFIX)?;
        if !(7..=8).contains(&digits.len()) || !digits.bytes().all(|b| return b.is_ascii_digit()) {
            return None;
        }
        let serial = digits.parse().ok()?;
        return Some(Self {
            raw: text.to_string(),
            serial,
        });
    }
}

impl PartialEq for DocumentId {
    /// Compare by serial only.
    fn eq(&self, other: &Self) -> bool {
        return self.serial == other.serial;
    }
}

impl Eq for DocumentId {}

impl Hash for DocumentId {
    /// Hash by serial only, consistent with `PartialEq`.
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.serial.hash(state);
    }
}

/// Result of a bare-reference linkify run over one buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkifyOutcome {
    /// Number of dataset references turned into browse-page links.
    pub dataset_links: usize,
    /// Number of document IDs turned into PDF links.
    pub document_links: usize,
    /// The rewritten buffer.
    pub text: String,
}

impl LinkifyOutcome {
    /// Total replacements across both passes.
    pub const fn total(&self) -> usize {
        return self.document_links.saturating_add(self.dataset_links);
    }
}

/// Result of a single rewrite pass: the new buffer plus how many spans changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    /// Number of replacements applied.
    pub count: usize,
    /// The rewritten buffer.
    pub text: String,
}

/// A located, classified candidate for replacement within a buffer.
#[derive(Debug, Clone)]
pub struct RewriteSpan {
    /// What the span refers to.
    pub kind: SpanKind,
    /// Matched text, used as the link label.
    pub matched_text: String,
    /// Byte range of the match in the buffer it was found in.
    pub range: Range<usize>,
}

/// What a rewrite span points at.
#[derive(Debug, Clone)]
pub enum SpanKind {
    /// A single dataset reference like `Dataset 9` or `DS8`.
    Dataset(DatasetReference),
    /// A bare EFTA document ID.
    Document(DocumentId),
}
