use std::fmt;
use std::ops::Range;
use thiserror::Error;

/// Half-open byte range `[start, end)` into a single source buffer.
///
/// Spans are only meaningful against the buffer they were computed from.
/// Any edit that changes the length of that buffer invalidates every span
/// computed before the edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Span {
    /// Starting byte offset (inclusive)
    pub start: usize,
    /// Ending byte offset (exclusive)
    pub end: usize,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanError {
    #[error("invalid span: start {start} is past end {end}")]
    InvalidSpan { start: usize, end: usize },
}

impl Span {
    pub fn new(start: usize, end: usize) -> Result<Self, SpanError> {
        if start > end {
            return Err(SpanError::InvalidSpan { start, end });
        }
        Ok(Self { start, end })
    }

    /// Span covering a tree-sitter node's byte range.
    pub fn from_node(node: tree_sitter::Node<'_>) -> Self {
        // tree-sitter guarantees start_byte <= end_byte
        Self {
            start: node.start_byte(),
            end: node.end_byte(),
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// True iff the two spans share at least one byte.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// True iff `inner` lies entirely within `self`.
    pub fn contains(&self, inner: &Span) -> bool {
        self.start <= inner.start && inner.end <= self.end
    }

    /// True iff the span is a valid range into a buffer of `len` bytes.
    pub fn fits(&self, len: usize) -> bool {
        self.end <= len
    }

    /// Span after an edit inside it replaced `removed` bytes with `inserted` bytes.
    ///
    /// The start stays put; only the end moves.
    pub fn shift_end(&self, removed: usize, inserted: usize) -> Span {
        Span {
            start: self.start,
            end: (self.end + inserted).saturating_sub(removed).max(self.start),
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}
