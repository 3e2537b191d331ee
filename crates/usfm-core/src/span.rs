//! Byte positions in the scanned text.
//!
//! Every token carries a `Span` so the parser can record where each node
//! starts. The index builder relies on these offsets being exact byte
//! positions in the original UTF-8 stream, not character counts.

use serde::Serialize;

/// A byte range in the source text.
///
/// `start` is inclusive and `end` is exclusive: `[start, end)`.
///
/// # Example
///
/// ```rust
/// use usfm_core::span::Span;
///
/// let span = Span::new(4, 7);
/// assert_eq!(span.len(), 3);
/// assert!(span.contains(6));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Span {
    /// Starting byte offset (inclusive).
    pub start: u32,
    /// Ending byte offset (exclusive).
    pub end: u32,
}

impl Span {
    /// Create a new span from byte offsets.
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Create a span starting at `start` covering `len` bytes.
    #[inline]
    pub const fn at(start: u32, len: u32) -> Self {
        Self {
            start,
            end: start + len,
        }
    }

    /// Length of the span in bytes.
    #[inline]
    pub const fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    /// Check if this span is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Check if this span contains a byte offset.
    #[inline]
    pub const fn contains(&self, offset: u32) -> bool {
        offset >= self.start && offset < self.end
    }

    /// Merge two spans into one covering both.
    #[inline]
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}
