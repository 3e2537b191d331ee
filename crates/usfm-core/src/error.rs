use crate::span::Span;
use thiserror::Error;

/// Error kinds for categorizing parse diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// `\id` was not followed by a three letter book code
    ExpectedBookCode,
    /// `\c` was not followed by a number
    ExpectedChapterNumber,
    /// `\v` was not followed by a number
    ExpectedVerseNumber,
    /// Backslash sequence that is not a known marker
    UnknownMarker,
    /// Paired marker closed implicitly by structure or an outer closer
    UnclosedMarker,
    /// Chapter or verse number that does not convert to an integer
    InvalidNumber,
    /// Key counter reached `u32::MAX`; later units share the last key
    KeysExhausted,
}

/// A parse diagnostic with location and recovery information.
///
/// Only the three `Expected*` kinds abort parsing. Everything else is
/// collected alongside a best-effort result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}{}", location(.span))]
pub struct ParseError {
    /// Human-readable error message
    pub message: String,
    /// Source location where the error occurred
    pub span: Option<Span>,
    /// Error categorization
    pub kind: ParseErrorKind,
    /// Whether parsing can continue after this error
    pub recoverable: bool,
}

fn location(span: &Option<Span>) -> String {
    match span {
        Some(span) => format!(" at bytes {}..{}", span.start, span.end),
        None => String::new(),
    }
}

impl ParseError {
    /// Create a fatal "expected X" error for the literal that was found instead.
    pub fn expected(kind: ParseErrorKind, found: &str, span: Option<Span>) -> Self {
        let what = match kind {
            ParseErrorKind::ExpectedBookCode => "book code",
            ParseErrorKind::ExpectedChapterNumber => "chapter number",
            ParseErrorKind::ExpectedVerseNumber => "verse number",
            _ => "marker",
        };
        Self {
            message: format!("found {:?}, expected {}", found, what),
            span,
            kind,
            recoverable: false,
        }
    }

    /// Create a diagnostic for an unrecognised marker.
    pub fn unknown_marker(literal: &str, span: Option<Span>) -> Self {
        Self {
            message: format!("unknown marker {}", literal),
            span,
            kind: ParseErrorKind::UnknownMarker,
            recoverable: true,
        }
    }

    /// Create a diagnostic for a paired marker that was never closed.
    pub fn unclosed_marker(marker: &str, span: Option<Span>) -> Self {
        Self {
            message: format!("unclosed {}", marker),
            span,
            kind: ParseErrorKind::UnclosedMarker,
            recoverable: true,
        }
    }

    /// Create a diagnostic for a chapter or verse number that fell back to
    /// the previous counter plus one.
    pub fn invalid_number(what: &str, literal: &str, fallback: u32, span: Option<Span>) -> Self {
        Self {
            message: format!(
                "found {:?}, expected {} number; using {}",
                literal, what, fallback
            ),
            span,
            kind: ParseErrorKind::InvalidNumber,
            recoverable: true,
        }
    }

    /// Create a diagnostic for a unit that found no key left to allocate.
    pub fn keys_exhausted(reference: &str, key: u32) -> Self {
        Self {
            message: format!("no key left for {:?} after {}", reference, key),
            span: None,
            kind: ParseErrorKind::KeysExhausted,
            recoverable: true,
        }
    }
}

/// A collection of recoverable diagnostics gathered during a pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseErrors {
    errors: Vec<ParseError>,
}

impl ParseErrors {
    /// Create an empty error collection.
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Add an error to the collection.
    pub fn push(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    /// Check if any errors were collected.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get the number of errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Iterate over the errors.
    pub fn iter(&self) -> impl Iterator<Item = &ParseError> {
        self.errors.iter()
    }

    /// Count the errors of one kind.
    pub fn count(&self, kind: ParseErrorKind) -> usize {
        self.errors.iter().filter(|e| e.kind == kind).count()
    }

    /// Check if any non-recoverable errors exist.
    pub fn has_fatal(&self) -> bool {
        self.errors.iter().any(|e| !e.recoverable)
    }
}

impl IntoIterator for ParseErrors {
    type Item = ParseError;
    type IntoIter = std::vec::IntoIter<ParseError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl Extend<ParseError> for ParseErrors {
    fn extend<T: IntoIterator<Item = ParseError>>(&mut self, iter: T) {
        self.errors.extend(iter);
    }
}

/// Errors returned when parsing from a reader.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read USFM input: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Parse(#[from] ParseError),
}
