//! Character-level scanner for USFM text.
//!
//! The scanner walks the input one character at a time and groups runs
//! into tokens: whitespace, markers (`\v`, `\wj*`, ...), free text,
//! numbers and `|` citation runs. Every token records the byte span of its
//! literal so later passes can map structure back to exact offsets.
//!
//! # Performance
//!
//! - Zero-copy: literals borrow directly from the input
//! - Citation runs are found with `memchr`
//! - One-token pushback without re-reading input

use memchr::memchr;

use crate::span::Span;
use crate::token::Token;

/// The pilcrow, accepted as a paragraph marker.
const PILCROW: char = '\u{b6}';

/// Characters read after the marker lead before the literal is rejected.
const MAX_MARKER_CHARS: usize = 7;

/// A scanned token with its literal text and source span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scanned<'a> {
    /// Token kind.
    pub token: Token,
    /// The literal text, borrowed from the input.
    pub literal: &'a str,
    /// Byte span of the literal.
    pub span: Span,
}

impl<'a> Scanned<'a> {
    /// Byte offset where the literal starts.
    #[inline(always)]
    pub fn position(&self) -> u32 {
        self.span.start
    }
}

/// Tokenizer over a UTF-8 string with single-token pushback.
pub struct Scanner<'a> {
    /// The complete input text.
    input: &'a str,
    /// Input as bytes for memchr scanning.
    bytes: &'a [u8],
    /// Current byte offset.
    offset: usize,
    /// Most recently returned token.
    last: Option<Scanned<'a>>,
    /// Whether `last` should be returned again by the next `scan`.
    pushed_back: bool,
}

impl<'a> Scanner<'a> {
    /// Create a new scanner for the given input.
    #[inline]
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            offset: 0,
            last: None,
            pushed_back: false,
        }
    }

    /// Get the current byte offset.
    #[inline(always)]
    pub fn offset(&self) -> u32 {
        self.offset as u32
    }

    /// Scan the next token.
    ///
    /// After [`pushback`](Self::pushback) this returns the pushed-back
    /// token again instead of reading input.
    pub fn scan(&mut self) -> Scanned<'a> {
        if self.pushed_back {
            if let Some(last) = self.last {
                self.pushed_back = false;
                return last;
            }
        }
        let scanned = self.read_token();
        self.last = Some(scanned);
        scanned
    }

    /// Scan the next token that is not whitespace.
    pub fn scan_ignore_whitespace(&mut self) -> Scanned<'a> {
        loop {
            let scanned = self.scan();
            if scanned.token != Token::Whitespace {
                return scanned;
            }
        }
    }

    /// Undo the most recent [`scan`](Self::scan).
    ///
    /// Only one token can be pushed back; calling this twice in a row has
    /// the same effect as calling it once.
    #[inline]
    pub fn pushback(&mut self) {
        if self.last.is_some() {
            self.pushed_back = true;
        }
    }

    /// Look at the next `n` bytes of input without consuming them.
    ///
    /// Returns `None` when fewer than `n` bytes remain or when the slice
    /// would end inside a multi-byte character.
    #[inline]
    pub fn peek(&self, n: usize) -> Option<&'a str> {
        self.input.get(self.offset..self.offset + n)
    }

    /// Get a slice of the input by span.
    ///
    /// The span must come from this scanner so that both ends fall on
    /// character boundaries.
    #[inline]
    pub fn slice(&self, span: Span) -> &'a str {
        &self.input[span.start as usize..span.end as usize]
    }

    #[inline(always)]
    fn peek_char(&self) -> Option<char> {
        self.input[self.offset..].chars().next()
    }

    #[inline(always)]
    fn finish(&self, token: Token, start: usize) -> Scanned<'a> {
        Scanned {
            token,
            literal: &self.input[start..self.offset],
            span: Span::new(start as u32, self.offset as u32),
        }
    }

    fn read_token(&mut self) -> Scanned<'a> {
        let start = self.offset;
        let Some(ch) = self.peek_char() else {
            return self.finish(Token::Eof, start);
        };

        if ch.is_whitespace() {
            self.advance_while(char::is_whitespace);
            self.finish(Token::Whitespace, start)
        } else if ch == '\\' || ch == PILCROW {
            self.scan_marker(start)
        } else if is_text_char(ch) {
            self.advance_while(|c| is_text_char(c) || c.is_numeric());
            self.finish(Token::Text, start)
        } else if ch.is_numeric() {
            // "8th" stays text, "200," is the number 200 followed by text
            let next = self.input[start + ch.len_utf8()..].chars().next();
            if next.is_some_and(char::is_alphabetic) {
                self.advance_while(|c| is_text_char(c) || c.is_numeric());
                self.finish(Token::Text, start)
            } else {
                self.advance_while(char::is_numeric);
                self.finish(Token::Number, start)
            }
        } else if ch == '|' {
            self.scan_citation(start)
        } else {
            self.offset += ch.len_utf8();
            self.finish(Token::Illegal, start)
        }
    }

    #[inline]
    fn advance_while(&mut self, accept: impl Fn(char) -> bool) {
        while let Some(c) = self.peek_char() {
            if !accept(c) {
                break;
            }
            self.offset += c.len_utf8();
        }
    }

    fn scan_marker(&mut self, start: usize) -> Scanned<'a> {
        if let Some(lead) = self.peek_char() {
            self.offset += lead.len_utf8();
        }

        let mut read = 0;
        let mut overlong = false;
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() || c == '\\' {
                break;
            }
            self.offset += c.len_utf8();
            if c == '*' {
                break;
            }
            read += 1;
            if read == MAX_MARKER_CHARS {
                overlong = true;
                break;
            }
        }

        let literal = &self.input[start..self.offset];
        let token = if overlong {
            Token::Illegal
        } else {
            Token::lookup(literal).unwrap_or(Token::Illegal)
        };
        log::trace!("marker {:?} as {:?} at byte {}", literal, token, start);
        self.finish(token, start)
    }

    fn scan_citation(&mut self, start: usize) -> Scanned<'a> {
        let from = start + 1;
        self.offset = match memchr(b'\\', &self.bytes[from..]) {
            Some(pos) => from + pos,
            None => self.bytes.len(),
        };
        self.finish(Token::Citation, start)
    }
}

/// Letters and punctuation that start or continue a text run.
#[inline(always)]
fn is_text_char(c: char) -> bool {
    !c.is_whitespace()
        && !c.is_control()
        && !c.is_numeric()
        && !matches!(c, '\\' | '|' | PILCROW)
}
