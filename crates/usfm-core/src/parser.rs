//! Recursive descent parser for USFM
//!
//! Pulls tokens from the [`Scanner`] and builds a [`Node`] tree rooted in a
//! `book` node. Structural markers (`\c`, `\p`, `\v`) nest by position;
//! paired character markers (`\w`, `\wj`, `\f`, ...) nest until their
//! closer. Only a missing book code, chapter number or verse number aborts
//! the parse; everything else degrades into generic nodes and a recoverable
//! diagnostic.

use std::io::Read;

use crate::ast::{Document, Node, NodeKind};
use crate::error::{Error, ParseError, ParseErrorKind, ParseErrors};
use crate::scanner::{Scanned, Scanner};
use crate::span::Span;
use crate::token::Token;

/// Result type for parsing that includes recovered errors.
#[derive(Debug)]
pub struct ParseResult {
    /// The parsed document.
    pub document: Document,
    /// Recoverable diagnostics encountered during parsing.
    pub errors: ParseErrors,
}

impl ParseResult {
    /// Check if parsing completed without diagnostics.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Number of poetic lines seen in the verse being parsed.
///
/// Only reported in trace logs; the renderer tracks open lines itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct PoeticCounts {
    q1: u32,
    q2: u32,
}

impl PoeticCounts {
    #[inline]
    fn bump(&mut self, token: Token) {
        match token {
            Token::Poetry1 => self.q1 += 1,
            Token::Poetry2 => self.q2 += 1,
            _ => {}
        }
    }
}

/// USFM parser with configurable error recovery.
///
/// The parser keeps a little state between tokens: a poetic marker waiting
/// to be moved into the next verse, the number of the most recent verse in
/// the chapter, and per-verse poetic counters. All of it is reset at the
/// start of every parse.
pub struct Parser {
    /// Errors collected during parsing (for recovery mode).
    errors: ParseErrors,
    /// Whether to attempt recovery on errors.
    recover_on_error: bool,
    /// Poetic marker scanned just before a `\v`, owned by the next verse.
    carryover: Option<Node>,
    /// Number literal of the most recent verse in the current chapter.
    last_verse: Option<String>,
    poetry: PoeticCounts,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// Create a new parser.
    #[inline]
    pub fn new() -> Self {
        Self {
            errors: ParseErrors::new(),
            recover_on_error: true,
            carryover: None,
            last_verse: None,
            poetry: PoeticCounts::default(),
        }
    }

    /// Enable or disable error recovery mode.
    ///
    /// When enabled (default), unknown markers and unclosed character
    /// markers are collected as diagnostics and parsing continues. When
    /// disabled, parsing stops at the first of them.
    pub fn with_recovery(mut self, recover: bool) -> Self {
        self.recover_on_error = recover;
        self
    }

    /// Parse the input, discarding recoverable diagnostics.
    pub fn parse(&mut self, input: &str) -> Result<Document, ParseError> {
        let result = self.parse_with_recovery(input)?;
        for error in result.errors.iter() {
            log::debug!("recovered: {}", error);
        }
        Ok(result.document)
    }

    /// Parse the input, returning the document and recoverable diagnostics.
    ///
    /// Fails only on a missing book code, chapter number or verse number,
    /// or on any diagnostic when recovery is disabled.
    pub fn parse_with_recovery(&mut self, input: &str) -> Result<ParseResult, ParseError> {
        self.errors = ParseErrors::new();
        self.carryover = None;
        self.last_verse = None;
        self.poetry = PoeticCounts::default();

        log::debug!("parsing {} bytes", input.len());
        let mut scanner = Scanner::new(input);
        let book = self.parse_book(&mut scanner)?;
        let document = Document {
            book,
            span: Span::new(0, input.len() as u32),
        };
        log::debug!(
            "parsed book {:?}: {} nodes, {} diagnostics",
            document.code(),
            document.book.size(),
            self.errors.len()
        );

        Ok(ParseResult {
            document,
            errors: std::mem::take(&mut self.errors),
        })
    }

    /// Read a UTF-8 stream to the end and parse it.
    pub fn parse_reader<R: Read>(&mut self, mut reader: R) -> Result<Document, Error> {
        let mut input = String::new();
        reader.read_to_string(&mut input)?;
        Ok(self.parse(&input)?)
    }

    /// Record a recoverable diagnostic, or fail if recovery is off.
    #[inline]
    fn record_error(&mut self, error: ParseError) -> Result<(), ParseError> {
        if self.recover_on_error {
            self.errors.push(error);
            Ok(())
        } else {
            Err(error)
        }
    }

    fn parse_book(&mut self, scanner: &mut Scanner) -> Result<Node, ParseError> {
        let mut book = Node::new(NodeKind::Book, "", 0);

        loop {
            let next = scanner.scan_ignore_whitespace();
            let node = match next.token {
                Token::Eof => break,
                Token::Id => self.parse_id(scanner, next, &mut book)?,
                Token::Ide | Token::Imte | Token::Speaker => {
                    self.parse_words(scanner, next, NodeKind::Text)
                }
                Token::Heading => self.parse_words(scanner, next, NodeKind::Heading),
                Token::Description => self.parse_words(scanner, next, NodeKind::Description),
                Token::Chapter => self.parse_chapter(scanner, next)?,
                Token::Paragraph => self.parse_paragraph(scanner, next)?,
                Token::Section => self.parse_section(scanner, next),
                Token::Verse => self.parse_verse(scanner, next)?,
                Token::Poetry1 | Token::Poetry2 => match self.poetic_line(scanner, next) {
                    Some(line) => line,
                    None => continue,
                },
                _ => self.loose_node(next)?,
            };
            book.push(node);
        }

        Ok(book)
    }

    fn parse_id(
        &mut self,
        scanner: &mut Scanner,
        id: Scanned,
        book: &mut Node,
    ) -> Result<Node, ParseError> {
        let mut marker = Node::marker(id.literal, id.position());
        let code = scanner.scan_ignore_whitespace();
        if code.token != Token::Text || code.literal.chars().count() != 3 {
            return Err(ParseError::expected(
                ParseErrorKind::ExpectedBookCode,
                code.literal,
                Some(code.span),
            ));
        }

        book.value = code.literal.to_string();
        marker.push(Node::new(NodeKind::BookCode, code.literal, code.position()));
        self.push_words(scanner, &mut marker, NodeKind::Text);
        self.last_verse = None;
        log::debug!("book {} at byte {}", code.literal, id.position());
        Ok(marker)
    }

    /// A marker followed by a run of words, e.g. `\h Ruth` or `\ide UTF-8`.
    fn parse_words(&mut self, scanner: &mut Scanner, tok: Scanned, kind: NodeKind) -> Node {
        let mut marker = Node::marker(tok.literal, tok.position());
        self.push_words(scanner, &mut marker, kind);
        marker
    }

    fn push_words(&mut self, scanner: &mut Scanner, parent: &mut Node, kind: NodeKind) {
        loop {
            let next = scanner.scan_ignore_whitespace();
            match next.token {
                Token::Text | Token::Number => {
                    parent.push(Node::new(kind, next.literal, next.position()))
                }
                _ => {
                    scanner.pushback();
                    return;
                }
            }
        }
    }

    fn parse_chapter(&mut self, scanner: &mut Scanner, tok: Scanned) -> Result<Node, ParseError> {
        let mut marker = Node::marker(tok.literal, tok.position());
        let number = scanner.scan_ignore_whitespace();
        if number.token != Token::Number {
            return Err(ParseError::expected(
                ParseErrorKind::ExpectedChapterNumber,
                number.literal,
                Some(number.span),
            ));
        }

        marker.push(Node::new(
            NodeKind::ChapterNumber,
            number.literal,
            number.position(),
        ));
        self.last_verse = None;
        log::debug!("chapter {} at byte {}", number.literal, tok.position());
        Ok(marker)
    }

    /// Section heading; the title is kept as one raw text child.
    fn parse_section(&mut self, scanner: &mut Scanner, tok: Scanned) -> Node {
        let mut marker = Node::marker(tok.literal, tok.position());
        let mut title: Option<Span> = None;

        loop {
            let next = scanner.scan_ignore_whitespace();
            match next.token {
                Token::Text | Token::Number | Token::Citation => {
                    title = Some(title.map_or(next.span, |t| t.merge(next.span)));
                }
                _ => {
                    scanner.pushback();
                    break;
                }
            }
        }

        if let Some(span) = title {
            marker.push(Node::new(NodeKind::Text, scanner.slice(span), span.start));
        }
        marker
    }

    fn parse_paragraph(&mut self, scanner: &mut Scanner, tok: Scanned) -> Result<Node, ParseError> {
        let mut paragraph = Node::marker(tok.literal, tok.position());

        loop {
            let next = scanner.scan_ignore_whitespace();
            if next.token.ends_paragraph() {
                scanner.pushback();
                break;
            }

            match next.token {
                Token::Verse => paragraph.push(self.parse_verse(scanner, next)?),
                Token::Description => {
                    paragraph.push(self.parse_words(scanner, next, NodeKind::Description))
                }
                Token::Speaker => paragraph.push(self.parse_words(scanner, next, NodeKind::Text)),
                Token::Poetry1 | Token::Poetry2 => {
                    let Some(line) = self.poetic_line(scanner, next) else {
                        continue;
                    };
                    match self.continuation(line.position) {
                        Some(mut verse) => {
                            self.poetry.bump(next.token);
                            verse.push(line);
                            self.parse_verse_body(scanner, &mut verse)?;
                            paragraph.push(verse);
                        }
                        None => paragraph.push(line),
                    }
                }
                _ => match self.continuation(next.position()) {
                    Some(mut verse) => {
                        scanner.pushback();
                        self.parse_verse_body(scanner, &mut verse)?;
                        paragraph.push(verse);
                    }
                    None => paragraph.push(self.loose_node(next)?),
                },
            }
        }

        Ok(paragraph)
    }

    fn parse_verse(&mut self, scanner: &mut Scanner, tok: Scanned) -> Result<Node, ParseError> {
        let mut verse = Node::marker(tok.literal, tok.position());
        let number = scanner.scan_ignore_whitespace();
        if number.token != Token::Number {
            return Err(ParseError::expected(
                ParseErrorKind::ExpectedVerseNumber,
                number.literal,
                Some(number.span),
            ));
        }

        let literal = match bridge(scanner) {
            Some(rest) => format!("{}{}", number.literal, rest),
            None => number.literal.to_string(),
        };

        self.open_verse(&mut verse);
        verse.push(Node::new(NodeKind::VerseNumber, literal.as_str(), number.position()));
        self.last_verse = Some(literal);
        self.parse_verse_body(scanner, &mut verse)?;
        Ok(verse)
    }

    /// Synthesize a verse node for content resumed after a paragraph break.
    fn continuation(&mut self, position: u32) -> Option<Node> {
        let number = self.last_verse.clone()?;
        let mut verse = Node::marker("\\v", position);
        self.open_verse(&mut verse);
        log::debug!("verse {} continues at byte {}", number, position);
        verse.push(Node::new(NodeKind::VerseNumber, number, position));
        verse.push(Node::new(NodeKind::Subverse, "", position));
        Some(verse)
    }

    /// Reset per-verse state and move a pending poetic marker into `verse`.
    fn open_verse(&mut self, verse: &mut Node) {
        self.poetry = PoeticCounts::default();
        if let Some(line) = self.carryover.take() {
            if let Some(token) = line.token() {
                self.poetry.bump(token);
            }
            verse.push(line);
        }
    }

    fn parse_verse_body(&mut self, scanner: &mut Scanner, verse: &mut Node) -> Result<(), ParseError> {
        loop {
            let next = scanner.scan_ignore_whitespace();
            if next.token.ends_verse() {
                scanner.pushback();
                break;
            }

            match next.token {
                Token::Poetry1 | Token::Poetry2 => {
                    if let Some(line) = self.poetic_line(scanner, next) {
                        self.poetry.bump(next.token);
                        verse.push(line);
                    }
                }
                _ => verse.push(self.parse_inline(scanner, next, &[])?),
            }
        }

        log::trace!(
            "verse at byte {} closed with q1={} q2={}",
            verse.position,
            self.poetry.q1,
            self.poetry.q2
        );
        Ok(())
    }

    /// A `\q1`/`\q2` line marker.
    ///
    /// Returns `None` when the next token is `\v`: the marker then belongs
    /// to that verse and is held as carryover until it opens.
    fn poetic_line(&mut self, scanner: &mut Scanner, tok: Scanned) -> Option<Node> {
        let line = Node::marker(tok.literal, tok.position());
        let next = scanner.scan_ignore_whitespace();
        scanner.pushback();

        if next.token == Token::Verse {
            log::trace!("carrying {} at byte {} into next verse", tok.literal, tok.position());
            self.carryover = Some(line);
            None
        } else {
            Some(line)
        }
    }

    /// Parse one inline element. `open` lists the closers of enclosing
    /// character markers, innermost last.
    fn parse_inline(
        &mut self,
        scanner: &mut Scanner,
        tok: Scanned,
        open: &[Token],
    ) -> Result<Node, ParseError> {
        match tok.token {
            Token::Speaker => Ok(self.parse_words(scanner, tok, NodeKind::Text)),
            token => match token.closer() {
                Some(closer) => self.parse_paired(scanner, tok, closer, open),
                None => self.loose_node(tok),
            },
        }
    }

    fn parse_paired(
        &mut self,
        scanner: &mut Scanner,
        tok: Scanned,
        closer: Token,
        open: &[Token],
    ) -> Result<Node, ParseError> {
        let mut marker = Node::marker(tok.literal, tok.position());
        let is_note = matches!(tok.token, Token::Footnote | Token::CrossReference);
        let mut stack = open.to_vec();
        stack.push(closer);
        // poetic lines belong to the verse, never to a note
        let in_note = stack
            .iter()
            .any(|t| matches!(t, Token::FootnoteEnd | Token::CrossReferenceEnd));

        loop {
            let next = scanner.scan_ignore_whitespace();
            if next.token == closer {
                marker.push(Node::marker(next.literal, next.position()));
                break;
            }
            if next.token.ends_verse()
                || open.contains(&next.token)
                || (in_note && next.token.is_poetry())
            {
                scanner.pushback();
                self.record_error(ParseError::unclosed_marker(tok.literal, Some(tok.span)))?;
                break;
            }

            match next.token {
                t if is_note && t.is_note_part() => {
                    marker.push(self.parse_note_part(scanner, next, &stack)?)
                }
                Token::Poetry1 | Token::Poetry2 => {
                    if let Some(line) = self.poetic_line(scanner, next) {
                        self.poetry.bump(next.token);
                        marker.push(line);
                    }
                }
                _ => marker.push(self.parse_inline(scanner, next, &stack)?),
            }
        }

        Ok(marker)
    }

    /// `\fr`, `\ft`, `\xo` or `\xt` with the text that follows it.
    fn parse_note_part(
        &mut self,
        scanner: &mut Scanner,
        tok: Scanned,
        open: &[Token],
    ) -> Result<Node, ParseError> {
        let mut part = Node::marker(tok.literal, tok.position());

        loop {
            let next = scanner.scan_ignore_whitespace();
            match next.token {
                Token::Text | Token::Number | Token::Citation => {
                    part.push(self.loose_node(next)?)
                }
                token => match token.closer() {
                    Some(closer) => part.push(self.parse_paired(scanner, next, closer, open)?),
                    None => {
                        scanner.pushback();
                        break;
                    }
                },
            }
        }

        Ok(part)
    }

    /// A token with no structural role at this point in the tree.
    fn loose_node(&mut self, tok: Scanned) -> Result<Node, ParseError> {
        let node = match tok.token {
            Token::Text | Token::Number => Node::new(NodeKind::Text, tok.literal, tok.position()),
            Token::Citation => Node::new(NodeKind::Citation, tok.literal, tok.position()),
            Token::Illegal => {
                self.record_error(ParseError::unknown_marker(tok.literal, Some(tok.span)))?;
                Node::new(NodeKind::Illegal, tok.literal, tok.position())
            }
            _ => Node::marker(tok.literal, tok.position()),
        };
        Ok(node)
    }
}

/// The `-2` of a `\v 1-2` bridge, scanned right after the first number.
fn bridge<'a>(scanner: &mut Scanner<'a>) -> Option<&'a str> {
    let next = scanner.scan();
    let is_bridge = next.token == Token::Text
        && next
            .literal
            .strip_prefix('-')
            .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()));
    if is_bridge {
        Some(next.literal)
    } else {
        scanner.pushback();
        None
    }
}

/// Parse a USFM document with a default parser.
///
/// # Example
///
/// ```rust
/// let doc = usfm_core::parse(r"\id RUT T1 T2").unwrap();
/// assert_eq!(doc.code(), "RUT");
/// ```
pub fn parse(input: &str) -> Result<Document, ParseError> {
    Parser::new().parse(input)
}
