//! Book/chapter/verse cursor shared by the index builder and the renderer.
//!
//! Both passes walk the same tree shape and ask the outline for a key each
//! time a structural unit opens, so a content item and the index entry for
//! the same unit always carry the same key.

use serde::{Deserialize, Serialize};

use crate::ast::{Node, NodeKind};
use crate::error::{ParseError, ParseErrors};
use crate::span::Span;

/// The kind of structural unit an index entry or content item stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Book,
    Chapter,
    Verse,
    Description,
}

/// A structural unit resolved by the outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    /// Key of the unit. Continuations and descriptions reuse the key of
    /// the unit they lie in.
    pub key: u32,
    /// Dotted reference such as `RUT.1.2`.
    pub reference: String,
    pub kind: EntryKind,
    /// Whether this unit allocated `key`.
    pub fresh: bool,
}

/// Key counter plus the book/chapter/verse context of a walk.
#[derive(Debug, Clone)]
pub struct Outline {
    key: u32,
    book: String,
    book_open: bool,
    chapter: u32,
    chapter_ref: String,
    verse: u32,
    /// Reference of the most recently keyed unit.
    current: String,
    warnings: ParseErrors,
}

impl Outline {
    /// Start a walk; the first unit gets `start_key + 1`.
    pub fn new(start_key: u32, book: &str) -> Self {
        Self {
            key: start_key,
            book: book.to_string(),
            book_open: false,
            chapter: 0,
            chapter_ref: String::new(),
            verse: 0,
            current: String::new(),
            warnings: ParseErrors::new(),
        }
    }

    /// The last key handed out.
    #[inline]
    pub fn key(&self) -> u32 {
        self.key
    }

    /// Reference of the most recently keyed unit.
    #[inline]
    pub fn reference(&self) -> &str {
        &self.current
    }

    /// Check if the book unit has been opened.
    #[inline]
    pub fn book_open(&self) -> bool {
        self.book_open
    }

    /// Open the book unit. Only the first call in a walk allocates a key.
    pub fn open_book(&mut self) -> Option<Unit> {
        if self.book_open {
            return None;
        }
        self.book_open = true;
        self.chapter = 0;
        self.chapter_ref.clear();
        self.verse = 0;
        let reference = self.book.clone();
        Some(self.allocate(EntryKind::Book, reference))
    }

    /// Open a chapter from a `\c` marker node.
    pub fn open_chapter(&mut self, marker: &Node) -> Unit {
        let number = self.resolve(marker, NodeKind::ChapterNumber, "chapter", self.chapter);
        self.chapter = number;
        self.verse = 0;
        self.chapter_ref = join(&self.book, number);
        let reference = self.chapter_ref.clone();
        let unit = self.allocate(EntryKind::Chapter, reference);
        log::debug!("chapter {} opens key {}", self.chapter_ref, unit.key);
        unit
    }

    /// Open a verse from a `\v` marker node.
    ///
    /// A synthesized continuation resolves to the key of the verse it
    /// continues and allocates nothing.
    pub fn open_verse(&mut self, marker: &Node) -> Unit {
        if marker.is_subverse() {
            return Unit {
                key: self.key,
                reference: self.current.clone(),
                kind: EntryKind::Verse,
                fresh: false,
            };
        }

        let number = self.resolve(marker, NodeKind::VerseNumber, "verse", self.verse);
        self.verse = bridge_end(marker).filter(|end| *end > number).unwrap_or(number);
        let parent = if self.chapter_ref.is_empty() {
            &self.book
        } else {
            &self.chapter_ref
        };
        let reference = join(parent, number);
        self.allocate(EntryKind::Verse, reference)
    }

    /// A description lying in the current unit.
    pub fn description(&self) -> Unit {
        Unit {
            key: self.key,
            reference: self.current.clone(),
            kind: EntryKind::Description,
            fresh: false,
        }
    }

    /// Take the numeric fallback diagnostics gathered so far.
    pub fn take_warnings(&mut self) -> ParseErrors {
        std::mem::take(&mut self.warnings)
    }

    /// Hand out the next key. Once the counter is exhausted the unit
    /// shares the last key and reference, like a continuation.
    fn allocate(&mut self, kind: EntryKind, reference: String) -> Unit {
        let Some(key) = self.key.checked_add(1) else {
            log::warn!("no key left for {} after {}", reference, self.key);
            self.warnings
                .push(ParseError::keys_exhausted(&reference, self.key));
            return Unit {
                key: self.key,
                reference: self.current.clone(),
                kind,
                fresh: false,
            };
        };
        self.key = key;
        self.current = reference.clone();
        Unit {
            key: self.key,
            reference,
            kind,
            fresh: true,
        }
    }

    /// Read the number child of `marker`, falling back to `previous + 1`.
    ///
    /// A verse bridge such as `1-2` resolves to its first number.
    fn resolve(&mut self, marker: &Node, kind: NodeKind, what: &str, previous: u32) -> u32 {
        let (literal, position) = match marker.child(kind) {
            Some(number) => (number.value.as_str(), number.position),
            None => ("", marker.position),
        };
        let first = literal.split_once('-').map_or(literal, |(first, _)| first);
        match first.parse::<u32>() {
            Ok(number) => number,
            Err(_) => {
                let fallback = previous.saturating_add(1);
                log::warn!(
                    "{} number {:?} at byte {} is not an integer, using {}",
                    what,
                    literal,
                    position,
                    fallback
                );
                self.warnings.push(ParseError::invalid_number(
                    what,
                    literal,
                    fallback,
                    Some(Span::at(position, literal.len() as u32)),
                ));
                fallback
            }
        }
    }
}

/// Last number of a `\v 1-2` bridge.
fn bridge_end(marker: &Node) -> Option<u32> {
    let number = marker.child(NodeKind::VerseNumber)?;
    let (_, last) = number.value.split_once('-')?;
    last.parse().ok()
}

fn join(parent: &str, number: u32) -> String {
    if parent.is_empty() {
        number.to_string()
    } else {
        format!("{}.{}", parent, number)
    }
}
