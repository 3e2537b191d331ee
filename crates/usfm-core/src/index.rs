//! Byte-range index over parsed documents.
//!
//! Every book, chapter and verse gets a key and a byte range in the text
//! stream. Ranges of consecutive keys are contiguous: an entry is closed
//! one byte before the next one starts, and the last entry of a pass is
//! closed at the end of the document. Documents of a corpus are chained by
//! passing the `(end_key, end_byte)` of one pass as the start of the next,
//! which lets several files be addressed as one concatenated stream.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ast::{Document, Node};
use crate::error::ParseErrors;
use crate::outline::{EntryKind, Outline, Unit};
use crate::token::Token;

/// One keyed byte range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    #[serde(rename = "id")]
    pub key: u32,
    /// Key of the owning unit; always equal to `key` for now.
    #[serde(rename = "rootID")]
    pub owner_key: u32,
    /// Dotted `BOOK.chapter.verse` reference.
    #[serde(rename = "osis")]
    pub reference: String,
    /// First byte of the unit, including the document bias.
    pub start: u64,
    /// Last byte of the unit; `0` until the entry is closed.
    pub end: u64,
    #[serde(rename = "type")]
    pub kind: EntryKind,
}

impl IndexEntry {
    fn open(unit: Unit, start: u64) -> Self {
        Self {
            key: unit.key,
            owner_key: unit.key,
            reference: unit.reference,
            start,
            end: 0,
            kind: unit.kind,
        }
    }
}

/// Translation metadata carried through the index untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Translation {
    pub short_code: String,
    pub name: String,
    pub revision: String,
    pub date_published: String,
}

/// Keyed entries for one or more documents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    pub translation: Translation,
    /// Entries by key.
    #[serde(rename = "index")]
    pub entries: BTreeMap<u32, IndexEntry>,
    /// `\d` ranges. Their key is that of the entry they lie in, so they
    /// are kept apart from `entries`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub descriptions: Vec<IndexEntry>,
}

/// Counters after appending one document to an [`Index`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Appended {
    /// Last key assigned; the start key for the next document.
    pub end_key: u32,
    /// Document length plus bias; the start byte for the next document.
    pub end_byte: u64,
    /// Numbers that fell back to the previous value plus one.
    pub warnings: ParseErrors,
}

/// Result of [`build_index`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indexed {
    pub index: Index,
    pub end_key: u32,
    pub end_byte: u64,
    pub warnings: ParseErrors,
}

impl Index {
    /// Create an empty index for a translation.
    pub fn new(translation: Translation) -> Self {
        Self {
            translation,
            ..Self::default()
        }
    }

    /// Number of keyed entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no entries have been added.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by key.
    pub fn get(&self, key: u32) -> Option<&IndexEntry> {
        self.entries.get(&key)
    }

    /// Find the keyed entry whose range contains `byte`.
    pub fn locate(&self, byte: u64) -> Option<&IndexEntry> {
        self.entries
            .values()
            .find(|e| e.start <= byte && byte <= e.end)
    }

    /// Index `document` with keys from `start_key + 1` and byte offsets
    /// shifted by `start_byte`.
    ///
    /// The first entry closes the entry with the previous key if this
    /// index holds one, so a corpus indexed document by document stays
    /// contiguous across file boundaries.
    pub fn append(&mut self, document: &Document, start_key: u32, start_byte: u64) -> Appended {
        let mut pass = Pass {
            index: self,
            outline: Outline::new(start_key, document.code()),
            bias: start_byte,
            open_descriptions: Vec::new(),
        };

        for node in &document.book.children {
            pass.top_level(node);
        }

        let end_byte = u64::from(document.len()).saturating_add(start_byte);
        let end_key = pass.outline.key();
        if end_key > start_key {
            if let Some(last) = pass.index.entries.get_mut(&end_key) {
                last.end = end_byte;
            }
        }
        pass.close_descriptions(end_byte);
        let warnings = pass.outline.take_warnings();

        log::debug!(
            "indexed {} keys {}..={}, bytes {}..{}",
            document.code(),
            start_key.saturating_add(1),
            end_key,
            start_byte,
            end_byte
        );
        Appended {
            end_key,
            end_byte,
            warnings,
        }
    }
}

/// Build a fresh index for one document.
///
/// # Example
///
/// ```rust
/// use usfm_core::{build_index, parse};
///
/// let doc = parse(r"\id RUT AA \c 1 \v 1 Text").unwrap();
/// let indexed = build_index(&doc, 5, 100);
/// assert_eq!(indexed.end_key, 8);
/// assert_eq!(indexed.index.get(8).unwrap().end, 125);
/// ```
pub fn build_index(document: &Document, start_key: u32, start_byte: u64) -> Indexed {
    let mut index = Index::default();
    let Appended {
        end_key,
        end_byte,
        warnings,
    } = index.append(document, start_key, start_byte);
    Indexed {
        index,
        end_key,
        end_byte,
        warnings,
    }
}

/// State of one [`Index::append`] walk.
struct Pass<'i> {
    index: &'i mut Index,
    outline: Outline,
    bias: u64,
    /// Positions in `index.descriptions` not yet closed.
    open_descriptions: Vec<usize>,
}

impl Pass<'_> {
    fn top_level(&mut self, node: &Node) {
        match node.token() {
            Some(Token::Id | Token::Heading) => {
                if let Some(unit) = self.outline.open_book() {
                    self.keyed(unit, node.position);
                }
            }
            Some(Token::Chapter) => {
                let unit = self.outline.open_chapter(node);
                self.keyed(unit, node.position);
            }
            Some(Token::Paragraph) => {
                for child in &node.children {
                    self.in_paragraph(child);
                }
            }
            _ => self.in_paragraph(node),
        }
    }

    fn in_paragraph(&mut self, node: &Node) {
        match node.token() {
            Some(Token::Verse) => {
                let unit = self.outline.open_verse(node);
                self.keyed(unit, node.position);
            }
            Some(Token::Description) => {
                let unit = self.outline.description();
                let start = self.offset(node.position);
                self.close_descriptions(start.saturating_sub(1));
                self.open_descriptions.push(self.index.descriptions.len());
                self.index.descriptions.push(IndexEntry::open(unit, start));
            }
            _ => {}
        }
    }

    /// Insert an entry for a unit that allocated its key. Continuations and
    /// units past the end of the key space extend the current entry.
    fn keyed(&mut self, unit: Unit, position: u32) {
        if unit.fresh {
            self.insert(unit, position);
        }
    }

    fn insert(&mut self, unit: Unit, position: u32) {
        let start = self.offset(position);
        let close = start.saturating_sub(1);
        if let Some(previous) = unit
            .key
            .checked_sub(1)
            .and_then(|key| self.index.entries.get_mut(&key))
        {
            previous.end = close;
        }
        self.close_descriptions(close);

        log::trace!("{:?} {} key {} at byte {}", unit.kind, unit.reference, unit.key, start);
        self.index.entries.insert(unit.key, IndexEntry::open(unit, start));
    }

    fn close_descriptions(&mut self, end: u64) {
        for at in self.open_descriptions.drain(..) {
            if let Some(entry) = self.index.descriptions.get_mut(at) {
                entry.end = end;
            }
        }
    }

    #[inline]
    fn offset(&self, position: u32) -> u64 {
        u64::from(position).saturating_add(self.bias)
    }
}
