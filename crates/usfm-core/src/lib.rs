//! # USFM Core
//!
//! Scanner, parser, byte-range indexer and content renderer for USFM
//! scripture markup.
//!
//! A document is parsed into a uniform [`Node`] tree. Two passes turn the
//! tree into artifacts: [`build_index`] maps every book, chapter and verse
//! to a key and a contiguous byte range, and [`render()`] produces markup
//! fragments tagged with the same keys.
//!
//! ## Quick Start
//!
//! ```rust
//! use usfm_core::{build_index, render, Parser, RenderOptions};
//!
//! let input = r"\id RUT World English Bible \c 1 \p \v 1 In the days \v 2 The man";
//! let mut parser = Parser::new();
//! let doc = parser.parse(input).unwrap();
//!
//! let indexed = build_index(&doc, 0, 0);
//! println!("{} keys, last byte {}", indexed.end_key, indexed.end_byte);
//!
//! let rendered = render(&doc, 0, &RenderOptions::default());
//! assert_eq!(rendered.end_key, indexed.end_key);
//! ```
//!
//! ## Error Recovery
//!
//! Unknown markers and unclosed character markers do not stop the parse:
//!
//! ```rust
//! use usfm_core::Parser;
//!
//! let input = r"\id GEN \c 1 \p \v 1 In the \zz beginning \wj God";
//! let mut parser = Parser::new();
//! let result = parser.parse_with_recovery(input).unwrap();
//!
//! println!("Nodes: {}, Errors: {}", result.document.book.size(), result.errors.len());
//! ```
//!
//! ## Corpora
//!
//! Several documents share one key and byte space when the `end_key` and
//! `end_byte` of each pass are fed into the next. [`Index::append`]
//! accumulates them into a single index.

pub mod ast;
pub mod error;
pub mod index;
pub mod markup;
pub mod outline;
pub mod parser;
pub mod render;
pub mod scanner;
pub mod span;
pub mod token;

pub use ast::{Document, Node, NodeKind};
pub use error::{Error, ParseError, ParseErrorKind, ParseErrors};
pub use index::{build_index, Appended, Index, IndexEntry, Indexed, Translation};
pub use markup::{RenderOptions, Wrapper};
pub use outline::EntryKind;
pub use parser::{parse, ParseResult, Parser};
pub use render::{render, ContentItem, Rendered, VerseItem};
pub use token::Token;
