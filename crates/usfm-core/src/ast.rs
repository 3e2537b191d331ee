//! Syntax tree produced by the parser.
//!
//! The tree is deliberately uniform: every element is a [`Node`] with a
//! kind, a string value, the byte offset where it starts, and owned
//! children. Markers keep their literal (`\v`, `\wj`, `\f*`) as the value
//! so the tree can be walked, serialized and compared without a separate
//! type per marker.

use serde::{Deserialize, Serialize};

use crate::span::Span;
use crate::token::Token;

/// The role of a node in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Root of a document.
    Book,
    /// Any marker; the value holds its literal.
    Marker,
    /// A word or punctuation run.
    Text,
    /// Three letter book code following `\id`.
    BookCode,
    /// Word of a `\h` running heading.
    Heading,
    /// Word of a `\d` descriptive title.
    Description,
    /// Number following `\c`.
    ChapterNumber,
    /// Number following `\v`.
    VerseNumber,
    /// Tag on a verse synthesized for text resumed in a later paragraph.
    Subverse,
    /// `|` attribute run inside a word gloss.
    Citation,
    /// Unrecognised input kept for inspection.
    Illegal,
}

/// A tree element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Node role.
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Literal text, marker name or number.
    pub value: String,
    /// Byte offset where the node starts in the document.
    pub position: u32,
    /// Owned children in document order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

impl Node {
    /// Create a childless node.
    pub fn new(kind: NodeKind, value: impl Into<String>, position: u32) -> Self {
        Self {
            kind,
            value: value.into(),
            position,
            children: Vec::new(),
        }
    }

    /// Create a marker node.
    pub fn marker(literal: impl Into<String>, position: u32) -> Self {
        Self::new(NodeKind::Marker, literal, position)
    }

    /// Append a child.
    #[inline]
    pub fn push(&mut self, child: Node) {
        self.children.push(child);
    }

    /// The token a marker node stands for.
    ///
    /// Returns `None` for non-marker nodes and for generic markers whose
    /// literal is not recognised.
    pub fn token(&self) -> Option<Token> {
        match self.kind {
            NodeKind::Marker => Token::lookup(&self.value),
            _ => None,
        }
    }

    /// Check if this is a marker node for `token`.
    #[inline]
    pub fn is(&self, token: Token) -> bool {
        self.token() == Some(token)
    }

    /// First child of the given kind.
    pub fn child(&self, kind: NodeKind) -> Option<&Node> {
        self.children.iter().find(|c| c.kind == kind)
    }

    /// Check if this verse marker is a synthesized continuation.
    pub fn is_subverse(&self) -> bool {
        self.child(NodeKind::Subverse).is_some()
    }

    /// Count nodes in this subtree, including `self`.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(Node::size).sum::<usize>()
    }
}

/// A parsed USFM document.
///
/// Holds the tree together with the span of the whole input, which the
/// index builder needs to close the final byte range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Root node, always of kind [`NodeKind::Book`].
    pub book: Node,
    /// Source span covering the entire input.
    pub span: Span,
}

impl Document {
    /// The three letter book code, empty if `\id` was absent.
    pub fn code(&self) -> &str {
        &self.book.value
    }

    /// Length of the source text in bytes.
    pub fn len(&self) -> u32 {
        self.span.len()
    }

    /// Check if the source text was empty.
    pub fn is_empty(&self) -> bool {
        self.span.is_empty()
    }
}
