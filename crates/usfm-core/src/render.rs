//! Content rendering.
//!
//! Turns a parsed document into an ordered list of [`ContentItem`]s, one
//! per book, chapter, description and paragraph, each carrying a markup
//! fragment and the key of the unit it belongs to. Keys come from the same
//! [`Outline`] walk the index builder uses, so `item.key` can be looked up
//! directly in an [`Index`](crate::index::Index) built from the same
//! arguments.

use serde::Serialize;

use crate::ast::{Document, Node, NodeKind};
use crate::error::ParseErrors;
use crate::markup::{join_words, MarkupBuilder, RenderOptions, Style};
use crate::outline::Outline;
use crate::token::Token;

/// A rendered verse, or the part of one that resumes in a later paragraph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerseItem {
    pub key: u32,
    pub reference: String,
    pub markup: String,
}

/// One rendered structural unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentItem {
    Book {
        key: u32,
        reference: String,
        markup: String,
    },
    Chapter {
        key: u32,
        reference: String,
        markup: String,
    },
    Description {
        key: u32,
        reference: String,
        markup: String,
    },
    Paragraph {
        key: u32,
        reference: String,
        markup: String,
        verses: Vec<VerseItem>,
    },
    /// A verse outside of any paragraph.
    Verse(VerseItem),
}

impl ContentItem {
    /// The key this item belongs to.
    pub fn key(&self) -> u32 {
        match self {
            ContentItem::Book { key, .. }
            | ContentItem::Chapter { key, .. }
            | ContentItem::Description { key, .. }
            | ContentItem::Paragraph { key, .. } => *key,
            ContentItem::Verse(verse) => verse.key,
        }
    }

    /// The markup fragment of this item.
    pub fn markup(&self) -> &str {
        match self {
            ContentItem::Book { markup, .. }
            | ContentItem::Chapter { markup, .. }
            | ContentItem::Description { markup, .. }
            | ContentItem::Paragraph { markup, .. } => markup,
            ContentItem::Verse(verse) => &verse.markup,
        }
    }
}

/// Result of [`render`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub items: Vec<ContentItem>,
    /// Last key assigned; matches `end_key` of the index for the same input.
    pub end_key: u32,
    pub warnings: ParseErrors,
}

/// Render `document` with keys from `start_key + 1`.
pub fn render(document: &Document, start_key: u32, options: &RenderOptions) -> Rendered {
    let mut renderer = Renderer {
        options,
        outline: Outline::new(start_key, document.code()),
        items: Vec::new(),
        book_item: None,
    };

    for node in &document.book.children {
        renderer.top_level(node);
    }

    let end_key = renderer.outline.key();
    log::debug!(
        "rendered {} into {} items, last key {}",
        document.code(),
        renderer.items.len(),
        end_key
    );
    Rendered {
        warnings: renderer.outline.take_warnings(),
        items: renderer.items,
        end_key,
    }
}

struct Renderer<'o> {
    options: &'o RenderOptions,
    outline: Outline,
    items: Vec<ContentItem>,
    /// Position of the book item in `items`, for a later `\h` to fill in.
    book_item: Option<usize>,
}

impl Renderer<'_> {
    fn top_level(&mut self, node: &Node) {
        match node.token() {
            Some(Token::Id) if !self.outline.book_open() => {
                self.book(node.child(NodeKind::BookCode).map(|c| c.value.as_str()))
            }
            Some(Token::Heading) => {
                let heading = join_words(words(node));
                self.book(Some(&heading));
            }
            Some(Token::Chapter) => {
                let unit = self.outline.open_chapter(node);
                let number = node
                    .child(NodeKind::ChapterNumber)
                    .map_or("", |n| n.value.as_str());
                self.items.push(ContentItem::Chapter {
                    key: unit.key,
                    reference: unit.reference,
                    markup: self.options.chapter.wrap(number),
                });
            }
            Some(Token::Description) => {
                let item = self.description(node);
                self.items.push(item);
            }
            Some(Token::Paragraph) => self.paragraph(node),
            Some(Token::Verse) => {
                let verse = self.verse(node);
                self.items.push(ContentItem::Verse(verse));
            }
            _ => log::trace!("not rendered: {} at byte {}", node.value, node.position),
        }
    }

    /// Open or update the book item with `title`.
    fn book(&mut self, title: Option<&str>) {
        if let Some(unit) = self.outline.open_book() {
            self.book_item = Some(self.items.len());
            self.items.push(ContentItem::Book {
                markup: self.options.book.wrap(title.unwrap_or(&unit.reference)),
                key: unit.key,
                reference: unit.reference,
            });
            return;
        }

        let (Some(at), Some(title)) = (self.book_item, title) else {
            return;
        };
        if let Some(ContentItem::Book { markup, .. }) = self.items.get_mut(at) {
            *markup = self.options.book.wrap(title);
        }
    }

    fn description(&mut self, node: &Node) -> ContentItem {
        let unit = self.outline.description();
        ContentItem::Description {
            key: unit.key,
            reference: unit.reference,
            markup: self.options.description.wrap(&join_words(words(node))),
        }
    }

    fn paragraph(&mut self, node: &Node) {
        let mut verses = Vec::new();
        let mut descriptions = Vec::new();
        let mut loose = MarkupBuilder::new(self.options);
        let mut has_loose = false;

        for child in &node.children {
            match child.token() {
                Some(Token::Verse) => verses.push(self.verse(child)),
                Some(Token::Description) => descriptions.push(self.description(child)),
                _ if child.kind == NodeKind::Text => {
                    loose.word(&child.value);
                    has_loose = true;
                }
                _ => {}
            }
        }

        let mut fragments: Vec<String> = Vec::with_capacity(verses.len() + 1);
        if has_loose {
            fragments.push(loose.finish());
        }
        fragments.extend(verses.iter().map(|v| v.markup.clone()));

        let (key, reference) = match verses.first() {
            Some(first) => (first.key, first.reference.clone()),
            None => (self.outline.key(), self.outline.reference().to_string()),
        };
        self.items.push(ContentItem::Paragraph {
            key,
            reference,
            markup: self.options.paragraph.wrap(&fragments.join(" ")),
            verses,
        });
        self.items.extend(descriptions);
    }

    fn verse(&mut self, node: &Node) -> VerseItem {
        let unit = self.outline.open_verse(node);
        let mut markup = MarkupBuilder::new(self.options);
        // a carried poetic line precedes the number and opens around it
        let badge = !node.is_subverse();
        for child in &node.children {
            match child.kind {
                NodeKind::VerseNumber if badge => markup.badge(&child.value),
                _ => inline(&mut markup, child),
            }
        }

        VerseItem {
            key: unit.key,
            reference: unit.reference,
            markup: self.options.verse.wrap(&markup.finish()),
        }
    }
}

/// Render one verse child into `markup`.
fn inline(markup: &mut MarkupBuilder, node: &Node) {
    match node.kind {
        NodeKind::Text => markup.word(&node.value),
        NodeKind::Marker => match node.token() {
            Some(token @ (Token::Poetry1 | Token::Poetry2)) => {
                if let Some(level) = token.poetry_level() {
                    markup.line(level);
                }
            }
            Some(Token::JesusWords) => styled(markup, node, Style::JesusWords),
            Some(Token::Added) => styled(markup, node, Style::Added),
            Some(Token::Selah) => styled(markup, node, Style::Selah),
            Some(Token::Word) => {
                for child in &node.children {
                    inline(markup, child);
                }
            }
            // notes, speakers, breaks and closers contribute no text
            _ => {}
        },
        _ => {}
    }
}

fn styled(markup: &mut MarkupBuilder, node: &Node, style: Style) {
    markup.open(style);
    for child in &node.children {
        inline(markup, child);
    }
    markup.close(style);
}

/// Words under a heading or description marker.
fn words(node: &Node) -> impl Iterator<Item = &str> {
    node.children
        .iter()
        .filter(|c| {
            matches!(
                c.kind,
                NodeKind::Text | NodeKind::Heading | NodeKind::Description
            )
        })
        .map(|c| c.value.as_str())
}
