//! Markup fragments for rendered content.
//!
//! [`MarkupBuilder`] joins words with the spacing rule used for running
//! text and keeps a stack of open styles (poetic lines, words of Jesus,
//! translator additions, selah). Opening tags are written lazily, right
//! before the next word, so separating spaces stay outside of new spans.

use serde::{Deserialize, Serialize};

/// An element name and class used to wrap a fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wrapper {
    pub tag: String,
    #[serde(default)]
    pub class: String,
}

impl Wrapper {
    /// Create a wrapper.
    pub fn new(tag: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            class: class.into(),
        }
    }

    /// The opening tag.
    pub fn open(&self) -> String {
        if self.class.is_empty() {
            format!("<{}>", self.tag)
        } else {
            format!("<{} class=\"{}\">", self.tag, self.class)
        }
    }

    /// The closing tag.
    pub fn close(&self) -> String {
        format!("</{}>", self.tag)
    }

    /// Wrap `inner` in this element.
    pub fn wrap(&self, inner: &str) -> String {
        let mut out = self.open();
        out.push_str(inner);
        out.push_str(&self.close());
        out
    }
}

/// Wrappers used by the renderer.
///
/// Every field has a default, so a configuration file only needs to name
/// the wrappers it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    pub book: Wrapper,
    pub chapter: Wrapper,
    pub description: Wrapper,
    pub paragraph: Wrapper,
    pub verse: Wrapper,
    pub verse_number: Wrapper,
    pub poetry1: Wrapper,
    pub poetry2: Wrapper,
    pub jesus_words: Wrapper,
    pub added: Wrapper,
    pub selah: Wrapper,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            book: Wrapper::new("h1", "book"),
            chapter: Wrapper::new("h2", "chapter"),
            description: Wrapper::new("h3", "description"),
            paragraph: Wrapper::new("p", "paragraph"),
            verse: Wrapper::new("span", "verse"),
            verse_number: Wrapper::new("sup", "verse-number"),
            poetry1: Wrapper::new("span", "q1"),
            poetry2: Wrapper::new("span", "q2"),
            jesus_words: Wrapper::new("span", "wj"),
            added: Wrapper::new("span", "add"),
            selah: Wrapper::new("span", "qs"),
        }
    }
}

impl RenderOptions {
    fn wrapper(&self, style: Style) -> &Wrapper {
        match style {
            Style::Poetry(1) => &self.poetry1,
            Style::Poetry(_) => &self.poetry2,
            Style::JesusWords => &self.jesus_words,
            Style::Added => &self.added,
            Style::Selah => &self.selah,
        }
    }
}

/// A span style the builder can keep open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// Poetic line at the given indentation level.
    Poetry(u8),
    JesusWords,
    Added,
    Selah,
}

impl Style {
    #[inline]
    fn is_poetry(self) -> bool {
        matches!(self, Style::Poetry(_))
    }
}

/// Builds one markup fragment.
pub struct MarkupBuilder<'o> {
    options: &'o RenderOptions,
    out: String,
    /// Open styles, outermost first.
    stack: Vec<Style>,
    /// How many styles at the top of `stack` have not been written yet.
    pending: usize,
    /// Last character of text written, `None` at the start or after a badge.
    last: Option<char>,
}

impl<'o> MarkupBuilder<'o> {
    pub fn new(options: &'o RenderOptions) -> Self {
        Self {
            options,
            out: String::new(),
            stack: Vec::new(),
            pending: 0,
            last: None,
        }
    }

    /// Write a verse number badge. The next word gets no leading space.
    pub fn badge(&mut self, number: &str) {
        self.flush();
        self.out.push_str(&self.options.verse_number.wrap(number));
        self.last = None;
    }

    /// Append a word, inserting a separating space where needed.
    pub fn word(&mut self, word: &str) {
        if word.is_empty() {
            return;
        }
        if let Some(last) = self.last {
            if needs_space(last, word) {
                self.out.push(' ');
            }
        }
        self.flush();
        self.out.push_str(word);
        self.last = word.chars().last();
    }

    /// Start a poetic line at `level`.
    ///
    /// Closes open lines of the same or deeper level and any emphasis,
    /// opens the new line, then reopens the emphasis inside it. Lines
    /// always sit below emphasis on the stack.
    pub fn line(&mut self, level: u8) {
        let from = self
            .stack
            .iter()
            .position(|s| !matches!(s, Style::Poetry(l) if *l < level))
            .unwrap_or(self.stack.len());
        let closed = self.close_from(from);

        self.push(Style::Poetry(level));
        for style in closed.into_iter().filter(|s| !s.is_poetry()) {
            self.push(style);
        }
    }

    /// Open an emphasis style.
    pub fn open(&mut self, style: Style) {
        self.push(style);
    }

    /// Close the innermost open `style`, keeping styles opened after it.
    pub fn close(&mut self, style: Style) {
        let Some(at) = self.stack.iter().rposition(|s| *s == style) else {
            return;
        };
        let closed = self.close_from(at);
        for style in closed.into_iter().skip(1) {
            self.push(style);
        }
    }

    /// Close every open style and return the fragment.
    pub fn finish(mut self) -> String {
        self.close_from(0);
        self.out
    }

    #[inline]
    fn push(&mut self, style: Style) {
        self.stack.push(style);
        self.pending += 1;
    }

    /// Write opening tags that are still pending.
    fn flush(&mut self) {
        let written = self.stack.len() - self.pending;
        for style in &self.stack[written..] {
            self.out.push_str(&self.options.wrapper(*style).open());
        }
        self.pending = 0;
    }

    /// Close `stack[from..]`, innermost first, and return the closed styles
    /// outermost first.
    fn close_from(&mut self, from: usize) -> Vec<Style> {
        if from >= self.stack.len() {
            return Vec::new();
        }
        self.flush();
        let closed = self.stack.split_off(from);
        for style in closed.iter().rev() {
            self.out.push_str(&self.options.wrapper(*style).close());
        }
        closed
    }
}

/// Join `words` with the spacing rule, without any markup.
pub fn join_words<'a>(words: impl IntoIterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for word in words {
        if word.is_empty() {
            continue;
        }
        if out.chars().last().is_some_and(|last| needs_space(last, word)) {
            out.push(' ');
        }
        out.push_str(word);
    }
    out.trim().to_string()
}

/// Punctuation that opens a phrase and takes no space after it.
#[inline]
fn is_opening(c: char) -> bool {
    matches!(
        c,
        '“' | '‘' | '(' | '[' | '{' | '«' | '‹' | '¿' | '¡' | '„'
    )
}

/// Punctuation that attaches to the preceding word.
#[inline]
fn is_closing(c: char) -> bool {
    if is_opening(c) {
        return false;
    }
    c.is_ascii_punctuation()
        || matches!(
            c,
            '”' | '’' | '»' | '›' | '…' | '—' | '–' | '·' | '¶' | '§' | '、' | '。'
        )
}

/// Whether a space goes between text ending in `last` and `word`.
///
/// A straight quote opens when a letter or digit follows it in the same
/// word (`"Hello`), and closes otherwise.
pub fn needs_space(last: char, word: &str) -> bool {
    let mut chars = word.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if is_opening(last) {
        return false;
    }
    if matches!(first, '"' | '\'') {
        return chars.next().is_some_and(char::is_alphanumeric);
    }
    !is_closing(first)
}
