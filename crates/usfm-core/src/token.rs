//! Lexical token kinds.
//!
//! One variant per marker the parser understands, plus the handful of
//! non-marker classes the scanner produces (text, numbers, citations,
//! whitespace). Paired character markers have a separate closing variant
//! for their `*` form.

/// A lexical token kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    /// End of input.
    Eof,
    /// A run of whitespace.
    Whitespace,
    /// Unrecognised input (unknown marker or stray control character).
    Illegal,
    /// A run of numeric characters.
    Number,
    /// Free text, including attached punctuation.
    Text,
    /// `|` attribute run inside a word gloss (`\w grace|strong="H2580"\w*`).
    Citation,

    /// `\id`
    Id,
    /// `\ide`
    Ide,
    /// `\imte`, `\imte1`
    Imte,
    /// `\h`
    Heading,
    /// `\d`
    Description,
    /// `\c`
    Chapter,
    /// `\v`
    Verse,
    /// `\p`, `\m`, `\nb` and the pilcrow
    Paragraph,
    /// `\b`
    Break,
    /// `\s`, `\s1`
    Section,
    /// `\sp`
    Speaker,
    /// `\q1`
    Poetry1,
    /// `\q2`
    Poetry2,
    /// `\qs`
    Selah,
    /// `\qs*`
    SelahEnd,
    /// `\w`
    Word,
    /// `\w*`
    WordEnd,
    /// `\wj`
    JesusWords,
    /// `\wj*`
    JesusWordsEnd,
    /// `\add`
    Added,
    /// `\add*`
    AddedEnd,
    /// `\f`
    Footnote,
    /// `\f*`
    FootnoteEnd,
    /// `\fr`
    FootnoteReference,
    /// `\ft`
    FootnoteText,
    /// `\x`
    CrossReference,
    /// `\x*`
    CrossReferenceEnd,
    /// `\xo`
    CrossReferenceOrigin,
    /// `\xt`
    CrossReferenceText,
}

impl Token {
    /// Map a marker literal to its token.
    ///
    /// Matching is case-insensitive and ignores the `+` nesting prefix, so
    /// `\WJ` and `\+wj` both map to [`Token::JesusWords`]. Returns `None`
    /// for anything that is not a known marker.
    pub fn lookup(literal: &str) -> Option<Token> {
        if literal == "\u{b6}" {
            return Some(Token::Paragraph);
        }
        let name = literal.strip_prefix('\\')?;
        let name = name.strip_prefix('+').unwrap_or(name);
        let token = match name.to_ascii_uppercase().as_str() {
            "ID" => Token::Id,
            "IDE" => Token::Ide,
            "IMTE" | "IMTE1" => Token::Imte,
            "H" => Token::Heading,
            "D" => Token::Description,
            "C" => Token::Chapter,
            "V" => Token::Verse,
            "P" | "M" | "NB" => Token::Paragraph,
            "B" => Token::Break,
            "S" | "S1" => Token::Section,
            "SP" => Token::Speaker,
            "Q1" => Token::Poetry1,
            "Q2" => Token::Poetry2,
            "QS" => Token::Selah,
            "QS*" => Token::SelahEnd,
            "W" => Token::Word,
            "W*" => Token::WordEnd,
            "WJ" => Token::JesusWords,
            "WJ*" => Token::JesusWordsEnd,
            "ADD" => Token::Added,
            "ADD*" => Token::AddedEnd,
            "F" => Token::Footnote,
            "F*" => Token::FootnoteEnd,
            "FR" => Token::FootnoteReference,
            "FT" => Token::FootnoteText,
            "X" => Token::CrossReference,
            "X*" => Token::CrossReferenceEnd,
            "XO" => Token::CrossReferenceOrigin,
            "XT" => Token::CrossReferenceText,
            _ => return None,
        };
        Some(token)
    }

    /// The closing token for a paired character marker.
    pub fn closer(self) -> Option<Token> {
        match self {
            Token::Selah => Some(Token::SelahEnd),
            Token::Word => Some(Token::WordEnd),
            Token::JesusWords => Some(Token::JesusWordsEnd),
            Token::Added => Some(Token::AddedEnd),
            Token::Footnote => Some(Token::FootnoteEnd),
            Token::CrossReference => Some(Token::CrossReferenceEnd),
            _ => None,
        }
    }

    /// Check if this token closes a paired marker.
    pub fn is_closer(self) -> bool {
        matches!(
            self,
            Token::SelahEnd
                | Token::WordEnd
                | Token::JesusWordsEnd
                | Token::AddedEnd
                | Token::FootnoteEnd
                | Token::CrossReferenceEnd
        )
    }

    /// Check if this token is a poetic line marker.
    pub fn is_poetry(self) -> bool {
        matches!(self, Token::Poetry1 | Token::Poetry2)
    }

    /// Poetic indentation level for `\q1`/`\q2`.
    pub fn poetry_level(self) -> Option<u8> {
        match self {
            Token::Poetry1 => Some(1),
            Token::Poetry2 => Some(2),
            _ => None,
        }
    }

    /// Check if this token is a footnote or cross-reference sub-part.
    pub fn is_note_part(self) -> bool {
        matches!(
            self,
            Token::FootnoteReference
                | Token::FootnoteText
                | Token::CrossReferenceOrigin
                | Token::CrossReferenceText
        )
    }

    /// Markers that belong to the book header rather than running text.
    pub fn is_book_level(self) -> bool {
        matches!(self, Token::Id | Token::Ide | Token::Imte | Token::Heading)
    }

    /// Tokens that end an open verse body.
    pub fn ends_verse(self) -> bool {
        self.ends_paragraph()
            || matches!(self, Token::Verse | Token::Description)
    }

    /// Tokens that end an open paragraph.
    pub fn ends_paragraph(self) -> bool {
        self.is_book_level()
            || matches!(
                self,
                Token::Eof | Token::Chapter | Token::Paragraph | Token::Section
            )
    }
}
