//! Integration tests for the USFM scanner

use usfm_core::scanner::Scanner;
use usfm_core::span::Span;
use usfm_core::Token;

fn tokens(input: &str) -> Vec<(Token, &str)> {
    let mut scanner = Scanner::new(input);
    let mut out = Vec::new();
    loop {
        let scanned = scanner.scan_ignore_whitespace();
        if scanned.token == Token::Eof {
            return out;
        }
        out.push((scanned.token, scanned.literal));
    }
}

// ============================================================================
// Marker Tests
// ============================================================================

#[test]
fn test_scan_id_marker() {
    let mut scanner = Scanner::new(r"\id RUT");

    let id = scanner.scan();
    assert_eq!(id.token, Token::Id);
    assert_eq!(id.literal, r"\id");
    assert_eq!(id.span, Span::new(0, 3));

    assert_eq!(scanner.scan().token, Token::Whitespace);

    let code = scanner.scan();
    assert_eq!(code.token, Token::Text);
    assert_eq!(code.literal, "RUT");
    assert_eq!(code.position(), 4);
}

#[test]
fn test_scan_markers_case_insensitive() {
    assert_eq!(
        tokens(r"\V 1 \C 2 \Q1 \WJ"),
        vec![
            (Token::Verse, r"\V"),
            (Token::Number, "1"),
            (Token::Chapter, r"\C"),
            (Token::Number, "2"),
            (Token::Poetry1, r"\Q1"),
            (Token::JesusWords, r"\WJ"),
        ]
    );
}

#[test]
fn test_scan_paragraph_family() {
    let found: Vec<Token> = tokens("\\p \\m \\nb \u{b6}")
        .into_iter()
        .map(|(t, _)| t)
        .collect();
    assert_eq!(found, vec![Token::Paragraph; 4]);
}

#[test]
fn test_scan_pilcrow_span_is_bytes() {
    let mut scanner = Scanner::new("\u{b6} text");
    let pilcrow = scanner.scan();
    assert_eq!(pilcrow.token, Token::Paragraph);
    assert_eq!(pilcrow.span, Span::new(0, 2));
}

#[test]
fn test_scan_star_ends_marker() {
    assert_eq!(
        tokens(r"\w*grace"),
        vec![(Token::WordEnd, r"\w*"), (Token::Text, "grace")]
    );
}

#[test]
fn test_scan_marker_stops_at_backslash() {
    assert_eq!(
        tokens(r"\f\fr"),
        vec![(Token::Footnote, r"\f"), (Token::FootnoteReference, r"\fr")]
    );
}

#[test]
fn test_scan_nested_prefix() {
    assert_eq!(
        tokens(r"\+wj \+add*"),
        vec![(Token::JesusWords, r"\+wj"), (Token::AddedEnd, r"\+add*")]
    );
}

#[test]
fn test_scan_all_closers() {
    let found: Vec<Token> = tokens(r"\qs* \w* \wj* \add* \f* \x*")
        .into_iter()
        .map(|(t, _)| t)
        .collect();
    assert!(found.iter().all(|t| t.is_closer()));
    assert_eq!(found.len(), 6);
}

#[test]
fn test_scan_unknown_marker_is_illegal() {
    assert_eq!(tokens(r"\zz word"), vec![(Token::Illegal, r"\zz"), (Token::Text, "word")]);
}

#[test]
fn test_scan_overlong_marker_is_illegal() {
    assert_eq!(
        tokens(r"\abcdefgh"),
        vec![(Token::Illegal, r"\abcdefg"), (Token::Text, "h")]
    );
}

#[test]
fn test_scan_seven_character_marker_with_star() {
    // six name characters plus the star still fit
    assert_eq!(tokens(r"\abcdef*"), vec![(Token::Illegal, r"\abcdef*")]);
    assert_eq!(tokens(r"\imte1"), vec![(Token::Imte, r"\imte1")]);
}

// ============================================================================
// Text and Number Tests
// ============================================================================

#[test]
fn test_scan_number_then_punctuation() {
    assert_eq!(
        tokens("200,"),
        vec![(Token::Number, "200"), (Token::Text, ",")]
    );
}

#[test]
fn test_scan_ordinal_stays_text() {
    assert_eq!(tokens("8th day"), vec![(Token::Text, "8th"), (Token::Text, "day")]);
}

#[test]
fn test_scan_text_keeps_attached_punctuation() {
    assert_eq!(
        tokens("“Come,” (UTF-8)"),
        vec![(Token::Text, "“Come,”"), (Token::Text, "(UTF-8)")]
    );
}

#[test]
fn test_scan_ide_line() {
    assert_eq!(
        tokens(r"\ide 65001 - Unicode (UTF-8)"),
        vec![
            (Token::Ide, r"\ide"),
            (Token::Number, "65001"),
            (Token::Text, "-"),
            (Token::Text, "Unicode"),
            (Token::Text, "(UTF-8)"),
        ]
    );
}

#[test]
fn test_scan_multibyte_positions() {
    let mut scanner = Scanner::new(r"\v 1 “Naomi” went");
    let found: Vec<_> = std::iter::from_fn(|| {
        let s = scanner.scan_ignore_whitespace();
        (s.token != Token::Eof).then_some(s)
    })
    .collect();

    assert_eq!(found[2].literal, "“Naomi”");
    assert_eq!(found[2].span, Span::new(5, 16));
    assert_eq!(found[3].position(), 17);
}

#[test]
fn test_scan_citation_runs_to_next_marker() {
    assert_eq!(
        tokens(r#"\w grace|strong="H2580"\w*"#),
        vec![
            (Token::Word, r"\w"),
            (Token::Text, "grace"),
            (Token::Citation, r#"|strong="H2580""#),
            (Token::WordEnd, r"\w*"),
        ]
    );
}

#[test]
fn test_scan_citation_at_end_of_input() {
    assert_eq!(tokens("|lemma"), vec![(Token::Citation, "|lemma")]);
}

#[test]
fn test_scan_control_character_is_illegal() {
    let mut scanner = Scanner::new("\u{7}a");
    let bell = scanner.scan();
    assert_eq!(bell.token, Token::Illegal);
    assert_eq!(bell.span, Span::new(0, 1));
    assert_eq!(scanner.scan().literal, "a");
}

// ============================================================================
// Scanner Mechanics
// ============================================================================

#[test]
fn test_scan_whitespace_run_is_one_token() {
    let mut scanner = Scanner::new(" \n\t a");
    let ws = scanner.scan();
    assert_eq!(ws.token, Token::Whitespace);
    assert_eq!(ws.span, Span::new(0, 4));
}

#[test]
fn test_scan_eof_span() {
    let mut scanner = Scanner::new("abc");
    scanner.scan();
    let eof = scanner.scan();
    assert_eq!(eof.token, Token::Eof);
    assert_eq!(eof.span, Span::new(3, 3));
    assert_eq!(scanner.scan().token, Token::Eof);
}

#[test]
fn test_scan_empty_input() {
    let mut scanner = Scanner::new("");
    assert_eq!(scanner.scan().token, Token::Eof);
}

#[test]
fn test_pushback_returns_same_token() {
    let mut scanner = Scanner::new(r"\c 1");
    let first = scanner.scan();
    scanner.pushback();
    assert_eq!(scanner.scan(), first);
    assert_eq!(scanner.scan().token, Token::Whitespace);
    assert_eq!(scanner.scan().literal, "1");
}

#[test]
fn test_pushback_after_skipping_whitespace() {
    let mut scanner = Scanner::new(r"\c   1 \v");
    scanner.scan();
    let number = scanner.scan_ignore_whitespace();
    scanner.pushback();
    assert_eq!(scanner.scan_ignore_whitespace(), number);
    assert_eq!(scanner.scan_ignore_whitespace().token, Token::Verse);
}

#[test]
fn test_peek_does_not_consume() {
    let mut scanner = Scanner::new(r"\v 1");
    assert_eq!(scanner.peek(2), Some(r"\v"));
    assert_eq!(scanner.peek(10), None);

    scanner.scan();
    assert_eq!(scanner.offset(), 2);
    assert_eq!(scanner.peek(2), Some(" 1"));
    assert_eq!(scanner.offset(), 2);
}

#[test]
fn test_peek_off_char_boundary() {
    let scanner = Scanner::new("“a");
    assert_eq!(scanner.peek(1), None);
    assert_eq!(scanner.peek(3), Some("“"));
}

#[test]
fn test_positions_non_decreasing() {
    let input = r"\id GEN \c 1 \p \v 1 In the \wj beginning\wj* \f + \ft note\f*";
    let mut scanner = Scanner::new(input);
    let mut last = 0;
    loop {
        let scanned = scanner.scan();
        assert!(scanned.position() >= last);
        assert_eq!(scanner.slice(scanned.span), scanned.literal);
        last = scanned.position();
        if scanned.token == Token::Eof {
            break;
        }
    }
    assert_eq!(last as usize, input.len());
}
