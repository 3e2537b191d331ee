//! Integration tests for the content renderer

use pretty_assertions::assert_eq;
use serde_json::json;
use usfm_core::markup::{join_words, MarkupBuilder, Style};
use usfm_core::{build_index, parse, render, ContentItem, RenderOptions, VerseItem};

fn rendered(input: &str) -> Vec<ContentItem> {
    let doc = parse(input).unwrap();
    render(&doc, 0, &RenderOptions::default()).items
}

fn verses(items: &[ContentItem]) -> Vec<&VerseItem> {
    items
        .iter()
        .flat_map(|item| match item {
            ContentItem::Paragraph { verses, .. } => verses.iter().collect::<Vec<_>>(),
            ContentItem::Verse(verse) => vec![verse],
            _ => Vec::new(),
        })
        .collect()
}

fn verse_markup(input: &str) -> String {
    let items = rendered(input);
    verses(&items)[0].markup.clone()
}

// ============================================================================
// Structure Tests
// ============================================================================

#[test]
fn test_render_continuation_joins_verse_key() {
    let items = rendered(r"\c 1 \p \v 1 Hello \p world");

    assert_eq!(
        items,
        vec![
            ContentItem::Chapter {
                key: 1,
                reference: "1".to_string(),
                markup: r#"<h2 class="chapter">1</h2>"#.to_string(),
            },
            ContentItem::Paragraph {
                key: 2,
                reference: "1.1".to_string(),
                markup: r#"<p class="paragraph"><span class="verse"><sup class="verse-number">1</sup>Hello</span></p>"#.to_string(),
                verses: vec![VerseItem {
                    key: 2,
                    reference: "1.1".to_string(),
                    markup: r#"<span class="verse"><sup class="verse-number">1</sup>Hello</span>"#.to_string(),
                }],
            },
            ContentItem::Paragraph {
                key: 2,
                reference: "1.1".to_string(),
                markup: r#"<p class="paragraph"><span class="verse">world</span></p>"#.to_string(),
                verses: vec![VerseItem {
                    key: 2,
                    reference: "1.1".to_string(),
                    markup: r#"<span class="verse">world</span>"#.to_string(),
                }],
            },
        ]
    );
}

#[test]
fn test_render_book_uses_heading() {
    let items = rendered(r"\id RUT \h Ruth \c 1");
    assert_eq!(
        items[0],
        ContentItem::Book {
            key: 1,
            reference: "RUT".to_string(),
            markup: r#"<h1 class="book">Ruth</h1>"#.to_string(),
        }
    );
    assert_eq!(items[1].key(), 2);
    assert_eq!(items.len(), 2);
}

#[test]
fn test_render_book_without_heading_uses_code() {
    let items = rendered(r"\id RUT \c 1");
    assert_eq!(items[0].markup(), r#"<h1 class="book">RUT</h1>"#);
}

#[test]
fn test_render_heading_joins_words() {
    let items = rendered(r"\id SNG \h Song of Songs , etc");
    assert_eq!(items[0].markup(), r#"<h1 class="book">Song of Songs, etc</h1>"#);
}

#[test]
fn test_render_description() {
    let items = rendered(r"\id PSA \c 3 \d A Psalm of David. \q1 \v 1 Lord");
    assert_eq!(
        items[2],
        ContentItem::Description {
            key: 2,
            reference: "PSA.3".to_string(),
            markup: r#"<h3 class="description">A Psalm of David.</h3>"#.to_string(),
        }
    );
    assert_eq!(items[3].key(), 3);
}

#[test]
fn test_render_paragraph_joins_verses() {
    let items = rendered(r"\c 1 \p \v 1 a \v 2 b");
    assert_eq!(
        items[1].markup(),
        concat!(
            r#"<p class="paragraph">"#,
            r#"<span class="verse"><sup class="verse-number">1</sup>a</span> "#,
            r#"<span class="verse"><sup class="verse-number">2</sup>b</span>"#,
            "</p>"
        )
    );
}

#[test]
fn test_render_loose_paragraph_text() {
    let items = rendered(r"\c 1 \p loose words");
    assert_eq!(
        items[1],
        ContentItem::Paragraph {
            key: 1,
            reference: "1".to_string(),
            markup: r#"<p class="paragraph">loose words</p>"#.to_string(),
            verses: Vec::new(),
        }
    );
}

#[test]
fn test_render_top_level_verse() {
    let items = rendered(r"\id RUT AA \c 1 \v 1 Text");
    assert_eq!(
        items[2],
        ContentItem::Verse(VerseItem {
            key: 3,
            reference: "RUT.1.1".to_string(),
            markup: r#"<span class="verse"><sup class="verse-number">1</sup>Text</span>"#
                .to_string(),
        })
    );
}

#[test]
fn test_render_keys_match_index() {
    let input = r"\id PSA \h Psalms \c 3 \d A Psalm \q1 \v 1 Lord, \q2 how \p \q1 many \v 2 Many \c 4 \p \v 1 Answer";
    let doc = parse(input).unwrap();
    let indexed = build_index(&doc, 10, 0);
    let rendered = render(&doc, 10, &RenderOptions::default());

    assert_eq!(rendered.end_key, indexed.end_key);
    for verse in verses(&rendered.items) {
        let entry = indexed.index.get(verse.key).unwrap();
        assert_eq!(entry.reference, verse.reference);
    }
    for item in &rendered.items {
        assert!(indexed.index.get(item.key()).is_some());
    }
}

#[test]
fn test_render_stops_at_last_key() {
    let doc = parse(r"\id RUT \c 1 \p \v 1 a \v 2 b").unwrap();
    let rendered = render(&doc, u32::MAX - 1, &RenderOptions::default());

    assert_eq!(rendered.end_key, u32::MAX);
    assert_eq!(rendered.end_key, build_index(&doc, u32::MAX - 1, 0).end_key);
    assert!(rendered.items.iter().all(|item| item.key() == u32::MAX));
    let verses = verses(&rendered.items);
    assert_eq!(
        verses[1].markup,
        r#"<span class="verse"><sup class="verse-number">2</sup>b</span>"#
    );
}

// ============================================================================
// Verse Markup Tests
// ============================================================================

#[test]
fn test_render_spacing_rule() {
    assert_eq!(
        verse_markup(r"\c 1 \p \v 1 “Come , ” she said . (He went ) away!"),
        r#"<span class="verse"><sup class="verse-number">1</sup>“Come,” she said. (He went) away!</span>"#
    );
}

#[test]
fn test_render_poetry_levels() {
    assert_eq!(
        verse_markup(r"\c 1 \p \v 1 \q1 a \q2 b \q1 c"),
        concat!(
            r#"<span class="verse"><sup class="verse-number">1</sup>"#,
            r#"<span class="q1">a <span class="q2">b</span></span> "#,
            r#"<span class="q1">c</span></span>"#
        )
    );
}

#[test]
fn test_render_carried_poetry_opens_next_verse() {
    let items = rendered(r"\c 1 \p \v 1 a \q1 \v 2 b");
    let verses = verses(&items);
    assert_eq!(
        verses[0].markup,
        r#"<span class="verse"><sup class="verse-number">1</sup>a</span>"#
    );
    assert_eq!(
        verses[1].markup,
        r#"<span class="verse"><span class="q1"><sup class="verse-number">2</sup>b</span></span>"#
    );
}

#[test]
fn test_render_words_of_jesus_across_lines() {
    assert_eq!(
        verse_markup(r"\c 1 \p \v 1 \wj a \q1 b\wj* c"),
        concat!(
            r#"<span class="verse"><sup class="verse-number">1</sup>"#,
            r#"<span class="wj">a</span> <span class="q1"><span class="wj">b</span> c</span>"#,
            "</span>"
        )
    );
}

#[test]
fn test_render_added_and_selah() {
    assert_eq!(
        verse_markup(r"\c 1 \p \v 1 a \add b\add* \qs Selah.\qs*"),
        concat!(
            r#"<span class="verse"><sup class="verse-number">1</sup>"#,
            r#"a <span class="add">b</span> <span class="qs">Selah.</span>"#,
            "</span>"
        )
    );
}

#[test]
fn test_render_skips_notes_and_citations() {
    assert_eq!(
        verse_markup(r#"\c 1 \p \v 1 \w grace|strong="H2580"\w* a\f + \fr 1:1 \ft note\f* b \x - \xt Gen 1:1\x*"#),
        r#"<span class="verse"><sup class="verse-number">1</sup>grace a b</span>"#
    );
}

#[test]
fn test_render_straight_quotes() {
    assert_eq!(
        verse_markup(r#"\c 1 \p \v 1 he said "Hello" and 'bye'."#),
        r#"<span class="verse"><sup class="verse-number">1</sup>he said "Hello" and 'bye'.</span>"#
    );
}

#[test]
fn test_render_poetry_after_unclosed_note() {
    assert_eq!(
        verse_markup(r"\c 1 \p \v 1 a \f + \ft n \q1 b \v 2 c"),
        r#"<span class="verse"><sup class="verse-number">1</sup>a <span class="q1">b</span></span>"#
    );
}

#[test]
fn test_render_verse_bridge_badge() {
    let items = rendered(r"\c 1 \p \v 1-2 a \v 3 b");
    let verses = verses(&items);
    assert_eq!(
        verses[0].markup,
        r#"<span class="verse"><sup class="verse-number">1-2</sup>a</span>"#
    );
    assert_eq!(verses[0].reference, "1.1");
    assert_eq!(verses[1].reference, "1.3");
}

#[test]
fn test_render_skips_unknown_markers() {
    assert_eq!(
        verse_markup(r"\c 1 \p \v 1 a \zz b"),
        r#"<span class="verse"><sup class="verse-number">1</sup>a b</span>"#
    );
}

// ============================================================================
// Options Tests
// ============================================================================

#[test]
fn test_render_options_partial_override() {
    let options: RenderOptions =
        serde_json::from_value(json!({"verse_number": {"tag": "b"}, "verse": {"tag": "span", "class": "v"}}))
            .unwrap();
    assert_eq!(options.chapter, RenderOptions::default().chapter);

    let doc = parse(r"\v 3 a").unwrap();
    let items = render(&doc, 0, &options).items;
    assert_eq!(items[0].markup(), r#"<span class="v"><b>3</b>a</span>"#);
}

#[test]
fn test_content_item_json_is_tagged() {
    let items = rendered(r"\c 1 \v 1 a");
    assert_eq!(
        serde_json::to_value(&items).unwrap(),
        json!([
            {"type": "chapter", "key": 1, "reference": "1", "markup": "<h2 class=\"chapter\">1</h2>"},
            {"type": "verse", "key": 2, "reference": "1.1",
             "markup": "<span class=\"verse\"><sup class=\"verse-number\">1</sup>a</span>"}
        ])
    );
}

// ============================================================================
// Markup Builder Tests
// ============================================================================

#[test]
fn test_join_words_opening_punctuation() {
    assert_eq!(join_words(["“", "Hello", "”", ",", "she"]), "“Hello”, she");
    assert_eq!(join_words(["said", "(", "softly", ")"]), "said (softly)");
    assert_eq!(join_words(["¿", "Qué", "?"]), "¿Qué?");
}

#[test]
fn test_join_words_straight_quotes() {
    assert_eq!(
        join_words(["he", "said", "\"Hello,\"", "and", "'bye'."]),
        "he said \"Hello,\" and 'bye'."
    );
    assert_eq!(join_words(["\"Hello", "\"", "she", "said"]), "\"Hello\" she said");
    assert_eq!(join_words(["the", "kings", "'", "sons"]), "the kings' sons");
}

#[test]
fn test_builder_closes_everything_at_finish() {
    let options = RenderOptions::default();
    let mut markup = MarkupBuilder::new(&options);
    markup.line(1);
    markup.open(Style::JesusWords);
    markup.word("a");
    markup.line(2);
    assert_eq!(
        markup.finish(),
        r#"<span class="q1"><span class="wj">a</span><span class="q2"><span class="wj"></span></span></span>"#
    );
}

#[test]
fn test_builder_close_keeps_inner_styles() {
    let options = RenderOptions::default();
    let mut markup = MarkupBuilder::new(&options);
    markup.open(Style::Added);
    markup.open(Style::JesusWords);
    markup.word("a");
    markup.close(Style::Added);
    markup.word("b");
    assert_eq!(
        markup.finish(),
        r#"<span class="add"><span class="wj">a</span></span> <span class="wj">b</span>"#
    );
}
