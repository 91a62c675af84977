use super::layout;
use super::render;
use super::sanitize;
use super::wrap;
use super::Font;
use super::Item;
use super::MARGIN;
use super::PAGE_HEIGHT;
use crate::infrastructure::exporters::parse;

fn texts(page: &[Item]) -> Vec<String> {
    return page
        .iter()
        .filter_map(|item| {
            return match item {
                Item::Text { text, .. } => Some(text.to_string()),
                Item::Rule { .. } => None,
            };
        })
        .collect();
}

#[test]
fn it_renders_a_pdf_document() {
    let pdf = render("Requirements", &parse("# Scope\n\nSome text.\n\n---\n\n- item")).unwrap();
    assert!(pdf.starts_with(b"%PDF-"));
    assert!(String::from_utf8_lossy(&pdf).contains("%%EOF"));
}

#[test]
fn it_lays_out_blocks_in_order() {
    let pages = layout("Requirements", &parse("# Scope\n\nSome text.\n\n---\n\n- item"));
    assert_eq!(pages.len(), 1);
    assert_eq!(
        texts(&pages[0]),
        vec!["Requirements", "Scope", "Some text.", "\u{2022} item"]
    );
    assert!(pages[0].iter().any(|item| return matches!(item, Item::Rule { .. })));

    match &pages[0][0] {
        Item::Text { font, y, .. } => {
            assert_eq!(*font, Font::Bold);
            assert!(*y < PAGE_HEIGHT - MARGIN);
        }
        other => panic!("unexpected item {:?}", other),
    }
}

#[test]
fn it_paginates_long_documents() {
    let markdown = (0..200)
        .map(|n| format!("Paragraph number {n} with some words to fill the line."))
        .collect::<Vec<_>>()
        .join("\n\n");
    let pages = layout("Long", &parse(&markdown));
    assert!(pages.len() > 1);

    for page in &pages {
        for item in page {
            if let Item::Text { y, .. } = item {
                assert!(*y >= MARGIN);
            }
        }
    }
    let last = texts(pages.last().unwrap());
    assert_eq!(
        last.last().unwrap(),
        "Paragraph number 199 with some words to fill the line."
    );

    let pdf = render("Long", &parse(&markdown)).unwrap();
    assert!(pdf.starts_with(b"%PDF-"));
}

#[test]
fn it_always_has_a_page() {
    let pages = layout("", &[]);
    assert_eq!(pages.len(), 1);
    assert!(pages[0].is_empty());
    assert!(render("", &[]).unwrap().starts_with(b"%PDF-"));
}

#[test]
fn it_replaces_unsupported_characters() {
    assert_eq!(sanitize("caf\u{e9} \u{65e5}\u{672c}"), "caf\u{e9} ??");
    assert_eq!(sanitize("\u{2022} a\tb"), "\u{2022} a    b");

    let pages = layout("", &parse("Price (\u{65e5}) caf\u{e9}"));
    assert_eq!(texts(&pages[0]), vec!["Price (?) caf\u{e9}"]);
}

#[test]
fn it_wraps_to_the_line_width() {
    let lines = wrap(&"word ".repeat(100), Font::Regular, 11.0, 200.0);
    assert!(lines.len() > 1);
    for line in &lines {
        assert!(Font::Regular.width(line, 11.0) <= 200.0);
    }

    let unbroken = "x".repeat(300);
    let lines = wrap(&unbroken, Font::Regular, 11.0, 100.0);
    assert!(lines.len() > 1);
    assert_eq!(lines.iter().map(|line| line.len()).sum::<usize>(), 300);
}

#[test]
fn it_keeps_code_spacing() {
    let pages = layout("", &parse("```\nlet  x = 1;\n\nend\n```"));
    assert_eq!(texts(&pages[0]), vec!["let  x = 1;", "", "end"]);
    for item in &pages[0] {
        if let Item::Text { font, .. } = item {
            assert_eq!(*font, Font::Mono);
        }
    }
}
