use super::parse;
use super::plain_text;
use super::Block;
use super::ListMarker;

#[test]
fn it_parses_headings_and_paragraphs() {
    let blocks = parse("# Title\n\nSome **bold** and *soft*\ntext.\n\n#### Deep\n");
    assert_eq!(blocks.len(), 3);
    match &blocks[0] {
        Block::Heading { level, spans } => {
            assert_eq!(*level, 1);
            assert_eq!(plain_text(spans), "Title");
        }
        other => panic!("unexpected block {:?}", other),
    }
    match &blocks[1] {
        Block::Paragraph(spans) => {
            assert_eq!(plain_text(spans), "Some bold and soft text.");
            assert!(spans.iter().any(|span| span.bold && span.text == "bold"));
            assert!(spans.iter().any(|span| span.italic && span.text == "soft"));
        }
        other => panic!("unexpected block {:?}", other),
    }
    assert!(matches!(&blocks[2], Block::Heading { level: 3, .. }));
}

#[test]
fn it_parses_lists() {
    let blocks = parse("1. first\n2. second\n   - nested\n\n- bullet\n");
    let items = blocks
        .iter()
        .map(|block| match block {
            Block::ListItem { marker, depth, spans } => (*marker, *depth, plain_text(spans)),
            other => panic!("unexpected block {:?}", other),
        })
        .collect::<Vec<_>>();

    assert_eq!(
        items,
        vec![
            (ListMarker::Number(1), 0, "first".to_string()),
            (ListMarker::Number(2), 0, "second".to_string()),
            (ListMarker::Bullet, 1, "nested".to_string()),
            (ListMarker::Bullet, 0, "bullet".to_string()),
        ]
    );
}

#[test]
fn it_parses_code_rules_and_tables() {
    let blocks = parse("```\nlet x = 1;\n```\n\n---\n\n| Name | Value |\n|---|---|\n| a | `1` |\n");
    assert_eq!(blocks[0], Block::Code("let x = 1;".to_string()));
    assert_eq!(blocks[1], Block::Rule);
    assert_eq!(
        blocks[2],
        Block::TableRow {
            cells: vec!["Name".to_string(), "Value".to_string()],
            header: true
        }
    );
    assert_eq!(
        blocks[3],
        Block::TableRow {
            cells: vec!["a".to_string(), "1".to_string()],
            header: false
        }
    );
}

#[test]
fn it_handles_empty_input() {
    assert!(parse("").is_empty());
}
