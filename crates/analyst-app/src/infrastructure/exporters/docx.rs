//! Word documents through `docx-rs`.

#[cfg(test)]
#[path = "docx_test.rs"]
mod tests;

use std::io::Cursor;

use anyhow::anyhow;
use anyhow::Result;
use docx_rs::AlignmentType;
use docx_rs::BreakType;
use docx_rs::Docx;
use docx_rs::Paragraph;
use docx_rs::Run;
use docx_rs::RunFonts;
use docx_rs::SpecialIndentType;
use docx_rs::Style;
use docx_rs::StyleType;
use docx_rs::Table;
use docx_rs::TableCell;
use docx_rs::TableRow;

use super::Block;
use super::Span;

const CODE_FONT: &str = "Courier New";

// Twentieths of a point.
const PAGE_WIDTH: u32 = 11906;
const PAGE_HEIGHT: u32 = 16838;
const LIST_INDENT: i32 = 360;

/// Bold paragraph styles by id, name and size in half-points.
const HEADING_STYLES: [(&str, &str, usize); 4] = [
    ("Title", "Title", 48),
    ("Heading1", "heading 1", 36),
    ("Heading2", "heading 2", 30),
    ("Heading3", "heading 3", 26),
];

fn code_fonts() -> RunFonts {
    return RunFonts::new().ascii(CODE_FONT).hi_ansi(CODE_FONT);
}

fn styles() -> Vec<Style> {
    let mut styles = HEADING_STYLES
        .iter()
        .map(|(id, name, size)| {
            return Style::new(*id, StyleType::Paragraph)
                .name(*name)
                .bold()
                .size(*size);
        })
        .collect::<Vec<_>>();
    styles.push(
        Style::new("Code", StyleType::Paragraph)
            .name("Code")
            .size(20)
            .fonts(code_fonts()),
    );
    return styles;
}

fn text_run(text: &str) -> Run {
    let mut run = Run::new();
    for (index, line) in text.split('\n').enumerate() {
        if index > 0 {
            run = run.add_break(BreakType::TextWrapping);
        }
        run = run.add_text(line);
    }
    return run;
}

fn span_run(span: &Span) -> Run {
    let mut run = text_run(&span.text);
    if span.bold {
        run = run.bold();
    }
    if span.italic {
        run = run.italic();
    }
    if span.code {
        run = run.fonts(code_fonts());
    }
    return run;
}

fn spans_paragraph(spans: &[Span]) -> Paragraph {
    return spans.iter().fold(Paragraph::new(), |paragraph, span| {
        return paragraph.add_run(span_run(span));
    });
}

fn table(rows: &[(&Vec<String>, bool)]) -> Table {
    let rows = rows
        .iter()
        .map(|(cells, header)| {
            let cells = cells
                .iter()
                .map(|cell| {
                    let mut run = text_run(cell);
                    if *header {
                        run = run.bold();
                    }
                    return TableCell::new().add_paragraph(Paragraph::new().add_run(run));
                })
                .collect();
            return TableRow::new(cells);
        })
        .collect();
    return Table::new(rows);
}

fn paragraph(block: &Block) -> Option<Paragraph> {
    return match block {
        Block::Heading { level, spans } => {
            Some(spans_paragraph(spans).style(&format!("Heading{level}")))
        }
        Block::Paragraph(spans) => Some(spans_paragraph(spans)),
        Block::ListItem { marker, depth, spans } => {
            let left = LIST_INDENT * (*depth as i32 + 2);
            let label = Run::new().add_text(format!("{} ", marker.label()));
            let paragraph = spans
                .iter()
                .fold(Paragraph::new().add_run(label), |paragraph, span| {
                    return paragraph.add_run(span_run(span));
                });
            Some(paragraph.indent(
                Some(left),
                Some(SpecialIndentType::Hanging(LIST_INDENT)),
                None,
                None,
            ))
        }
        Block::Code(code) => Some(
            Paragraph::new()
                .add_run(text_run(code))
                .style("Code"),
        ),
        Block::Rule => Some(
            Paragraph::new()
                .add_run(Run::new().add_text("* * *"))
                .align(AlignmentType::Center),
        ),
        Block::TableRow { .. } => None,
    };
}

/// Render blocks as a `.docx` package. Consecutive table rows become one table.
pub fn render(title: &str, blocks: &[Block]) -> Result<Vec<u8>> {
    let mut docx = styles()
        .into_iter()
        .fold(Docx::new().page_size(PAGE_WIDTH, PAGE_HEIGHT), |docx, style| {
            return docx.add_style(style);
        });

    if !title.trim().is_empty() {
        let run = Run::new().add_text(title.trim());
        docx = docx.add_paragraph(Paragraph::new().add_run(run).style("Title"));
    }

    let mut rows: Vec<(&Vec<String>, bool)> = vec![];
    for block in blocks {
        if let Block::TableRow { cells, header } = block {
            rows.push((cells, *header));
            continue;
        }
        if !rows.is_empty() {
            docx = docx.add_table(table(&rows));
            rows.clear();
        }
        if let Some(paragraph) = paragraph(block) {
            docx = docx.add_paragraph(paragraph);
        }
    }
    if !rows.is_empty() {
        docx = docx.add_table(table(&rows));
    }

    let mut buffer = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buffer)
        .map_err(|err| return anyhow!("failed to write docx: {err}"))?;
    return Ok(buffer.into_inner());
}
