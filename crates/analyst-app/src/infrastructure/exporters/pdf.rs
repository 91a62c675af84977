//! A4 PDF output through `printpdf` and the standard Type 1 fonts.
//!
//! Blocks are laid out into pages first, then drawn. Characters the
//! built-in fonts cannot show become `?`.

#[cfg(test)]
#[path = "pdf_test.rs"]
mod tests;

use anyhow::anyhow;
use anyhow::Result;
use printpdf::BuiltinFont;
use printpdf::IndirectFontRef;
use printpdf::Line as PdfLine;
use printpdf::Mm;
use printpdf::PdfDocument;
use printpdf::PdfLayerReference;
use printpdf::Point;

use super::plain_text;
use super::Block;

// Points.
const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 50.0;
const LINE_HEIGHT: f32 = 1.4;
const BLOCK_GAP: f32 = 6.0;
const LIST_INDENT: f32 = 15.0;

const BODY_SIZE: f32 = 11.0;
const CODE_SIZE: f32 = 9.5;
const TITLE_SIZE: f32 = 20.0;

const LAYER_NAME: &str = "Content";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Font {
    Regular,
    Bold,
    Mono,
}

impl Font {
    fn builtin(&self) -> BuiltinFont {
        return match self {
            Font::Regular => BuiltinFont::Helvetica,
            Font::Bold => BuiltinFont::HelveticaBold,
            Font::Mono => BuiltinFont::Courier,
        };
    }

    /// Average advance in em, used for wrapping. Courier is exact.
    fn em(&self) -> f32 {
        return match self {
            Font::Regular => 0.52,
            Font::Bold => 0.56,
            Font::Mono => 0.6,
        };
    }

    pub(crate) fn width(&self, text: &str, size: f32) -> f32 {
        return text.chars().count() as f32 * self.em() * size;
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Item {
    Text {
        text: String,
        font: Font,
        size: f32,
        x: f32,
        y: f32,
    },
    Rule {
        y: f32,
    },
}

enum Line {
    Text {
        text: String,
        font: Font,
        size: f32,
        indent: f32,
    },
    Rule,
    Gap(f32),
}

fn is_printable(c: char) -> bool {
    return matches!(
        c,
        '\u{20}'..='\u{7e}'
            | '\u{a0}'..='\u{ff}'
            | '\u{20ac}'
            | '\u{2026}'
            | '\u{2018}'
            | '\u{2019}'
            | '\u{201c}'
            | '\u{201d}'
            | '\u{2022}'
            | '\u{2013}'
            | '\u{2014}'
    );
}

pub(crate) fn sanitize(text: &str) -> String {
    return text
        .chars()
        .map(|c| {
            return match c {
                '\t' => "    ".to_string(),
                '\r' | '\n' => " ".to_string(),
                c if is_printable(c) => c.to_string(),
                _ => "?".to_string(),
            };
        })
        .collect();
}

/// Greedy word wrap. Words wider than a line are split.
pub(crate) fn wrap(text: &str, font: Font, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = vec![];
    let mut current = String::new();

    for word in text.split(' ').filter(|word| return !word.is_empty()) {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if font.width(&candidate, size) <= max_width {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        for c in word.chars() {
            current.push(c);
            if font.width(&current, size) > max_width && current.chars().count() > 1 {
                let last = current.pop().unwrap_or(' ');
                lines.push(std::mem::replace(&mut current, last.to_string()));
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    return lines;
}

fn push_wrapped(lines: &mut Vec<Line>, text: &str, font: Font, size: f32, indent: f32) {
    let max_width = PAGE_WIDTH - 2.0 * MARGIN - indent;
    for paragraph in text.split('\n') {
        for text in wrap(&sanitize(paragraph), font, size, max_width) {
            lines.push(Line::Text {
                text,
                font,
                size,
                indent,
            });
        }
    }
}

fn heading_size(level: u8) -> f32 {
    return match level {
        1 => 16.0,
        2 => 14.0,
        _ => 12.0,
    };
}

/// Code keeps its spacing, so it is cut by width rather than wrapped at words.
fn push_code(lines: &mut Vec<Line>, code: &str) {
    let max_width = PAGE_WIDTH - 2.0 * MARGIN - LIST_INDENT;
    let per_line = ((max_width / (Font::Mono.em() * CODE_SIZE)) as usize).max(1);
    for source in code.split('\n') {
        let chars = sanitize(source).chars().collect::<Vec<_>>();
        // Blank code lines still take up a line.
        let chunks: Vec<String> = if chars.is_empty() {
            vec![String::new()]
        } else {
            chars
                .chunks(per_line)
                .map(|chunk| return chunk.iter().collect())
                .collect()
        };
        for text in chunks {
            lines.push(Line::Text {
                text,
                font: Font::Mono,
                size: CODE_SIZE,
                indent: LIST_INDENT,
            });
        }
    }
}

fn lines(title: &str, blocks: &[Block]) -> Vec<Line> {
    let mut lines = vec![];
    if !title.trim().is_empty() {
        push_wrapped(&mut lines, title.trim(), Font::Bold, TITLE_SIZE, 0.0);
        lines.push(Line::Gap(BLOCK_GAP * 2.0));
    }

    for block in blocks {
        match block {
            Block::Heading { level, spans } => {
                lines.push(Line::Gap(BLOCK_GAP));
                let size = heading_size(*level);
                push_wrapped(&mut lines, &plain_text(spans), Font::Bold, size, 0.0);
            }
            Block::Paragraph(spans) => {
                push_wrapped(&mut lines, &plain_text(spans), Font::Regular, BODY_SIZE, 0.0);
            }
            Block::ListItem { marker, depth, spans } => {
                let text = format!("{} {}", marker.label(), plain_text(spans));
                let indent = LIST_INDENT * (*depth as f32 + 1.0);
                push_wrapped(&mut lines, &text, Font::Regular, BODY_SIZE, indent);
                continue;
            }
            Block::Code(code) => push_code(&mut lines, code),
            Block::Rule => lines.push(Line::Rule),
            Block::TableRow { cells, header } => {
                let font = if *header { Font::Bold } else { Font::Regular };
                push_wrapped(&mut lines, &cells.join("  |  "), font, BODY_SIZE, 0.0);
                continue;
            }
        }
        lines.push(Line::Gap(BLOCK_GAP));
    }
    return lines;
}

/// Place lines on pages, top to bottom. `y` is the baseline in points from
/// the bottom edge.
pub(crate) fn layout(title: &str, blocks: &[Block]) -> Vec<Vec<Item>> {
    let mut pages = vec![];
    let mut page = vec![];
    let mut y = PAGE_HEIGHT - MARGIN;

    for line in lines(title, blocks) {
        let height = match &line {
            Line::Text { size, .. } => size * LINE_HEIGHT,
            Line::Rule => BLOCK_GAP * 2.0,
            Line::Gap(gap) => *gap,
        };

        if y - height < MARGIN {
            pages.push(std::mem::take(&mut page));
            y = PAGE_HEIGHT - MARGIN;
            if let Line::Gap(_) = line {
                continue;
            }
        }
        y -= height;

        match line {
            Line::Text {
                text,
                font,
                size,
                indent,
            } => page.push(Item::Text {
                text,
                font,
                size,
                x: MARGIN + indent,
                y,
            }),
            Line::Rule => page.push(Item::Rule { y: y + BLOCK_GAP }),
            Line::Gap(_) => {}
        }
    }
    if !page.is_empty() || pages.is_empty() {
        pages.push(page);
    }
    return pages;
}

fn mm(points: f32) -> Mm {
    return Mm(points * 25.4 / 72.0);
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    mono: IndirectFontRef,
}

impl Fonts {
    fn get(&self, font: Font) -> &IndirectFontRef {
        return match font {
            Font::Regular => &self.regular,
            Font::Bold => &self.bold,
            Font::Mono => &self.mono,
        };
    }
}

fn draw(layer: &PdfLayerReference, fonts: &Fonts, items: &[Item]) {
    for item in items {
        match item {
            Item::Text {
                text,
                font,
                size,
                x,
                y,
            } => {
                if !text.is_empty() {
                    layer.use_text(text.as_str(), *size, mm(*x), mm(*y), fonts.get(*font));
                }
            }
            Item::Rule { y } => {
                layer.add_line(PdfLine {
                    points: vec![
                        (Point::new(mm(MARGIN), mm(*y)), false),
                        (Point::new(mm(PAGE_WIDTH - MARGIN), mm(*y)), false),
                    ],
                    is_closed: false,
                });
            }
        }
    }
}

/// Render blocks as a PDF document.
pub fn render(title: &str, blocks: &[Block]) -> Result<Vec<u8>> {
    let pages = layout(title, blocks);
    let (document, first_page, first_layer) = PdfDocument::new(
        sanitize(title.trim()),
        mm(PAGE_WIDTH),
        mm(PAGE_HEIGHT),
        LAYER_NAME,
    );

    let add_font = |font: Font| {
        return document
            .add_builtin_font(font.builtin())
            .map_err(|err| return anyhow!("failed to load {font:?} font: {err}"));
    };
    let fonts = Fonts {
        regular: add_font(Font::Regular)?,
        bold: add_font(Font::Bold)?,
        mono: add_font(Font::Mono)?,
    };

    for (index, items) in pages.iter().enumerate() {
        let (page, layer) = match index {
            0 => (first_page, first_layer),
            _ => document.add_page(mm(PAGE_WIDTH), mm(PAGE_HEIGHT), LAYER_NAME),
        };
        draw(&document.get_page(page).get_layer(layer), &fonts, items);
    }

    return document
        .save_to_bytes()
        .map_err(|err| return anyhow!("failed to write pdf: {err}"));
}
