#[cfg(test)]
#[path = "markdown_test.rs"]
mod tests;

use pulldown_cmark::Event as MarkdownEvent;
use pulldown_cmark::Options;
use pulldown_cmark::Parser;
use pulldown_cmark::Tag;
use pulldown_cmark::TagEnd;

/// Deepest heading level kept; deeper headings are flattened to this.
pub const MAX_HEADING_LEVEL: u8 = 3;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub code: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListMarker {
    Bullet,
    Number(u64),
}

impl ListMarker {
    pub fn label(&self) -> String {
        return match self {
            ListMarker::Bullet => "\u{2022}".to_string(),
            ListMarker::Number(n) => format!("{n}."),
        };
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, spans: Vec<Span> },
    Paragraph(Vec<Span>),
    ListItem { marker: ListMarker, depth: usize, spans: Vec<Span> },
    Code(String),
    Rule,
    TableRow { cells: Vec<String>, header: bool },
}

pub fn plain_text(spans: &[Span]) -> String {
    return spans.iter().map(|span| return span.text.as_str()).collect();
}

#[derive(Default)]
struct Builder {
    blocks: Vec<Block>,
    spans: Vec<Span>,
    lists: Vec<Option<u64>>,
    item: Option<ListMarker>,
    heading: Option<u8>,
    code: Option<String>,
    row: Option<Vec<String>>,
    bold: u32,
    italic: u32,
}

impl Builder {
    fn push_text(&mut self, text: &str, code: bool) {
        if let Some(buffer) = self.code.as_mut() {
            buffer.push_str(text);
            return;
        }
        let span = Span {
            text: text.to_string(),
            bold: self.bold > 0,
            italic: self.italic > 0,
            code,
        };
        // The parser splits text at special characters; join the pieces.
        if let Some(last) = self.spans.last_mut() {
            if last.bold == span.bold && last.italic == span.italic && last.code == span.code {
                last.text.push_str(&span.text);
                return;
            }
        }
        self.spans.push(span);
    }

    fn take_spans(&mut self) -> Vec<Span> {
        return std::mem::take(&mut self.spans);
    }

    fn flush_item(&mut self) {
        if let Some(marker) = self.item.take() {
            let spans = self.take_spans();
            if !spans.is_empty() {
                self.blocks.push(Block::ListItem {
                    marker,
                    depth: self.lists.len().saturating_sub(1),
                    spans,
                });
            }
        }
    }

    fn start(&mut self, tag: Tag) {
        match tag {
            Tag::Heading { level, .. } => {
                self.heading = Some((level as u8).min(MAX_HEADING_LEVEL));
                self.spans.clear();
            }
            Tag::Paragraph => {
                if self.item.is_none() {
                    self.spans.clear();
                } else if !self.spans.is_empty() {
                    self.push_text(" ", false);
                }
            }
            Tag::List(start) => {
                self.flush_item();
                self.lists.push(start);
            }
            Tag::Item => {
                self.flush_item();
                let marker = match self.lists.last_mut() {
                    Some(Some(next)) => {
                        let marker = ListMarker::Number(*next);
                        *next += 1;
                        marker
                    }
                    _ => ListMarker::Bullet,
                };
                self.item = Some(marker);
            }
            Tag::CodeBlock(_) => {
                self.code = Some(String::new());
            }
            Tag::TableHead | Tag::TableRow => {
                self.row = Some(vec![]);
            }
            Tag::TableCell => {
                self.spans.clear();
            }
            Tag::Strong => self.bold += 1,
            Tag::Emphasis => self.italic += 1,
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Heading(_) => {
                let level = self.heading.take().unwrap_or(1);
                let spans = self.take_spans();
                self.blocks.push(Block::Heading { level, spans });
            }
            TagEnd::Paragraph => {
                if self.item.is_none() {
                    let spans = self.take_spans();
                    if !spans.is_empty() {
                        self.blocks.push(Block::Paragraph(spans));
                    }
                }
            }
            TagEnd::Item => self.flush_item(),
            TagEnd::List(_) => {
                self.flush_item();
                self.lists.pop();
            }
            TagEnd::CodeBlock => {
                if let Some(code) = self.code.take() {
                    self.blocks.push(Block::Code(code.trim_end_matches('\n').to_string()));
                }
            }
            TagEnd::TableCell => {
                let text = plain_text(&self.take_spans());
                if let Some(row) = self.row.as_mut() {
                    row.push(text.trim().to_string());
                }
            }
            TagEnd::TableHead | TagEnd::TableRow => {
                if let Some(cells) = self.row.take() {
                    self.blocks.push(Block::TableRow {
                        cells,
                        header: tag == TagEnd::TableHead,
                    });
                }
            }
            TagEnd::Strong => self.bold = self.bold.saturating_sub(1),
            TagEnd::Emphasis => self.italic = self.italic.saturating_sub(1),
            _ => {}
        }
    }
}

/// Parse markdown into the blocks the exporters understand. Inline HTML and
/// images are dropped; block quotes become plain paragraphs.
pub fn parse(markdown: &str) -> Vec<Block> {
    let mut builder = Builder::default();
    let options =
        Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    for event in Parser::new_ext(markdown, options) {
        match event {
            MarkdownEvent::Start(tag) => builder.start(tag),
            MarkdownEvent::End(tag) => builder.end(tag),
            MarkdownEvent::Text(text) => builder.push_text(&text, false),
            MarkdownEvent::Code(text) => builder.push_text(&text, true),
            MarkdownEvent::SoftBreak => builder.push_text(" ", false),
            MarkdownEvent::HardBreak => builder.push_text("\n", false),
            MarkdownEvent::Rule => builder.blocks.push(Block::Rule),
            MarkdownEvent::TaskListMarker(checked) => {
                builder.push_text(if checked { "[x] " } else { "[ ] " }, false);
            }
            _ => {}
        }
    }
    builder.flush_item();
    return builder.blocks;
}
