#[cfg(test)]
#[path = "export_service_test.rs"]
mod tests;

use std::path::Path;
use std::path::PathBuf;

use anyhow::bail;
use anyhow::Context;
use anyhow::Result;
use chrono::Utc;
use strum_macros::Display;
use strum_macros::EnumString;
use tokio::fs;

use super::AppState;
use super::DocumentService;
use crate::domain::models::Document;
use crate::domain::models::Role;
use crate::infrastructure::exporters;

const MAX_FILENAME_CHARS: usize = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ExportFormat {
    Docx,
    Pdf,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        return match self {
            ExportFormat::Docx => "docx",
            ExportFormat::Pdf => "pdf",
        };
    }
}

/// Drop characters that are invalid in file names, turn spaces into
/// underscores, lowercase and cap the length.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned = name
        .trim()
        .chars()
        .filter(|c| return !matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*'))
        .filter(|c| return !c.is_control())
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .take(MAX_FILENAME_CHARS)
        .collect::<String>()
        .to_lowercase();

    if cleaned.trim_matches(|c| c == '_' || c == '.').is_empty() {
        return "document".to_string();
    }
    return cleaned;
}

/// First heading of a markdown text, if any.
fn first_heading(markdown: &str) -> Option<String> {
    return markdown
        .lines()
        .map(|line| line.trim())
        .find(|line| line.starts_with('#'))
        .map(|line| line.trim_start_matches('#').trim().to_string())
        .filter(|heading| !heading.is_empty());
}

/// Writes DOCX and PDF files into the export directory.
pub struct ExportService {
    dir: PathBuf,
}

impl ExportService {
    pub fn new(dir: &Path) -> ExportService {
        return ExportService {
            dir: dir.to_path_buf(),
        };
    }

    pub fn dir(&self) -> &Path {
        return &self.dir;
    }

    async fn write(&self, title: &str, format: ExportFormat, bytes: Vec<u8>) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;

        let filename = format!(
            "{}_{}.{}",
            sanitize_filename(title),
            Utc::now().format("%Y%m%d_%H%M%S"),
            format.extension()
        );
        let path = self.dir.join(filename);
        fs::write(&path, bytes).await?;

        tracing::info!(path = %path.display(), format = %format, "exported");
        return Ok(path);
    }

    pub async fn export_markdown(
        &self,
        title: &str,
        markdown: &str,
        format: ExportFormat,
    ) -> Result<PathBuf> {
        let blocks = exporters::parse(markdown);
        let bytes = match format {
            ExportFormat::Docx => exporters::render_docx(title, &blocks)?,
            ExportFormat::Pdf => exporters::render_pdf(title, &blocks)?,
        };
        return self.write(title, format, bytes).await;
    }

    /// Export an assistant message. `number` counts assistant messages from
    /// 1; `None` picks the latest.
    pub async fn export_message(
        &self,
        state: &AppState,
        number: Option<usize>,
        format: ExportFormat,
    ) -> Result<PathBuf> {
        let messages = state.chat.messages_by_role(Role::Assistant);
        let message = match number {
            Some(0) => None,
            Some(n) => messages.get(n - 1).copied(),
            None => messages.last().copied(),
        };
        let message = match message {
            Some(message) => message,
            None => bail!("No assistant message to export"),
        };

        let title = first_heading(&message.content)
            .unwrap_or_else(|| return "analyst_response".to_string());
        return self.export_markdown(&title, &message.content, format).await;
    }

    /// Export the whole conversation.
    pub async fn export_transcript(
        &self,
        state: &AppState,
        format: ExportFormat,
    ) -> Result<PathBuf> {
        if state.chat.message_count() == 0 {
            bail!("The conversation is empty");
        }

        let mut markdown = String::new();
        for message in state.chat.messages() {
            let speaker = match message.role {
                Role::User => "You",
                Role::Assistant => "Analyst",
                Role::System => "System",
            };
            markdown.push_str(&format!(
                "## {} ({})\n\n{}\n\n",
                speaker,
                message.timestamp.format("%Y-%m-%d %H:%M"),
                message.content
            ));
        }

        let title = format!("Conversation {}", state.session_id());
        return self.export_markdown(&title, &markdown, format).await;
    }

    /// Export a generated document. DOCX documents are copied as-is when
    /// DOCX is requested; anything else has to be markdown text.
    pub async fn export_document(
        &self,
        documents: &DocumentService,
        document: &Document,
        format: ExportFormat,
    ) -> Result<PathBuf> {
        let bytes = documents.fetch(document).await?;
        let title = document.display_title();
        let is_docx = document.filename.to_lowercase().ends_with(".docx");

        if is_docx && format == ExportFormat::Docx {
            return self.write(&title, format, bytes).await;
        }
        if is_docx {
            bail!("{} is a Word document; download it instead", document.filename);
        }

        let markdown = match String::from_utf8(bytes) {
            Ok(markdown) => markdown,
            Err(_) => bail!("{} is not a text document", document.filename),
        };
        return self.export_markdown(&title, &markdown, format).await;
    }
}
