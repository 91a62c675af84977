#[cfg(test)]
#[path = "render_test.rs"]
mod tests;

use analyst_types::LayerStatus;
use analyst_types::ServiceInfo;
use analyst_types::SessionInfo;
use analyst_types::LAYER_COUNT;
use yansi::Paint;

use crate::domain::models::ChatMessage;
use crate::domain::models::Document;
use crate::domain::models::Event;
use crate::domain::models::Role;
use crate::domain::models::SessionMeta;
use crate::domain::services::LayerStore;

const PROGRESS_BAR_WIDTH: usize = 20;

pub fn help_text() -> String {
    let text = r#"
COMMANDS:
- /new (/n) - Start a new session. The current one is saved.
- /sessions (/s) - List saved sessions.
- /switch [SESSION_ID or NUMBER] - Load a saved session.
- /reset - Clear the current session on the server and locally.
- /layers (/l) - Show pipeline progress.
- /docs (/d) - List generated documents.
- /download [NUMBER] - Save a document to the download directory.
- /delete [NUMBER] - Delete a document on the server.
- /export (/e) [docx|pdf] [MESSAGE_NUMBER or all] - Export the latest assistant
  message, a numbered one, or the whole conversation.
- /export (/e) [docx|pdf] doc [NUMBER] - Export a generated document.
- /retry (/r) - Resend your last message.
- /quit /exit (/q) - Save the session and exit.
- /help (/h) - Provides this help menu.
- /about - Displays information about analyst.

Anything that is not a command is sent to the analyst. Documents are numbered
as listed by /docs, newest first.
        "#;

    return text.trim().to_string();
}

pub fn about_text() -> String {
    let text = format!(
        r#"
analyst {} is a terminal client for the AI Business Analyst service. Describe
a feature, bug or integration and the analyst walks it through five layers
until a requirements document is ready.

License: MIT
"#,
        env!("CARGO_PKG_VERSION")
    );
    return text.trim().to_string();
}

fn status_symbol(status: LayerStatus) -> String {
    return match status {
        LayerStatus::Pending => Paint::default("·").dimmed().to_string(),
        LayerStatus::Active => Paint::yellow("▶").to_string(),
        LayerStatus::Completed => Paint::green("✓").to_string(),
        LayerStatus::Error => Paint::red("✗").to_string(),
    };
}

pub fn progress_bar(progress: f64) -> String {
    let progress = progress.clamp(0.0, 1.0);
    let filled = (progress * PROGRESS_BAR_WIDTH as f64).round() as usize;
    return format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        "-".repeat(PROGRESS_BAR_WIDTH - filled),
        (progress * 100.0).round() as u32
    );
}

pub fn render_layers(layers: &LayerStore) -> String {
    let mut lines = vec![format!(
        "{} {}",
        Paint::default("Layers").bold(),
        progress_bar(layers.progress())
    )];

    for entry in layers.layers() {
        let mut line = format!(
            "  {} {}. {}",
            status_symbol(entry.status),
            entry.number,
            entry.title()
        );
        if entry.number == layers.current_layer() && entry.status != LayerStatus::Completed {
            line.push_str(&Paint::yellow("  (current)").to_string());
        }
        if let Some(error) = &entry.error {
            line.push_str(&format!("  {}", Paint::red(error)));
        }
        lines.push(line);
    }
    return lines.join("\n");
}

/// One line summary, e.g. `Layer 3/5 RAG search [####----]  40%`.
pub fn render_layer_summary(layers: &LayerStore) -> String {
    return format!(
        "Layer {}/{} {} {}",
        layers.current_layer(),
        LAYER_COUNT,
        layers.current().title(),
        progress_bar(layers.progress())
    );
}

pub fn render_message(message: &ChatMessage) -> String {
    let time = message.timestamp.format("%H:%M");
    let header = match message.role {
        Role::User => Paint::cyan("You").bold().to_string(),
        Role::Assistant => Paint::green("Analyst").bold().to_string(),
        Role::System if message.is_error() => Paint::red("Error").bold().to_string(),
        Role::System => Paint::yellow("System").bold().to_string(),
    };

    let mut meta = vec![time.to_string()];
    if let Some(layer) = message.layer {
        meta.push(format!("layer {layer}"));
    }

    let mut text = format!(
        "{} {}\n{}",
        header,
        Paint::default(meta.join(", ")).dimmed(),
        message.content
    );
    if let Some(document) = &message.document {
        text.push_str(&format!("\n{} {}", Paint::default("Document:").bold(), document));
    }
    return text;
}

fn human_size(size: Option<u64>) -> String {
    return match size {
        None => "".to_string(),
        Some(bytes) if bytes < 1024 => format!("{bytes} B"),
        Some(bytes) if bytes < 1024 * 1024 => format!("{:.1} KB", bytes as f64 / 1024.0),
        Some(bytes) => format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0)),
    };
}

pub fn render_documents(documents: &[Document]) -> String {
    if documents.is_empty() {
        return "No documents yet.".to_string();
    }

    return documents
        .iter()
        .enumerate()
        .map(|(index, document)| {
            let mut details = vec![document.doc_type.display_name().to_string()];
            let size = human_size(document.size);
            if !size.is_empty() {
                details.push(size);
            }
            if let Some(created) = document.created_at {
                details.push(created.format("%Y-%m-%d %H:%M").to_string());
            }
            return format!(
                "{:>3}. {} ({})\n     {}",
                index + 1,
                Paint::default(document.display_title()).bold(),
                details.join(", "),
                Paint::default(&document.filename).dimmed()
            );
        })
        .collect::<Vec<_>>()
        .join("\n");
}

pub fn render_sessions(sessions: &[SessionMeta], current: &str) -> String {
    if sessions.is_empty() {
        return "No saved sessions.".to_string();
    }

    return sessions
        .iter()
        .enumerate()
        .map(|(index, session)| {
            let marker = if session.id == current { "*" } else { " " };
            return format!(
                "{}{:>3}. {} {}\n      {}",
                marker,
                index + 1,
                session.id,
                Paint::default(session.updated_at.format("%Y-%m-%d %H:%M")).dimmed(),
                session.preview
            );
        })
        .collect::<Vec<_>>()
        .join("\n");
}

pub fn render_session_info(info: &SessionInfo) -> String {
    let doc_type = info
        .doc_type
        .map(|doc_type| return doc_type.display_name().to_string())
        .unwrap_or_else(|| return "unclassified".to_string());
    return format!(
        "Session {}\n  status:   {}\n  type:     {}\n  messages: {}\n  progress: {}",
        info.session_id,
        info.status,
        doc_type,
        info.messages_count,
        progress_bar(info.progress)
    );
}

pub fn render_service_info(info: &ServiceInfo) -> String {
    let mut models = info
        .models
        .iter()
        .map(|(role, model)| return format!("  {role}: {model}"))
        .collect::<Vec<_>>();
    models.sort();
    return format!(
        "AI Business Analyst {} ({})\n  provider: {}\n{}",
        info.version,
        info.status,
        info.llm_provider,
        models.join("\n")
    );
}

/// Text to print for an event, if it warrants any.
pub fn render_event(event: &Event, layers: &LayerStore) -> Option<String> {
    return match event {
        Event::Connected(session_id) => Some(
            Paint::default(format!("Connected to session {session_id}"))
                .dimmed()
                .to_string(),
        ),
        Event::Disconnected => Some(Paint::yellow("Realtime connection closed.").to_string()),
        Event::Reconnecting { attempt, delay } => Some(
            Paint::yellow(format!(
                "Reconnecting (attempt {attempt}) in {:.1}s...",
                delay.as_secs_f64()
            ))
            .to_string(),
        ),
        Event::ReconnectFailed => None,
        Event::SessionChanged(session_id) => Some(
            Paint::default(format!("Session {session_id}"))
                .dimmed()
                .to_string(),
        ),
        Event::Typing => Some(Paint::default("Analyst is typing...").dimmed().to_string()),
        Event::MessageAdded(message) => Some(render_message(message)),
        Event::LayersChanged => Some(
            Paint::default(render_layer_summary(layers))
                .dimmed()
                .to_string(),
        ),
        Event::DocumentReady(document) => Some(format!(
            "{} {} ({})",
            Paint::green("Document ready:").bold(),
            document.display_title(),
            document.filename
        )),
    };
}
