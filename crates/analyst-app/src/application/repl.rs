#[cfg(test)]
#[path = "repl_test.rs"]
mod tests;

use std::path::PathBuf;
use std::str::FromStr;

use analyst_client::ApiClientRef;
use analyst_client::SocketConfig;
use analyst_client::SocketEvent;
use anyhow::bail;
use anyhow::Result;
use tokio::sync::mpsc;
use yansi::Paint;

use super::render;
use crate::domain::models::Event;
use crate::domain::models::Role;
use crate::domain::models::SlashCommand;
use crate::domain::services::AppState;
use crate::domain::services::ChatService;
use crate::domain::services::DocumentService;
use crate::domain::services::ExportFormat;
use crate::domain::services::ExportService;
use crate::domain::services::SessionService;
use crate::domain::services::Sessions;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct ReplProps {
    pub api: ApiClientRef,
    pub data_dir: PathBuf,
    pub download_dir: PathBuf,
    pub export_dir: PathBuf,
    /// `None` keeps the chat on HTTP.
    pub socket_config: Option<SocketConfig>,
    /// Resume this session, or start it under this id.
    pub session_id: Option<String>,
}

/// The interactive chat loop, minus the terminal.
///
/// Input lines and socket events go in, printable blocks come out. The
/// binary owns stdin and multiplexes it with [`Repl::next_socket_event`].
pub struct Repl {
    pub state: AppState,
    chat: ChatService,
    documents: DocumentService,
    exports: ExportService,
    sessions: SessionService,
    download_dir: PathBuf,
    socket_config: Option<SocketConfig>,
    socket_events: Option<mpsc::UnboundedReceiver<SocketEvent>>,
}

fn error_line(message: &str) -> String {
    return Paint::red(message).to_string();
}

impl Repl {
    pub async fn new(props: ReplProps) -> Result<Repl> {
        let sessions = Sessions::new(&props.data_dir);

        let mut state = AppState::new(&Sessions::create_id());
        if let Some(session_id) = props.session_id.filter(|id| return !id.trim().is_empty()) {
            if sessions.exists(&session_id).await {
                state.load_session(sessions.load(&session_id).await?);
                tracing::info!(session_id = %session_id, "resumed session");
            } else {
                state.start_session(&session_id);
            }
        }

        return Ok(Repl {
            state,
            chat: ChatService::new(props.api.clone()),
            documents: DocumentService::new(props.api.clone()),
            exports: ExportService::new(&props.export_dir),
            sessions: SessionService::new(props.api, sessions),
            download_dir: props.download_dir,
            socket_config: props.socket_config,
            socket_events: None,
        });
    }

    /// Check the backend, open the socket and load the document list.
    pub async fn start(&mut self) -> Vec<String> {
        let mut lines = vec![format!(
            "{} Type /help for commands.",
            Paint::default("AI Business Analyst").bold()
        )];

        match self.chat.api().health_check().await {
            Ok(health) => {
                tracing::info!(
                    client = self.chat.api().name(),
                    status = %health.status,
                    "backend reachable"
                );
            }
            Err(err) => {
                tracing::warn!(error = %err, "health check failed");
                lines.push(error_line(&format!("Backend is not reachable: {err}")));
            }
        }

        lines.extend(self.connect_socket().await);

        if let Err(err) = self.documents.refresh(&mut self.state).await {
            tracing::warn!(error = %err, "could not load documents");
        }

        lines.push(format!("Session {}", self.state.session_id()));
        for message in self.state.chat.messages() {
            lines.push(render::render_message(message));
        }
        return lines;
    }

    async fn connect_socket(&mut self) -> Vec<String> {
        self.socket_events = None;
        let config = match &self.socket_config {
            Some(config) => config.clone(),
            None => return vec![],
        };

        match self.chat.connect_socket(&mut self.state, config).await {
            Ok(events) => {
                self.socket_events = events;
                return vec![];
            }
            Err(err) => {
                tracing::warn!(error = %err, "socket unavailable");
                return vec![error_line(&format!(
                    "Realtime connection unavailable, using HTTP: {err}"
                ))];
            }
        }
    }

    /// Wait for the next socket event. Never resolves without a socket.
    pub async fn next_socket_event(&mut self) -> Option<SocketEvent> {
        match self.socket_events.as_mut() {
            Some(events) => {
                let event = events.recv().await;
                if event.is_none() {
                    self.socket_events = None;
                }
                return event;
            }
            None => return std::future::pending().await,
        }
    }

    fn render_events(&self, events: &[Event]) -> Vec<String> {
        return events
            .iter()
            .filter_map(|event| return render::render_event(event, &self.state.layers))
            .collect();
    }

    pub fn handle_socket_event(&mut self, event: SocketEvent) -> Vec<String> {
        let events = self.chat.handle_socket_event(&mut self.state, event);
        return self.render_events(&events);
    }

    pub async fn handle_line(&mut self, line: &str) -> (Flow, Vec<String>) {
        if line.trim().is_empty() {
            return (Flow::Continue, vec![]);
        }

        let command = match SlashCommand::parse(line) {
            Some(command) => command,
            None => return (Flow::Continue, self.send(line).await),
        };

        match self.run_command(&command).await {
            Ok(result) => return result,
            Err(err) => {
                tracing::debug!(command = %command.command, error = %err, "command failed");
                return (Flow::Continue, vec![error_line(&err.to_string())]);
            }
        }
    }

    async fn send(&mut self, text: &str) -> Vec<String> {
        match self.chat.send_message(&mut self.state, text).await {
            Ok(events) => {
                // The input line already shows what the user typed.
                let events = events
                    .into_iter()
                    .skip_while(|event| {
                        return matches!(event, Event::MessageAdded(m) if m.role == Role::User);
                    })
                    .collect::<Vec<_>>();
                return self.render_events(&events);
            }
            Err(err) => match self.state.chat.last_message() {
                Some(message) if message.is_error() => return vec![render::render_message(message)],
                _ => return vec![error_line(&err.to_string())],
            },
        }
    }

    async fn run_command(&mut self, command: &SlashCommand) -> Result<(Flow, Vec<String>)> {
        if command.is_quit() {
            return Ok((Flow::Quit, vec![]));
        }
        if command.is_help() {
            return Ok((Flow::Continue, vec![render::help_text()]));
        }
        if command.is_about() {
            return Ok((Flow::Continue, vec![render::about_text()]));
        }
        if command.is_new() {
            self.sessions.save(&self.state).await?;
            let events = self.chat.new_session(&mut self.state).await?;
            let mut lines = self.render_events(&events);
            lines.extend(self.connect_socket().await);
            return Ok((Flow::Continue, lines));
        }
        if command.is_sessions() {
            let sessions = self.sessions.list().await?;
            return Ok((
                Flow::Continue,
                vec![render::render_sessions(&sessions, self.state.session_id())],
            ));
        }
        if command.is_switch() {
            return Ok((Flow::Continue, self.switch(command).await?));
        }
        if command.is_reset() {
            let events = self.sessions.reset_remote(&mut self.state).await?;
            let mut lines = vec!["Session reset.".to_string()];
            lines.extend(self.render_events(&events));
            return Ok((Flow::Continue, lines));
        }
        if command.is_layers() {
            let mut text = render::render_layers(&self.state.layers);
            if let Some(doc_type) = self.state.doc_type {
                text.push_str(&format!("\n  document type: {}", doc_type.display_name()));
            }
            return Ok((Flow::Continue, vec![text]));
        }
        if command.is_docs() {
            if let Err(err) = self.documents.refresh(&mut self.state).await {
                tracing::warn!(error = %err, "could not refresh documents");
            }
            return Ok((
                Flow::Continue,
                vec![render::render_documents(self.state.documents.list())],
            ));
        }
        if command.is_download() {
            let document = command
                .arg(0)
                .and_then(|reference| return self.state.documents.resolve(reference));
            let document = match document {
                Some(document) => document.clone(),
                None => bail!("Usage: /download [NUMBER], see /docs"),
            };
            let path = self.documents.download(&document, &self.download_dir).await?;
            return Ok((Flow::Continue, vec![format!("Saved {}", path.display())]));
        }
        if command.is_delete() {
            let reference = match command.arg(0) {
                Some(reference) => reference,
                None => bail!("Usage: /delete [NUMBER], see /docs"),
            };
            let document = self.documents.delete(&mut self.state, reference).await?;
            return Ok((Flow::Continue, vec![format!("Deleted {}", document.filename)]));
        }
        if command.is_export() {
            return Ok((Flow::Continue, vec![self.export(command).await?]));
        }
        if command.is_retry() {
            let events = self.chat.retry_last(&mut self.state).await?;
            return Ok((Flow::Continue, self.render_events(&events)));
        }

        bail!("Unknown command {}, try /help", command.command);
    }

    async fn switch(&mut self, command: &SlashCommand) -> Result<Vec<String>> {
        let id = match (command.number_arg(0), command.arg(0)) {
            (Some(number), _) => {
                let sessions = self.sessions.list().await?;
                match sessions.get(number - 1) {
                    Some(session) => session.id.to_string(),
                    None => bail!("No session number {number}, see /sessions"),
                }
            }
            (None, Some(id)) => id.to_string(),
            (None, None) => bail!("Usage: /switch [SESSION_ID or NUMBER]"),
        };
        if id == self.state.session_id() {
            bail!("Already in session {id}");
        }

        let events = self.sessions.switch(&mut self.state, &id).await?;
        let mut lines = self.render_events(&events);
        for message in self.state.chat.messages() {
            lines.push(render::render_message(message));
        }
        lines.extend(self.connect_socket().await);
        return Ok(lines);
    }

    async fn export(&mut self, command: &SlashCommand) -> Result<String> {
        let format = match command.arg(0) {
            Some(format) => match ExportFormat::from_str(format) {
                Ok(format) => format,
                Err(_) => bail!("Unknown export format {format}, use docx or pdf"),
            },
            None => ExportFormat::Docx,
        };

        let path = match command.arg(1) {
            Some("all") => self.exports.export_transcript(&self.state, format).await?,
            Some("doc") => {
                let document = command
                    .arg(2)
                    .and_then(|reference| return self.state.documents.resolve(reference));
                let document = match document {
                    Some(document) => document.clone(),
                    None => bail!("Usage: /export [docx|pdf] doc [NUMBER], see /docs"),
                };
                self.exports.export_document(&self.documents, &document, format).await?
            }
            Some(_) => match command.number_arg(1) {
                Some(number) => {
                    self.exports
                        .export_message(&self.state, Some(number), format)
                        .await?
                }
                None => bail!("Usage: /export [docx|pdf] [MESSAGE_NUMBER or all]"),
            },
            None => self.exports.export_message(&self.state, None, format).await?,
        };
        return Ok(format!("Exported {}", path.display()));
    }

    /// Save the session and close the socket.
    pub async fn shutdown(&mut self) -> Result<()> {
        if self.sessions.save(&self.state).await? {
            tracing::info!(session_id = self.state.session_id(), "session saved");
        }
        self.chat.disconnect_socket(&mut self.state).await?;
        return Ok(());
    }
}
