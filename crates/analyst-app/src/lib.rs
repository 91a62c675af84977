//! Chat, layer and document state for the AI Business Analyst terminal client.
//!
//! The crate owns everything between the backend client and the terminal:
//! stores for messages, pipeline layers and generated documents, the services
//! that fold HTTP replies and socket frames into them, session files,
//! DOCX/PDF export, configuration and the line-oriented chat loop used by the
//! `analyst` binary.

pub mod application;
pub mod configuration;
pub mod domain;
pub mod infrastructure;
pub use application::repl::{Flow, Repl, ReplProps};
pub use configuration::{Config, ConfigKey};
pub use domain::models::{ChatMessage, Document, Event, Role, SlashCommand};
pub use domain::services::{
    AppState, ChatService, DocumentService, ExportFormat, ExportService, SessionService, Sessions,
};
