//! Request and response bodies of the REST API.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::documents::{DocType, DocumentPayload};
use crate::layers::LayerStatus;

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The user's message.
    pub message: String,
    /// Session to continue; the server allocates one when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>, session_id: Option<String>) -> Self {
        Self {
            message: message.into(),
            session_id,
        }
    }
}

/// Response of `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Assistant reply text (markdown).
    pub response: String,
    /// Session the reply belongs to.
    pub session_id: String,
    /// Document kind once the request has been classified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<DocType>,
    /// Document progress, 0.0 to 1.0.
    #[serde(default)]
    pub progress: f64,
    /// Whether a document has been produced.
    #[serde(default)]
    pub document_ready: bool,
    /// Server path of the produced document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_path: Option<String>,
    /// Layer the reply reports against, 1..=5.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<i64>,
    /// Status of `layer`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer_status: Option<LayerStatus>,
    /// Opaque payload for `layer`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer_data: Option<Value>,
    /// Structured document reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<DocumentPayload>,
}

/// Response of `GET /api/session/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session_id: String,
    /// `no_session`, `initializing` or `active`.
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<DocType>,
    #[serde(default)]
    pub messages_count: u64,
    #[serde(default)]
    pub progress: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Entry of `GET /api/admin/sessions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminSessionInfo {
    pub session_id: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<DocType>,
    #[serde(default)]
    pub messages_count: u64,
    #[serde(default)]
    pub progress: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default)]
    pub websocket_active: bool,
}

/// Response of `GET /health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Response of `GET /`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub status: String,
    pub version: String,
    pub llm_provider: String,
    #[serde(default)]
    pub models: HashMap<String, String>,
}

/// Generic `{status, message}` acknowledgement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Response of `POST /api/admin/cleanup`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanupResponse {
    pub status: String,
    pub cleaned_sessions: u64,
}

/// Error body returned by the backend on non-2xx responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    /// Pick the most specific message the backend provided.
    pub fn into_message(self) -> Option<String> {
        match (self.detail, self.message) {
            (Some(detail), Some(message)) if detail != message => {
                Some(format!("{}: {}", detail, message))
            }
            (Some(detail), _) => Some(detail),
            (None, message) => message,
        }
    }
}
