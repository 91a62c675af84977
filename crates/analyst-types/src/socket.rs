//! Frames exchanged over `/ws/chat/{session_id}`.
//!
//! Every frame is a JSON object whose `type` field names the event. The
//! socket manager dispatches on that name, so unknown names still reach
//! handlers registered for them; [`ServerMessage`] only types the frames the
//! client interprets.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::ChatResponse;
use crate::documents::{DocType, DocumentPayload};
use crate::error::{WireError, WireResult};
use crate::layers::LayerStatus;

/// Event name used when a frame carries no `type`.
pub const DEFAULT_EVENT_NAME: &str = "message";

/// Assistant reply pushed over the socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseFrame {
    /// Assistant reply text (markdown).
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<DocType>,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub document_ready: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer_status: Option<LayerStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer_data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<DocumentPayload>,
}

impl From<ChatResponse> for ResponseFrame {
    fn from(response: ChatResponse) -> Self {
        Self {
            content: response.response,
            session_id: Some(response.session_id),
            doc_type: response.doc_type,
            progress: response.progress,
            document_ready: response.document_ready,
            document_path: response.document_path,
            layer: response.layer,
            layer_status: response.layer_status,
            layer_data: response.layer_data,
            document: response.document,
        }
    }
}

/// Explicit layer transition pushed by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerUpdateFrame {
    pub layer: i64,
    #[serde(default)]
    pub status: LayerStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Frames sent by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Sent once after the socket is accepted.
    Connected {
        session_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// The assistant is working on a reply.
    Typing {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Assistant reply.
    Response(ResponseFrame),
    /// Processing failed server side.
    Error { message: String },
    /// Reply to a client `ping`.
    Pong,
    /// Layer transition.
    LayerUpdate(LayerUpdateFrame),
    /// Overall progress report.
    Progress {
        progress: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        layer: Option<i64>,
    },
    /// A document became available.
    DocumentReady { document: DocumentPayload },
    /// Any frame type the client does not interpret.
    #[serde(other)]
    Unknown,
}

impl ServerMessage {
    /// Decode a text frame.
    pub fn parse(text: &str) -> WireResult<ServerMessage> {
        let value: Value = serde_json::from_str(text)?;
        ServerMessage::from_value(value)
    }

    /// Decode an already parsed frame.
    pub fn from_value(value: Value) -> WireResult<ServerMessage> {
        if !value.is_object() {
            return Err(WireError::malformed("expected a JSON object frame"));
        }
        serde_json::from_value(value).map_err(|e| {
            WireError::serialization(format!("Failed to parse server frame: {}", e))
        })
    }

    /// Name used for handler dispatch; falls back to [`DEFAULT_EVENT_NAME`].
    pub fn event_name(value: &Value) -> &str {
        value
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_EVENT_NAME)
    }
}

/// Frames sent by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// A user chat message.
    Message { content: String },
    /// Keep-alive ping.
    Ping,
}

impl ClientMessage {
    pub fn message(content: impl Into<String>) -> Self {
        ClientMessage::Message {
            content: content.into(),
        }
    }

    /// Encode as a text frame.
    pub fn to_text(&self) -> WireResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}
