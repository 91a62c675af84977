//! Type definitions for the AI Business Analyst API
//!
//! This crate holds the shared contract between the backend and every client
//! component: REST request/response bodies, WebSocket frames, the five
//! pipeline layers and document descriptors. The backend owns these formats.
//! Optional fields default, status names accept aliases and unrecognized
//! frames decode to [`ServerMessage::Unknown`].
//!
//! ## Example
//!
//! ```rust
//! use analyst_types::{ClientMessage, Layer, ServerMessage};
//!
//! let frame = ServerMessage::parse(r#"{"type":"pong"}"#).unwrap();
//! assert_eq!(frame, ServerMessage::Pong);
//!
//! assert_eq!(Layer::from_number(3), Some(Layer::RagSearch));
//! assert_eq!(
//!     ClientMessage::Ping.to_text().unwrap(),
//!     r#"{"type":"ping"}"#
//! );
//! ```

pub mod api;
pub mod documents;
pub mod error;
pub mod layers;
pub mod socket;

pub use api::*;
pub use documents::*;
pub use error::*;
pub use layers::*;
pub use socket::*;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json;

    #[test]
    fn test_chat_request_omits_missing_session() {
        let request = ChatRequest::new("Hello", None);
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(json, r#"{"message":"Hello"}"#);
    }

    #[test]
    fn test_chat_response_from_backend() {
        let json = r#"{
            "response": "Document created",
            "session_id": "s1",
            "doc_type": "new_feature",
            "progress": 1.0,
            "document_ready": true,
            "document_path": "docs/s1__20240501_new_feature_limits.docx"
        }"#;
        let response: ChatResponse = serde_json::from_str(json).unwrap();
        assert!(response.document_ready);
        assert_eq!(response.doc_type, Some(DocType::Brd));
        assert!(response.layer.is_none());

        let frame = ResponseFrame::from(response);
        assert_eq!(frame.session_id.as_deref(), Some("s1"));
        assert_eq!(frame.content, "Document created");
    }

    #[test]
    fn test_session_info_without_doc_type() {
        let json = r#"{"session_id":"s1","status":"initializing","messages_count":2,"progress":0.0}"#;
        let info: SessionInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.status, "initializing");
        assert!(info.doc_type.is_none());
    }

    #[test]
    fn test_error_body_messages() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"detail":"Internal server error","message":"boom"}"#)
                .unwrap();
        assert_eq!(
            body.into_message().as_deref(),
            Some("Internal server error: boom")
        );

        let body: ErrorBody = serde_json::from_str(r#"{"detail":"Document not found"}"#).unwrap();
        assert_eq!(body.into_message().as_deref(), Some("Document not found"));
    }
}
