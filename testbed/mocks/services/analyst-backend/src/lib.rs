//! Mock AI Business Analyst backend for tests and offline development
//!
//! Serves the same REST and WebSocket surface as the real service with a
//! scripted conversation: the request is classified on the first usable turn,
//! each turn asks a follow-up question, and after a configurable number of
//! turns a document is "generated" into an in-memory folder. Tests spawn it on
//! an ephemeral port with [`MockBackend::spawn`].

pub mod fixtures;
pub mod handlers;
pub mod server;

pub use fixtures::{
    classify_intent, BackendFixture, Behavior, StoredDocument, Turn, FAILURE_TRIGGER,
};
pub use server::{AppState, MockBackend, RunningBackend};

#[cfg(test)]
mod tests {
    use super::*;
    use analyst_types::{ChatResponse, DocType, DocumentInfo, SessionInfo};
    use serde_json::json;

    #[test]
    fn test_intent_classification() {
        assert_eq!(classify_intent("login page crashes with an error"), Some("bug_fix"));
        assert_eq!(classify_intent("integrate with the billing API"), Some("integration"));
        assert_eq!(classify_intent("add dark mode please"), Some("new_feature"));
        assert_eq!(classify_intent("hello"), None);
    }

    #[tokio::test]
    async fn test_document_after_five_turns() {
        let fixture = BackendFixture::default();
        let mut last = None;
        for turn in 1..=5 {
            let outcome = fixture
                .process_message("s1", &format!("add export to csv, detail {}", turn))
                .await
                .unwrap();
            if turn < 5 {
                assert!(!outcome.response.document_ready);
                assert!(outcome.response.progress < 1.0);
            }
            last = Some(outcome);
        }

        let last = last.unwrap();
        assert!(last.response.document_ready);
        assert_eq!(last.response.progress, 1.0);
        let path = last.response.document_path.unwrap();
        assert!(path.starts_with("docs/s1__"));
        assert!(path.contains("_new_feature_"));
        assert_eq!(last.response.doc_type, Some(DocType::Brd));
        assert_eq!(last.layer_updates.len(), 2);
        assert!(last.document.is_some());

        let documents = fixture.list_documents().await;
        assert_eq!(documents.len(), 1);
        assert!(documents[0].created_at().is_some());
    }

    #[tokio::test]
    async fn test_failure_trigger() {
        let fixture = BackendFixture::default();
        assert!(fixture
            .process_message("s1", &format!("please {}", FAILURE_TRIGGER))
            .await
            .is_err());
        assert_eq!(fixture.session_info("s1").await.status, "no_session");
    }

    #[tokio::test]
    async fn test_cleanup_keeps_sessions_with_sockets() {
        let fixture = BackendFixture::new(Behavior {
            idle_cutoff: std::time::Duration::ZERO,
            ..Behavior::default()
        });
        fixture.process_message("idle", "add a report").await.unwrap();
        fixture.socket_opened("live").await;

        assert_eq!(fixture.cleanup().await, 1);
        let sessions = fixture.admin_sessions().await;
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].session_id, "live");
        assert!(sessions[0].websocket_active);
    }

    #[tokio::test]
    async fn test_rest_surface() {
        let backend = MockBackend::new().spawn().await.unwrap();
        let client = reqwest::Client::new();
        let base = backend.http_url();

        let health: serde_json::Value = client
            .get(format!("{}/health", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health["status"], "healthy");

        let reply: ChatResponse = client
            .post(format!("{}/api/chat", base))
            .json(&json!({ "message": "build a sales report" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(!reply.session_id.is_empty());
        assert_eq!(reply.doc_type, Some(DocType::DataRequest));

        let info: SessionInfo = client
            .get(format!("{}/api/session/{}", base, reply.session_id))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(info.status, "active");
        assert_eq!(info.messages_count, 2);

        let failed = client
            .post(format!("{}/api/chat", base))
            .json(&json!({ "message": FAILURE_TRIGGER }))
            .send()
            .await
            .unwrap();
        assert_eq!(failed.status(), 500);

        let missing = client
            .get(format!("{}/api/documents/nope.docx", base))
            .send()
            .await
            .unwrap();
        assert_eq!(missing.status(), 404);

        let documents: Vec<DocumentInfo> = client
            .get(format!("{}/api/documents", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(documents.is_empty());

        backend.stop();
    }
}
