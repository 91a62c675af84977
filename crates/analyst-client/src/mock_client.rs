use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

use analyst_types::{
    AdminSessionInfo, ChatRequest, ChatResponse, CleanupResponse, DocType, DocumentInfo,
    DocumentPayload, HealthResponse, LayerStatus, ServiceInfo, SessionInfo, StatusResponse,
};

use crate::{ApiClient, ClientError, Result};

#[derive(Debug, Default)]
struct MockSession {
    turns: u32,
    doc_type: Option<DocType>,
    user_messages: Vec<String>,
    created_at: String,
}

#[derive(Debug, Clone)]
struct MockDocument {
    info: DocumentInfo,
    content: Vec<u8>,
}

#[derive(Debug, Default)]
struct MockState {
    sessions: HashMap<String, MockSession>,
    documents: Vec<MockDocument>,
}

/// Offline stand-in for the backend.
///
/// Each chat turn walks the session one step through the five layers; the
/// fifth turn produces a markdown document assembled from the user's messages.
pub struct MockApiClient {
    state: Mutex<MockState>,
    latency: Duration,
}

impl Default for MockApiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockApiClient {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState::default()),
            latency: Duration::ZERO,
        }
    }

    /// Delay every reply, to make loading states visible.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

fn classify(message: &str) -> DocType {
    let lowered = message.to_lowercase();
    if lowered.contains("bug") || lowered.contains("defect") {
        DocType::BugFix
    } else if lowered.contains("integrat") {
        DocType::Integration
    } else if lowered.contains("process") {
        DocType::ProcessChange
    } else if lowered.contains("report") || lowered.contains("data") {
        DocType::DataRequest
    } else {
        DocType::Brd
    }
}

fn intent_name(doc_type: DocType) -> &'static str {
    match doc_type {
        DocType::BugFix => "bug_fix",
        DocType::Integration => "integration",
        DocType::ProcessChange => "process_change",
        DocType::DataRequest => "data_request",
        _ => "new_feature",
    }
}

fn render_document(doc_type: DocType, messages: &[String]) -> String {
    let mut content = format!("# {}\n\n## Summary\n\n", doc_type.display_name());
    if let Some(first) = messages.first() {
        content.push_str(first);
        content.push_str("\n\n");
    }
    content.push_str("## Requirements\n\n");
    for (index, message) in messages.iter().enumerate().skip(1) {
        content.push_str(&format!("{}. {}\n", index, message));
    }
    content.push_str("\n## Acceptance criteria\n\n- All requirements above are implemented\n");
    content
}

#[async_trait]
impl ApiClient for MockApiClient {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn websocket_url(&self, _session_id: &str) -> Option<String> {
        None
    }

    async fn health_check(&self) -> Result<HealthResponse> {
        Ok(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Some(Utc::now().to_rfc3339()),
        })
    }

    async fn service_info(&self) -> Result<ServiceInfo> {
        Ok(ServiceInfo {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            llm_provider: "mock".to_string(),
            models: HashMap::from([
                ("router".to_string(), "mock-router".to_string()),
                ("assistant".to_string(), "mock-assistant".to_string()),
            ]),
        })
    }

    async fn send_chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        self.simulate_latency().await;

        let session_id = request
            .session_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let mut state = self.state.lock().await;
        let session = state
            .sessions
            .entry(session_id.clone())
            .or_insert_with(|| MockSession {
                created_at: Utc::now().to_rfc3339(),
                ..Default::default()
            });
        session.turns += 1;
        session.user_messages.push(request.message.clone());
        let turn = session.turns;
        let doc_type = *session.doc_type.get_or_insert_with(|| classify(&request.message));

        let mut response = ChatResponse {
            response: String::new(),
            session_id: session_id.clone(),
            doc_type: Some(doc_type),
            progress: (f64::from(turn) * 0.2).min(1.0),
            document_ready: false,
            document_path: None,
            layer: None,
            layer_status: None,
            layer_data: None,
            document: None,
        };

        match turn {
            1 => {
                response.response = format!(
                    "Understood: this calls for a {}. What problem should it solve?",
                    doc_type.display_name()
                );
                response.layer = Some(1);
                response.layer_status = Some(LayerStatus::Completed);
            }
            2 => {
                response.response =
                    "Who are the users, and what must they be able to do?".to_string();
                response.layer = Some(2);
                response.layer_status = Some(LayerStatus::Active);
            }
            3 => {
                response.response =
                    "Thanks, the requirements are clear. Searching related documentation."
                        .to_string();
                response.layer = Some(2);
                response.layer_status = Some(LayerStatus::Completed);
            }
            4 => {
                response.response =
                    "Found related material. Any constraints or deadlines?".to_string();
                response.layer = Some(3);
                response.layer_status = Some(LayerStatus::Completed);
                response.layer_data = Some(serde_json::json!({ "matches": 3 }));
            }
            5 => {
                let messages = session.user_messages.clone();
                let filename = format!(
                    "{}__{}_{}_mock_requirements.md",
                    session_id,
                    Utc::now().format("%Y%m%d_%H%M%S"),
                    intent_name(doc_type)
                );
                let path = format!("docs/{}", filename);
                let content = render_document(doc_type, &messages).into_bytes();
                let info = DocumentInfo {
                    filename: filename.clone(),
                    path: path.clone(),
                    created: Utc::now().to_rfc3339(),
                    size: content.len() as u64,
                    id: None,
                    doc_type: Some(doc_type),
                    title: Some(doc_type.display_name().to_string()),
                    session_id: Some(session_id.clone()),
                };
                state.documents.insert(
                    0,
                    MockDocument {
                        info: info.clone(),
                        content,
                    },
                );

                response.response = format!(
                    "{} created!\nFile: `{}`",
                    doc_type.display_name(),
                    path
                );
                response.layer = Some(4);
                response.layer_status = Some(LayerStatus::Completed);
                response.document_ready = true;
                response.document_path = Some(path);
                response.document = Some(DocumentPayload::from(info));
            }
            _ => {
                response.response =
                    "Quality check passed. Start a new session for another document.".to_string();
                response.layer = Some(5);
                response.layer_status = Some(LayerStatus::Completed);
                response.document_ready = true;
            }
        }

        tracing::debug!(session_id = %session_id, turn, "mock chat turn");
        Ok(response)
    }

    async fn session_info(&self, session_id: &str) -> Result<SessionInfo> {
        let state = self.state.lock().await;
        let info = match state.sessions.get(session_id) {
            Some(session) => SessionInfo {
                session_id: session_id.to_string(),
                status: "active".to_string(),
                doc_type: session.doc_type,
                messages_count: u64::from(session.turns) * 2,
                progress: (f64::from(session.turns) * 0.2).min(1.0),
                created_at: Some(session.created_at.clone()),
            },
            None => SessionInfo {
                session_id: session_id.to_string(),
                status: "no_session".to_string(),
                doc_type: None,
                messages_count: 0,
                progress: 0.0,
                created_at: None,
            },
        };
        Ok(info)
    }

    async fn reset_session(&self, session_id: &str) -> Result<StatusResponse> {
        self.state.lock().await.sessions.remove(session_id);
        Ok(StatusResponse {
            status: "ok".to_string(),
            message: Some("Session reset".to_string()),
            session_id: Some(session_id.to_string()),
        })
    }

    async fn list_documents(&self) -> Result<Vec<DocumentInfo>> {
        let state = self.state.lock().await;
        Ok(state.documents.iter().map(|doc| doc.info.clone()).collect())
    }

    async fn download_document(&self, filename: &str) -> Result<Vec<u8>> {
        self.simulate_latency().await;
        let state = self.state.lock().await;
        state
            .documents
            .iter()
            .find(|doc| doc.info.filename == filename)
            .map(|doc| doc.content.clone())
            .ok_or_else(|| ClientError::Api {
                status: 404,
                message: "Document not found".to_string(),
            })
    }

    async fn delete_document(&self, filename: &str) -> Result<StatusResponse> {
        let mut state = self.state.lock().await;
        let before = state.documents.len();
        state.documents.retain(|doc| doc.info.filename != filename);
        if state.documents.len() == before {
            return Err(ClientError::Api {
                status: 404,
                message: "Document not found".to_string(),
            });
        }
        Ok(StatusResponse {
            status: "ok".to_string(),
            message: Some(format!("Document {} deleted", filename)),
            session_id: None,
        })
    }

    async fn list_admin_sessions(&self) -> Result<Vec<AdminSessionInfo>> {
        let state = self.state.lock().await;
        let mut sessions: Vec<AdminSessionInfo> = state
            .sessions
            .iter()
            .map(|(id, session)| AdminSessionInfo {
                session_id: id.clone(),
                status: "active".to_string(),
                doc_type: session.doc_type,
                messages_count: u64::from(session.turns) * 2,
                progress: (f64::from(session.turns) * 0.2).min(1.0),
                created_at: Some(session.created_at.clone()),
                websocket_active: false,
            })
            .collect();
        sessions.sort_by(|a, b| a.session_id.cmp(&b.session_id));
        Ok(sessions)
    }

    async fn cleanup_sessions(&self) -> Result<CleanupResponse> {
        let mut state = self.state.lock().await;
        let before = state.sessions.len();
        state.sessions.retain(|_, session| session.turns > 0);
        Ok(CleanupResponse {
            status: "ok".to_string(),
            cleaned_sessions: (before - state.sessions.len()) as u64,
        })
    }
}
