use analyst_types::{
    AdminSessionInfo, ChatResponse, DocType, DocumentInfo, DocumentPayload, LayerStatus,
    LayerUpdateFrame, SessionInfo,
};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Duration;
use tokio::sync::Mutex;

/// Messages containing this marker make the turn fail server side.
pub const FAILURE_TRIGGER: &str = "__fail__";

/// Folder the mock pretends to store documents in.
pub const DOCS_DIR: &str = "docs";

/// Tunables for the scripted conversation.
#[derive(Debug, Clone)]
pub struct Behavior {
    /// User turns needed before a document is produced.
    pub turns_to_document: usize,
    /// Push `layer_update` and `document_ready` frames over the socket.
    pub layer_frames: bool,
    /// Sessions older than this are removed by the admin cleanup.
    pub idle_cutoff: Duration,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            turns_to_document: 5,
            layer_frames: false,
            idle_cutoff: Duration::from_secs(3600),
        }
    }
}

#[derive(Debug, Clone)]
struct BackendSession {
    user_messages: Vec<String>,
    intent: Option<&'static str>,
    created_at: DateTime<Utc>,
    document: Option<String>,
}

impl BackendSession {
    fn new() -> Self {
        Self {
            user_messages: Vec::new(),
            intent: None,
            created_at: Utc::now(),
            document: None,
        }
    }

    fn status(&self) -> &'static str {
        if self.intent.is_some() {
            "active"
        } else {
            "initializing"
        }
    }

    fn progress(&self) -> f64 {
        if self.document.is_some() {
            1.0
        } else {
            (self.user_messages.len() as f64 * 0.2).min(0.95)
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub created: DateTime<Utc>,
    pub session_id: Option<String>,
}

/// Outcome of one chat turn.
#[derive(Debug, Clone)]
pub struct Turn {
    pub response: ChatResponse,
    pub layer_updates: Vec<LayerUpdateFrame>,
    pub document: Option<DocumentPayload>,
}

/// In-memory state behind the mock backend.
pub struct BackendFixture {
    behavior: Behavior,
    sessions: Mutex<HashMap<String, BackendSession>>,
    documents: Mutex<BTreeMap<String, StoredDocument>>,
    active_sockets: Mutex<HashSet<String>>,
}

impl BackendFixture {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            sessions: Mutex::new(HashMap::new()),
            documents: Mutex::new(BTreeMap::new()),
            active_sockets: Mutex::new(HashSet::new()),
        }
    }

    pub fn behavior(&self) -> &Behavior {
        &self.behavior
    }

    /// Run one user turn against a session, creating it when needed.
    pub async fn process_message(&self, session_id: &str, message: &str) -> Result<Turn, String> {
        if message.contains(FAILURE_TRIGGER) {
            return Err("LLM provider unavailable".to_string());
        }

        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .entry(session_id.to_string())
            .or_insert_with(BackendSession::new);
        session.user_messages.push(message.to_string());
        if session.intent.is_none() {
            session.intent = classify_intent(message);
        }

        let turn = session.user_messages.len();
        let mut layer_updates = Vec::new();
        let mut document = None;
        let mut document_path = None;

        let reply = if session.document.is_some() {
            "The document is ready. Start a new session for another request.".to_string()
        } else if let Some(intent) = session
            .intent
            .filter(|_| turn >= self.behavior.turns_to_document)
        {
            let stored = render_document(session_id, intent, &session.user_messages);
            let path = format!("{}/{}", DOCS_DIR, stored.filename);
            let payload = DocumentPayload {
                id: None,
                filename: Some(stored.filename.clone()),
                path: Some(path.clone()),
                title: Some(title_from(&session.user_messages)),
                doc_type: Some(DocType::infer(intent)),
                session_id: Some(session_id.to_string()),
                size: Some(stored.bytes.len() as u64),
                created: Some(stored.created.to_rfc3339()),
            };
            session.document = Some(stored.filename.clone());
            self.documents
                .lock()
                .await
                .insert(stored.filename.clone(), stored);

            layer_updates.push(layer_update(4, LayerStatus::Completed));
            layer_updates.push(layer_update(5, LayerStatus::Completed));
            document = Some(payload);
            document_path = Some(path.clone());
            format!("Document created.\n\nFile: `{}`", path)
        } else {
            match turn {
                1 => layer_updates.push(layer_update(1, LayerStatus::Completed)),
                2 => layer_updates.push(layer_update(2, LayerStatus::Active)),
                3 => layer_updates.push(layer_update(2, LayerStatus::Completed)),
                _ => {
                    let mut update = layer_update(3, LayerStatus::Completed);
                    update.data = Some(json!({ "matches": turn - 3 }));
                    layer_updates.push(update);
                }
            }
            next_question(turn, session.intent)
        };

        let progress = session.progress();
        let response = ChatResponse {
            response: reply,
            session_id: session_id.to_string(),
            doc_type: session.intent.map(DocType::infer),
            progress,
            document_ready: progress >= 1.0,
            document_path,
            layer: None,
            layer_status: None,
            layer_data: None,
            document: None,
        };

        tracing::info!(session_id, turn, progress, "processed chat turn");
        Ok(Turn {
            response,
            layer_updates,
            document,
        })
    }

    pub async fn session_info(&self, session_id: &str) -> SessionInfo {
        let sessions = self.sessions.lock().await;
        match sessions.get(session_id) {
            Some(session) => SessionInfo {
                session_id: session_id.to_string(),
                status: session.status().to_string(),
                doc_type: session.intent.map(DocType::infer),
                messages_count: session.user_messages.len() as u64 * 2,
                progress: session.progress(),
                created_at: Some(session.created_at.to_rfc3339()),
            },
            None => SessionInfo {
                session_id: session_id.to_string(),
                status: "no_session".to_string(),
                doc_type: None,
                messages_count: 0,
                progress: 0.0,
                created_at: None,
            },
        }
    }

    pub async fn reset_session(&self, session_id: &str) {
        self.sessions.lock().await.remove(session_id);
    }

    pub async fn admin_sessions(&self) -> Vec<AdminSessionInfo> {
        let sessions = self.sessions.lock().await;
        let active = self.active_sockets.lock().await;
        let mut entries: Vec<AdminSessionInfo> = sessions
            .iter()
            .map(|(id, session)| AdminSessionInfo {
                session_id: id.clone(),
                status: session.status().to_string(),
                doc_type: session.intent.map(DocType::infer),
                messages_count: session.user_messages.len() as u64 * 2,
                progress: session.progress(),
                created_at: Some(session.created_at.to_rfc3339()),
                websocket_active: active.contains(id),
            })
            .collect();
        entries.sort_by(|a, b| a.session_id.cmp(&b.session_id));
        entries
    }

    /// Drop sessions past the idle cutoff that have no open socket.
    pub async fn cleanup(&self) -> u64 {
        let cutoff = chrono::Duration::from_std(self.behavior.idle_cutoff)
            .unwrap_or_else(|_| chrono::Duration::hours(1));
        let now = Utc::now();
        let mut sessions = self.sessions.lock().await;
        let active = self.active_sockets.lock().await;
        let before = sessions.len();
        sessions.retain(|id, session| active.contains(id) || now - session.created_at < cutoff);
        (before - sessions.len()) as u64
    }

    /// Documents, newest first.
    pub async fn list_documents(&self) -> Vec<DocumentInfo> {
        let documents = self.documents.lock().await;
        let mut entries: Vec<&StoredDocument> = documents.values().collect();
        entries.sort_by(|a, b| b.created.cmp(&a.created));
        entries
            .into_iter()
            .map(|document| DocumentInfo {
                filename: document.filename.clone(),
                path: format!("{}/{}", DOCS_DIR, document.filename),
                created: document.created.naive_utc().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
                size: document.bytes.len() as u64,
                id: None,
                doc_type: None,
                title: None,
                session_id: None,
            })
            .collect()
    }

    pub async fn document(&self, filename: &str) -> Option<Vec<u8>> {
        self.documents
            .lock()
            .await
            .get(filename)
            .map(|document| document.bytes.clone())
    }

    pub async fn delete_document(&self, filename: &str) -> bool {
        self.documents.lock().await.remove(filename).is_some()
    }

    /// Seed a document directly.
    pub async fn insert_document(&self, document: StoredDocument) {
        self.documents
            .lock()
            .await
            .insert(document.filename.clone(), document);
    }

    pub async fn socket_opened(&self, session_id: &str) {
        self.active_sockets
            .lock()
            .await
            .insert(session_id.to_string());
        self.sessions
            .lock()
            .await
            .entry(session_id.to_string())
            .or_insert_with(BackendSession::new);
    }

    pub async fn socket_closed(&self, session_id: &str) {
        self.active_sockets.lock().await.remove(session_id);
    }
}

impl Default for BackendFixture {
    fn default() -> Self {
        Self::new(Behavior::default())
    }
}

fn layer_update(layer: i64, status: LayerStatus) -> LayerUpdateFrame {
    LayerUpdateFrame {
        layer,
        status,
        data: None,
        message: None,
    }
}

/// Keyword intent router. `None` means the request is still unclear.
pub fn classify_intent(message: &str) -> Option<&'static str> {
    let lowered = message.to_lowercase();
    if lowered.split_whitespace().count() < 2 {
        return None;
    }
    let intent = if lowered.contains("bug")
        || lowered.contains("error")
        || lowered.contains("crash")
    {
        "bug_fix"
    } else if lowered.contains("integrat") || lowered.contains("api") {
        "integration"
    } else if lowered.contains("process") || lowered.contains("workflow") {
        "process_change"
    } else if lowered.contains("report") || lowered.contains("data") {
        "data_request"
    } else {
        "new_feature"
    };
    Some(intent)
}

fn next_question(turn: usize, intent: Option<&'static str>) -> String {
    match (turn, intent) {
        (_, None) => "Could you describe what you need in a bit more detail?".to_string(),
        (1, Some(intent)) => format!(
            "Understood, this looks like a {} request. Who are the users affected?",
            intent.replace('_', " ")
        ),
        (2, _) => "How does the current process work today?".to_string(),
        (3, _) => "Which systems or data sources are involved?".to_string(),
        _ => "What are the acceptance criteria?".to_string(),
    }
}

fn title_from(messages: &[String]) -> String {
    messages
        .first()
        .map(|first| {
            first
                .split_whitespace()
                .take(6)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_else(|| "Requirements".to_string())
}

fn slug(title: &str) -> String {
    let words: Vec<String> = title
        .split_whitespace()
        .take(3)
        .map(|word| {
            word.chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|word| !word.is_empty())
        .collect();
    if words.is_empty() {
        "document".to_string()
    } else {
        words.join("_")
    }
}

fn render_document(session_id: &str, intent: &str, messages: &[String]) -> StoredDocument {
    let created = Utc::now();
    let title = title_from(messages);
    let filename = format!(
        "{}__{}_{}_{}.docx",
        session_id,
        created.format("%Y%m%d_%H%M%S"),
        intent,
        slug(&title)
    );
    let mut body = format!("# {}\n\nType: {}\n\n## Conversation\n\n", title, intent);
    for message in messages {
        body.push_str(&format!("- {}\n", message));
    }
    StoredDocument {
        filename,
        bytes: body.into_bytes(),
        created,
        session_id: Some(session_id.to_string()),
    }
}
