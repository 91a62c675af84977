use analyst_types::DocType;

use super::ChatStore;
use super::DocumentStore;
use super::LayerStore;
use crate::domain::models::Session;
use crate::domain::models::SessionMeta;
use crate::domain::models::State;

/// Format version written into saved sessions.
pub const SESSION_VERSION: &str = "1";

/// Everything the interface shows, owned by the chat loop.
#[derive(Clone, Debug)]
pub struct AppState {
    pub chat: ChatStore,
    pub layers: LayerStore,
    pub documents: DocumentStore,
    pub doc_type: Option<DocType>,
    pub progress: f64,
    pub socket_live: bool,
}

impl AppState {
    pub fn new(session_id: &str) -> AppState {
        return AppState {
            chat: ChatStore::new(session_id),
            layers: LayerStore::new(),
            documents: DocumentStore::new(),
            doc_type: None,
            progress: 0.0,
            socket_live: false,
        };
    }

    pub fn session_id(&self) -> &str {
        return self.chat.session_id();
    }

    /// Replace the conversation with a saved session. Documents are kept
    /// since they are listed across sessions.
    pub fn load_session(&mut self, session: Session) {
        self.chat = ChatStore::from_parts(session.meta, session.state.messages);
        self.layers.restore(&session.state.layers);
        self.doc_type = None;
        self.progress = self.layers.progress();
        self.socket_live = false;
    }

    /// Start over on a fresh session id, keeping documents.
    pub fn start_session(&mut self, session_id: &str) {
        self.chat = ChatStore::new(session_id);
        self.layers.reset();
        self.doc_type = None;
        self.progress = 0.0;
        self.socket_live = false;
    }

    pub fn to_session(&self) -> Session {
        let meta: SessionMeta = self.chat.session().clone();
        return Session {
            version: SESSION_VERSION.to_string(),
            meta,
            state: State {
                messages: self.chat.messages().to_vec(),
                layers: self.layers.snapshot(),
            },
        };
    }
}
