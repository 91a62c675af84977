use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use super::ChatMessage;
use super::LayerSnapshot;

/// Characters of the last message kept as a session preview.
pub const PREVIEW_CHARS: usize = 80;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionMeta {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub preview: String,
}

impl SessionMeta {
    pub fn new(id: &str) -> SessionMeta {
        let now = Utc::now();
        return SessionMeta {
            id: id.to_string(),
            created_at: now,
            updated_at: now,
            preview: "".to_string(),
        };
    }

    pub fn touch(&mut self, last_message: Option<&ChatMessage>) {
        self.updated_at = Utc::now();
        self.preview = last_message
            .map(|message| message.preview(PREVIEW_CHARS))
            .unwrap_or_default();
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub messages: Vec<ChatMessage>,
    pub layers: LayerSnapshot,
}

/// A session as written to `<data_dir>/sessions/<id>.json`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub version: String,
    pub meta: SessionMeta,
    pub state: State,
}
