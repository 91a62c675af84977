#[cfg(test)]
#[path = "document_test.rs"]
mod tests;

use analyst_types::parse_timestamp;
use analyst_types::DocType;
use analyst_types::DocumentPayload;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    #[default]
    Pending,
    Ready,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub filename: String,
    pub doc_type: DocType,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub status: DocumentStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub size: Option<u64>,
}

impl Document {
    /// Build a document from a backend payload. Payloads without an id or a
    /// filename cannot be keyed and are rejected.
    pub fn from_payload(payload: &DocumentPayload) -> Option<Document> {
        let id = payload.key()?.to_string();
        let filename = payload.filename.clone().unwrap_or_else(|| id.clone());
        let doc_type = payload
            .doc_type
            .filter(|doc_type| doc_type.is_known())
            .unwrap_or_else(|| DocType::infer(&filename));
        let session_id = payload
            .session_id
            .clone()
            .or_else(|| session_from_filename(&filename));

        return Some(Document {
            id,
            filename,
            doc_type,
            path: payload.path.clone(),
            title: payload.title.clone(),
            session_id,
            status: DocumentStatus::Pending,
            created_at: payload.created.as_deref().and_then(parse_timestamp),
            size: payload.size,
        });
    }

    /// Whether a payload refers to this document.
    pub fn matches(&self, payload: &DocumentPayload) -> bool {
        if let Some(id) = payload.id.as_deref() {
            if id == self.id {
                return true;
            }
        }
        if let Some(filename) = payload.filename.as_deref() {
            return filename == self.filename || filename == self.id;
        }
        return false;
    }

    /// Shallow merge: every field present in `payload` overwrites ours.
    pub fn merge(&mut self, payload: &DocumentPayload) {
        if let Some(filename) = &payload.filename {
            self.filename = filename.clone();
        }
        if let Some(doc_type) = payload.doc_type {
            self.doc_type = doc_type;
        }
        if let Some(path) = &payload.path {
            self.path = Some(path.clone());
        }
        if let Some(title) = &payload.title {
            self.title = Some(title.clone());
        }
        if let Some(session_id) = &payload.session_id {
            self.session_id = Some(session_id.clone());
        }
        if let Some(created) = payload.created.as_deref().and_then(parse_timestamp) {
            self.created_at = Some(created);
        }
        if let Some(size) = payload.size {
            self.size = Some(size);
        }
    }

    pub fn display_title(&self) -> String {
        if let Some(title) = self.title.as_deref().filter(|title| !title.trim().is_empty()) {
            return title.to_string();
        }
        return self.filename.clone();
    }

    pub fn is_markdown(&self) -> bool {
        let lowered = self.filename.to_lowercase();
        return lowered.ends_with(".md") || lowered.ends_with(".markdown");
    }
}

/// Backend file names start with `<session>__`.
pub fn session_from_filename(filename: &str) -> Option<String> {
    let (prefix, _) = filename.split_once("__")?;
    if prefix.is_empty() {
        return None;
    }
    return Some(prefix.to_string());
}
