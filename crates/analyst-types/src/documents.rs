//! Document descriptors as reported by the backend.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of generated document.
///
/// The backend reports either short tags (`BRD`) or its internal intent names
/// (`new_feature`); both map onto the same variant. Unknown values become
/// [`DocType::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DocType {
    Brd,
    Prd,
    BugFix,
    ProcessChange,
    Integration,
    DataRequest,
    #[default]
    Other,
}

impl DocType {
    /// Short tag used on the wire and in listings.
    pub fn tag(self) -> &'static str {
        match self {
            DocType::Brd => "BRD",
            DocType::Prd => "PRD",
            DocType::BugFix => "BUG_FIX",
            DocType::ProcessChange => "PROCESS_CHANGE",
            DocType::Integration => "INTEGRATION",
            DocType::DataRequest => "DATA_REQUEST",
            DocType::Other => "OTHER",
        }
    }

    /// Long name shown to the user.
    pub fn display_name(self) -> &'static str {
        match self {
            DocType::Brd => "Business Requirements Document",
            DocType::Prd => "Product Requirements Document",
            DocType::BugFix => "Bug Fix Requirements",
            DocType::ProcessChange => "Process Change Request",
            DocType::Integration => "Integration Requirements",
            DocType::DataRequest => "Data Request Specification",
            DocType::Other => "Document",
        }
    }

    /// Whether the backend has classified the request into a concrete kind.
    pub fn is_known(self) -> bool {
        self != DocType::Other
    }

    /// Guess the document kind from a tag, intent name or filename.
    ///
    /// Filenames produced by the backend look like
    /// `<session>__<timestamp>_<intent>_<title>.docx`, so the intent name is
    /// matched as a substring while short tags must be whole tokens.
    pub fn infer(source: &str) -> DocType {
        let lowered = source.to_lowercase();
        let tokens: Vec<&str> = lowered
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|token| !token.is_empty())
            .collect();
        let has_token = |needle: &str| tokens.iter().any(|token| *token == needle);

        if has_token("brd") || lowered.contains("new_feature") || lowered.contains("new-feature")
        {
            DocType::Brd
        } else if has_token("prd") {
            DocType::Prd
        } else if lowered.contains("bug_fix") || has_token("bugfix") {
            DocType::BugFix
        } else if lowered.contains("process_change") {
            DocType::ProcessChange
        } else if has_token("integration") {
            DocType::Integration
        } else if lowered.contains("data_request") {
            DocType::DataRequest
        } else {
            DocType::Other
        }
    }
}

impl From<String> for DocType {
    fn from(value: String) -> Self {
        DocType::infer(&value)
    }
}

impl From<DocType> for String {
    fn from(value: DocType) -> Self {
        value.tag().to_string()
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Entry of `GET /api/documents`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentInfo {
    /// File name inside the backend document folder.
    pub filename: String,
    /// Server-side path.
    pub path: String,
    /// Creation time as an ISO-8601 string.
    pub created: String,
    /// Size in bytes.
    pub size: u64,
    /// Server id, when the backend assigns one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Document kind, when the backend reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<DocType>,
    /// Human title, when the backend reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Owning session, when the backend reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl DocumentInfo {
    /// Parse `created` leniently: RFC 3339 or a naive timestamp taken as UTC.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.created)
    }
}

/// Document reference embedded in chat responses and socket frames.
///
/// Every field is optional because the backend fills in whatever it knows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, rename = "type", alias = "doc_type", skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<DocType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
}

impl DocumentPayload {
    /// Build a payload from a bare server path such as `docs/x.docx`.
    pub fn from_path(path: &str) -> Self {
        let filename = path
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(path)
            .to_string();
        Self {
            filename: Some(filename),
            path: Some(path.to_string()),
            ..Default::default()
        }
    }

    /// The key used for upserts: server id, falling back to the filename.
    pub fn key(&self) -> Option<&str> {
        self.id.as_deref().or(self.filename.as_deref())
    }
}

impl From<DocumentInfo> for DocumentPayload {
    fn from(info: DocumentInfo) -> Self {
        Self {
            id: info.id,
            filename: Some(info.filename),
            path: Some(info.path),
            title: info.title,
            doc_type: info.doc_type,
            session_id: info.session_id,
            size: Some(info.size),
            created: Some(info.created),
        }
    }
}

/// Parse a backend timestamp.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
