#[cfg(test)]
#[path = "message_test.rs"]
mod tests;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use strum_macros::Display;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, Default)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    #[default]
    Assistant,
    System,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Normal,
    Error,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,
    #[serde(default)]
    pub kind: MessageKind,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl ChatMessage {
    pub fn new(role: Role, content: &str) -> ChatMessage {
        return ChatMessage {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content: content.replace('\t', "  "),
            timestamp: Utc::now(),
            layer: None,
            document: None,
            kind: MessageKind::Normal,
            metadata: Map::new(),
        };
    }

    pub fn user(content: &str) -> ChatMessage {
        return ChatMessage::new(Role::User, content);
    }

    pub fn assistant(content: &str) -> ChatMessage {
        return ChatMessage::new(Role::Assistant, content);
    }

    pub fn system(content: &str) -> ChatMessage {
        return ChatMessage::new(Role::System, content);
    }

    /// A system message rendered as an error.
    pub fn error(content: &str) -> ChatMessage {
        let mut message = ChatMessage::new(Role::System, content);
        message.kind = MessageKind::Error;
        return message;
    }

    pub fn with_layer(mut self, layer: Option<u8>) -> ChatMessage {
        self.layer = layer;
        return self;
    }

    pub fn with_document(mut self, document: Option<String>) -> ChatMessage {
        self.document = document;
        return self;
    }

    pub fn with_metadata(mut self, key: &str, value: Value) -> ChatMessage {
        self.metadata.insert(key.to_string(), value);
        return self;
    }

    pub fn is_error(&self) -> bool {
        return self.kind == MessageKind::Error;
    }

    /// Content with whitespace runs collapsed, cut to `max_chars` characters.
    pub fn preview(&self, max_chars: usize) -> String {
        let collapsed = self.content.split_whitespace().collect::<Vec<&str>>().join(" ");
        return collapsed.chars().take(max_chars).collect();
    }
}
