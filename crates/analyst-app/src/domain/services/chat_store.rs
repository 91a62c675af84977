#[cfg(test)]
#[path = "chat_store_test.rs"]
mod tests;

use crate::domain::models::ChatMessage;
use crate::domain::models::Role;
use crate::domain::models::SessionMeta;

/// Messages of the current session plus its bookkeeping.
#[derive(Clone, Debug, PartialEq)]
pub struct ChatStore {
    session: SessionMeta,
    messages: Vec<ChatMessage>,
    is_loading: bool,
}

impl ChatStore {
    pub fn new(session_id: &str) -> ChatStore {
        return ChatStore {
            session: SessionMeta::new(session_id),
            messages: vec![],
            is_loading: false,
        };
    }

    pub fn from_parts(session: SessionMeta, messages: Vec<ChatMessage>) -> ChatStore {
        return ChatStore {
            session,
            messages,
            is_loading: false,
        };
    }

    pub fn session(&self) -> &SessionMeta {
        return &self.session;
    }

    pub fn session_id(&self) -> &str {
        return &self.session.id;
    }

    /// Take over a server-assigned session id, keeping the messages.
    pub fn adopt_session(&mut self, session_id: &str) -> bool {
        if session_id.is_empty() || self.session.id == session_id {
            return false;
        }

        tracing::info!(from = %self.session.id, to = session_id, "adopting server session id");
        self.session.id = session_id.to_string();
        return true;
    }

    pub fn messages(&self) -> &[ChatMessage] {
        return &self.messages;
    }

    pub fn message_count(&self) -> usize {
        return self.messages.len();
    }

    pub fn last_message(&self) -> Option<&ChatMessage> {
        return self.messages.last();
    }

    pub fn last_user_message(&self) -> Option<&ChatMessage> {
        return self
            .messages
            .iter()
            .rev()
            .find(|message| return message.role == Role::User);
    }

    pub fn messages_by_role(&self, role: Role) -> Vec<&ChatMessage> {
        return self
            .messages
            .iter()
            .filter(|message| return message.role == role)
            .collect();
    }

    pub fn add_message(&mut self, message: ChatMessage) -> &ChatMessage {
        self.messages.push(message);
        self.session.touch(self.messages.last());
        return &self.messages[self.messages.len() - 1];
    }

    pub fn update_message(&mut self, id: &str, content: &str) -> bool {
        let Some(message) = self.messages.iter_mut().find(|message| return message.id == id) else {
            return false;
        };

        message.content = content.replace('\t', "  ");
        self.session.touch(self.messages.last());
        return true;
    }

    pub fn delete_message(&mut self, id: &str) -> bool {
        let before = self.messages.len();
        self.messages.retain(|message| return message.id != id);
        if self.messages.len() == before {
            return false;
        }

        self.session.touch(self.messages.last());
        return true;
    }

    pub fn clear_messages(&mut self) {
        self.messages.clear();
        self.session.touch(None);
    }

    pub fn is_loading(&self) -> bool {
        return self.is_loading;
    }

    pub fn set_loading(&mut self, is_loading: bool) {
        self.is_loading = is_loading;
    }
}
