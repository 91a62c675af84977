use std::time::Duration;

use super::ChatMessage;
use super::Document;

/// Something the interface should show after a state change.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    Connected(String),
    Disconnected,
    Reconnecting { attempt: u32, delay: Duration },
    ReconnectFailed,
    SessionChanged(String),
    Typing,
    MessageAdded(ChatMessage),
    LayersChanged,
    DocumentReady(Document),
}
