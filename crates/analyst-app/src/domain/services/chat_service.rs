#[cfg(test)]
#[path = "chat_service_test.rs"]
mod tests;

use analyst_client::ApiClientRef;
use analyst_client::SocketConfig;
use analyst_client::SocketEvent;
use analyst_client::SocketManager;
use analyst_types::ChatRequest;
use analyst_types::ClientMessage;
use analyst_types::ServerMessage;
use anyhow::anyhow;
use anyhow::bail;
use anyhow::Result;
use tokio::sync::mpsc;

use super::apply_frame;
use super::apply_update;
use super::AppState;
use super::Sessions;
use super::UpdateOrigin;
use crate::domain::models::ChatMessage;
use crate::domain::models::Event;

/// Sends chat turns and folds backend replies into [`AppState`].
///
/// Messages travel over the session socket while it is open and fall back to
/// `POST /api/chat` otherwise.
pub struct ChatService {
    api: ApiClientRef,
    socket: Option<SocketManager>,
}

impl ChatService {
    pub fn new(api: ApiClientRef) -> ChatService {
        return ChatService { api, socket: None };
    }

    pub fn api(&self) -> &ApiClientRef {
        return &self.api;
    }

    pub fn has_socket(&self) -> bool {
        return self.socket.is_some();
    }

    /// Open the socket for the current session. Returns `None` when the
    /// backend offers no realtime channel.
    pub async fn connect_socket(
        &mut self,
        state: &mut AppState,
        config: SocketConfig,
    ) -> Result<Option<mpsc::UnboundedReceiver<SocketEvent>>> {
        self.disconnect_socket(state).await?;

        let url = match self.api.websocket_url(state.session_id()) {
            Some(url) => url,
            None => {
                tracing::debug!(client = self.api.name(), "no realtime channel");
                return Ok(None);
            }
        };

        let socket = SocketManager::with_config(&url, config)?;
        let events = socket.take_events().await;
        socket.connect().await?;
        tracing::info!(url = %url, session_id = state.session_id(), "socket connecting");

        self.socket = Some(socket);
        return Ok(events);
    }

    pub async fn disconnect_socket(&mut self, state: &mut AppState) -> Result<()> {
        state.socket_live = false;
        if let Some(socket) = self.socket.take() {
            socket.disconnect().await?;
        }
        return Ok(());
    }

    pub async fn send_message(&self, state: &mut AppState, text: &str) -> Result<Vec<Event>> {
        let text = text.trim();
        if text.is_empty() {
            bail!("Message is empty");
        }

        let message = state.chat.add_message(ChatMessage::user(text)).clone();
        let mut events = vec![Event::MessageAdded(message)];
        events.extend(self.deliver(state, text).await?);
        return Ok(events);
    }

    /// Resend the last user message without adding it again.
    pub async fn retry_last(&self, state: &mut AppState) -> Result<Vec<Event>> {
        let text = match state.chat.last_user_message() {
            Some(message) => message.content.to_string(),
            None => bail!("There is no message to retry"),
        };
        return self.deliver(state, &text).await;
    }

    async fn deliver(&self, state: &mut AppState, text: &str) -> Result<Vec<Event>> {
        state.chat.set_loading(true);

        if state.socket_live {
            if let Some(socket) = &self.socket {
                match socket.send(&ClientMessage::message(text)).await {
                    Ok(()) => return Ok(vec![]),
                    Err(err) => {
                        tracing::warn!(error = %err, "socket send failed, falling back to HTTP");
                        state.socket_live = false;
                    }
                }
            }
        }

        let request = ChatRequest::new(text, Some(state.session_id().to_string()));
        match self.api.send_chat(request).await {
            Ok(response) => {
                return Ok(apply_update(state, response.into(), UpdateOrigin::Http));
            }
            Err(err) => {
                tracing::error!(
                    error = %err,
                    session_id = state.session_id(),
                    "chat request failed"
                );
                state.chat.set_loading(false);
                state
                    .chat
                    .add_message(ChatMessage::error(&format!("Failed to send message: {err}")));
                return Err(anyhow!(err));
            }
        }
    }

    pub fn handle_socket_event(&self, state: &mut AppState, event: SocketEvent) -> Vec<Event> {
        match event {
            SocketEvent::Open => {
                state.socket_live = true;
                return vec![];
            }
            SocketEvent::Closed => {
                state.socket_live = false;
                return vec![Event::Disconnected];
            }
            SocketEvent::Reconnecting { attempt, delay } => {
                return vec![Event::Reconnecting { attempt, delay }];
            }
            SocketEvent::ReconnectFailed => {
                state.socket_live = false;
                state.chat.set_loading(false);
                let message = state
                    .chat
                    .add_message(ChatMessage::system(
                        "Lost the realtime connection. Messages will be sent over HTTP.",
                    ))
                    .clone();
                return vec![Event::ReconnectFailed, Event::MessageAdded(message)];
            }
            SocketEvent::Message { name, payload } => match ServerMessage::from_value(payload) {
                Ok(frame) => return apply_frame(state, frame),
                Err(err) => {
                    tracing::debug!(event = %name, error = %err, "ignoring undecodable frame");
                    return vec![];
                }
            },
        }
    }

    /// Drop the socket and start a fresh local session.
    pub async fn new_session(&mut self, state: &mut AppState) -> Result<Vec<Event>> {
        self.disconnect_socket(state).await?;
        let session_id = Sessions::create_id();
        state.start_session(&session_id);
        return Ok(vec![Event::SessionChanged(session_id)]);
    }
}
