//! Interpretation of backend updates.
//!
//! REST chat responses and socket frames carry the same fields, so both are
//! normalized into a [`ChatUpdate`] and applied to [`AppState`] by one
//! function. Assistant text that arrives over HTTP while the socket is live is
//! dropped; the socket delivers the same reply.

#[cfg(test)]
#[path = "updates_test.rs"]
mod tests;

use analyst_types::ChatResponse;
use analyst_types::DocType;
use analyst_types::DocumentPayload;
use analyst_types::LayerStatus;
use analyst_types::LayerUpdateFrame;
use analyst_types::ResponseFrame;
use analyst_types::ServerMessage;
use analyst_types::LAYER_COUNT;
use serde_json::Value;
use strum_macros::Display;

use super::AppState;
use super::LayerStore;
use crate::domain::models::ChatMessage;
use crate::domain::models::Document;
use crate::domain::models::DocumentStatus;
use crate::domain::models::Event;

/// Slack for progress values like `3 * 0.2`, which land just above a layer
/// boundary.
const PROGRESS_EPSILON: f64 = 1e-9;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum UpdateOrigin {
    Http,
    Socket,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChatUpdate {
    pub content: Option<String>,
    pub session_id: Option<String>,
    pub doc_type: Option<DocType>,
    pub progress: Option<f64>,
    pub document_ready: bool,
    pub document_path: Option<String>,
    pub layer: Option<i64>,
    pub layer_status: Option<LayerStatus>,
    pub layer_data: Option<Value>,
    pub layer_message: Option<String>,
    pub document: Option<DocumentPayload>,
}

impl From<ChatResponse> for ChatUpdate {
    fn from(response: ChatResponse) -> ChatUpdate {
        return ChatUpdate {
            content: Some(response.response),
            session_id: Some(response.session_id),
            doc_type: response.doc_type,
            progress: Some(response.progress),
            document_ready: response.document_ready,
            document_path: response.document_path,
            layer: response.layer,
            layer_status: response.layer_status,
            layer_data: response.layer_data,
            layer_message: None,
            document: response.document,
        };
    }
}

impl From<ResponseFrame> for ChatUpdate {
    fn from(frame: ResponseFrame) -> ChatUpdate {
        return ChatUpdate {
            content: Some(frame.content),
            session_id: frame.session_id,
            doc_type: frame.doc_type,
            progress: Some(frame.progress),
            document_ready: frame.document_ready,
            document_path: frame.document_path,
            layer: frame.layer,
            layer_status: frame.layer_status,
            layer_data: frame.layer_data,
            layer_message: None,
            document: frame.document,
        };
    }
}

impl From<LayerUpdateFrame> for ChatUpdate {
    fn from(frame: LayerUpdateFrame) -> ChatUpdate {
        return ChatUpdate {
            layer: Some(frame.layer),
            layer_status: Some(frame.status),
            layer_data: frame.data,
            layer_message: frame.message,
            ..Default::default()
        };
    }
}

fn complete_once(layers: &mut LayerStore, n: i64) {
    if layers.status(n) != Some(LayerStatus::Completed) {
        layers.complete_layer(n);
    }
}

/// Layer a progress value points at: `ceil(progress * 5)`, at least 1.
pub fn layer_for_progress(progress: f64) -> i64 {
    let scaled = progress.clamp(0.0, 1.0) * f64::from(LAYER_COUNT);
    return ((scaled - PROGRESS_EPSILON).ceil() as i64).max(1);
}

/// Returns whether the layer store changed.
fn apply_layers(state: &mut AppState, update: &ChatUpdate) -> bool {
    let before = state.layers.clone();

    if let Some(doc_type) = update.doc_type.filter(|doc_type| return doc_type.is_known()) {
        state.doc_type = Some(doc_type);
    }
    if let Some(progress) = update.progress {
        state.progress = progress.clamp(0.0, 1.0);
    }

    // A finished document ends the pipeline whatever else the update says.
    if update.document_ready {
        for n in 1..=i64::from(LAYER_COUNT) {
            complete_once(&mut state.layers, n);
        }
        return state.layers != before;
    }

    match (update.layer, update.progress) {
        (Some(n), _) => {
            match update.layer_status {
                Some(LayerStatus::Completed) => state.layers.complete_layer(n),
                Some(LayerStatus::Error) => {
                    state.layers.fail_layer(n, update.layer_message.clone());
                }
                Some(LayerStatus::Pending) => {
                    state.layers.update_layer_status(n, LayerStatus::Pending);
                }
                Some(LayerStatus::Active) | None => state.layers.set_current_layer(n),
            }
            if update.layer_data.is_some() {
                state.layers.set_layer_data(n, update.layer_data.clone());
            }
        }
        (None, Some(progress)) => {
            let target = layer_for_progress(progress);
            for n in 1..target {
                complete_once(&mut state.layers, n);
            }
            state.layers.set_current_layer(target);
        }
        (None, None) => {}
    }

    return state.layers != before;
}

/// Upsert the update's document. The flag tells whether it just became
/// ready; socket turns announce the same document twice.
fn apply_document(state: &mut AppState, update: &ChatUpdate) -> Option<(Document, bool)> {
    let mut payload = match (&update.document, &update.document_path) {
        (Some(document), _) => document.clone(),
        (None, Some(path)) if update.document_ready => DocumentPayload::from_path(path),
        _ => return None,
    };

    if payload.session_id.is_none() {
        payload.session_id = Some(state.session_id().to_string());
    }
    if payload.doc_type.is_none() {
        payload.doc_type = update.doc_type.or(state.doc_type);
    }

    let was_ready = payload
        .key()
        .and_then(|key| return state.documents.get(key))
        .is_some_and(|document| return document.status == DocumentStatus::Ready);

    let document = state.documents.upsert(&payload, DocumentStatus::Ready)?.clone();
    return Some((document, !was_ready));
}

/// Apply a chat update and report what changed.
pub fn apply_update(state: &mut AppState, update: ChatUpdate, origin: UpdateOrigin) -> Vec<Event> {
    let mut events = vec![];

    if let Some(session_id) = update.session_id.as_deref() {
        if state.chat.adopt_session(session_id) {
            events.push(Event::SessionChanged(session_id.to_string()));
        }
    }

    if apply_layers(state, &update) {
        events.push(Event::LayersChanged);
    }

    let document = match apply_document(state, &update) {
        Some((document, true)) => {
            events.push(Event::DocumentReady(document.clone()));
            Some(document)
        }
        Some((document, false)) => Some(document),
        None => None,
    };

    if let Some(content) = update.content.as_deref() {
        state.chat.set_loading(false);

        if origin == UpdateOrigin::Http && state.socket_live {
            tracing::debug!(
                session_id = state.session_id(),
                "socket is live, dropping HTTP assistant message"
            );
            return events;
        }

        let message = ChatMessage::assistant(content)
            .with_layer(Some(state.layers.current_layer()))
            .with_document(document.map(|document| return document.filename))
            .with_metadata("origin", Value::String(origin.to_string()));
        events.push(Event::MessageAdded(state.chat.add_message(message).clone()));
    }

    return events;
}

/// Apply one decoded socket frame.
pub fn apply_frame(state: &mut AppState, frame: ServerMessage) -> Vec<Event> {
    match frame {
        ServerMessage::Connected { session_id, .. } => {
            let mut events = vec![];
            if state.chat.adopt_session(&session_id) {
                events.push(Event::SessionChanged(session_id.clone()));
            }
            events.push(Event::Connected(session_id));
            return events;
        }
        ServerMessage::Typing { .. } => {
            state.chat.set_loading(true);
            return vec![Event::Typing];
        }
        ServerMessage::Response(frame) => {
            return apply_update(state, ChatUpdate::from(frame), UpdateOrigin::Socket);
        }
        ServerMessage::Error { message } => {
            state.chat.set_loading(false);
            let message = state.chat.add_message(ChatMessage::error(&message)).clone();
            return vec![Event::MessageAdded(message)];
        }
        ServerMessage::LayerUpdate(frame) => {
            return apply_update(state, ChatUpdate::from(frame), UpdateOrigin::Socket);
        }
        ServerMessage::Progress { progress, layer } => {
            let update = ChatUpdate {
                progress: Some(progress),
                layer,
                ..Default::default()
            };
            return apply_update(state, update, UpdateOrigin::Socket);
        }
        ServerMessage::DocumentReady { document } => {
            let update = ChatUpdate {
                document: Some(document),
                document_ready: true,
                ..Default::default()
            };
            return apply_update(state, update, UpdateOrigin::Socket);
        }
        ServerMessage::Pong | ServerMessage::Unknown => {
            return vec![];
        }
    }
}
