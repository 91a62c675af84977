#[cfg(test)]
#[path = "session_service_test.rs"]
mod tests;

use analyst_client::ApiClientRef;
use analyst_types::SessionInfo;
use anyhow::bail;
use anyhow::Result;

use super::AppState;
use super::Sessions;
use crate::domain::models::Event;
use crate::domain::models::SessionMeta;

/// Local session files plus the server-side view of the current session.
pub struct SessionService {
    api: ApiClientRef,
    sessions: Sessions,
}

impl SessionService {
    pub fn new(api: ApiClientRef, sessions: Sessions) -> SessionService {
        return SessionService { api, sessions };
    }

    pub fn sessions(&self) -> &Sessions {
        return &self.sessions;
    }

    pub async fn list(&self) -> Result<Vec<SessionMeta>> {
        return self.sessions.list().await;
    }

    /// Persist the current session. Sessions without messages are not
    /// written; returns whether a file was saved.
    pub async fn save(&self, state: &AppState) -> Result<bool> {
        if state.chat.message_count() == 0 {
            return Ok(false);
        }
        self.sessions.save(&state.to_session()).await?;
        return Ok(true);
    }

    /// Load a saved session into the state, saving the current one first.
    pub async fn switch(&self, state: &mut AppState, id: &str) -> Result<Vec<Event>> {
        let session = self.sessions.load(id).await?;
        self.save(state).await?;

        state.load_session(session);
        tracing::info!(session_id = id, "switched session");
        return Ok(vec![Event::SessionChanged(id.to_string()), Event::LayersChanged]);
    }

    pub async fn delete(&self, state: &AppState, id: &str) -> Result<bool> {
        if state.session_id() == id {
            bail!("Cannot delete the active session");
        }
        return self.sessions.delete(id).await;
    }

    pub async fn remote_info(&self, state: &AppState) -> Result<SessionInfo> {
        return Ok(self.api.session_info(state.session_id()).await?);
    }

    /// Reset the conversation on the server, then locally. The saved file
    /// goes too, so resuming the id starts from scratch.
    pub async fn reset_remote(&self, state: &mut AppState) -> Result<Vec<Event>> {
        let status = self.api.reset_session(state.session_id()).await?;
        tracing::info!(session_id = state.session_id(), status = %status.status, "session reset");

        self.sessions.delete(state.session_id()).await?;
        state.chat.clear_messages();
        state.chat.set_loading(false);
        state.layers.reset();
        state.doc_type = None;
        state.progress = 0.0;
        return Ok(vec![Event::LayersChanged]);
    }
}
