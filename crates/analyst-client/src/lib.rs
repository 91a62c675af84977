//! Client SDK for the AI Business Analyst backend
//!
//! The backend exposes a small REST API for chat turns, sessions and generated
//! documents, plus one WebSocket per chat session for pushed updates. This
//! crate wraps both. [`ApiClient`] is the seam the application talks to, with
//! an HTTP implementation for real deployments and an in-process mock that
//! fabricates replies for offline work. [`SocketManager`] owns the realtime
//! channel and its reconnect policy.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use analyst_types::{
    AdminSessionInfo, ChatRequest, ChatResponse, CleanupResponse, DocumentInfo, HealthResponse,
    ServiceInfo, SessionInfo, StatusResponse,
};

pub mod error;
pub mod http_client;
pub mod mock_client;
pub mod socket;

pub use error::{ClientError, Result};
pub use http_client::HttpApiClient;
pub use mock_client::MockApiClient;
pub use socket::{
    ConnectionState, EventHandler, ReconnectPolicy, SocketConfig, SocketEvent, SocketManager,
};

/// Operations the application needs from the backend.
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// WebSocket endpoint for a session, when the backend offers one.
    fn websocket_url(&self, session_id: &str) -> Option<String>;

    /// Check that the backend is reachable.
    async fn health_check(&self) -> Result<HealthResponse>;

    /// Version and model information.
    async fn service_info(&self) -> Result<ServiceInfo>;

    /// Send one chat turn.
    async fn send_chat(&self, request: ChatRequest) -> Result<ChatResponse>;

    /// Server-side view of a session.
    async fn session_info(&self, session_id: &str) -> Result<SessionInfo>;

    /// Drop the server-side conversation state of a session.
    async fn reset_session(&self, session_id: &str) -> Result<StatusResponse>;

    /// All generated documents, newest first.
    async fn list_documents(&self) -> Result<Vec<DocumentInfo>>;

    /// Raw bytes of a generated document.
    async fn download_document(&self, filename: &str) -> Result<Vec<u8>>;

    /// Delete a generated document.
    async fn delete_document(&self, filename: &str) -> Result<StatusResponse>;

    /// Sessions currently held by the backend.
    async fn list_admin_sessions(&self) -> Result<Vec<AdminSessionInfo>>;

    /// Ask the backend to drop idle sessions.
    async fn cleanup_sessions(&self) -> Result<CleanupResponse>;
}

pub type ApiClientRef = Arc<dyn ApiClient>;

/// Factory for creating [`ApiClient`] instances
pub struct ApiClientFactory;

impl ApiClientFactory {
    /// Create an HTTP client for a remote backend
    pub fn create_http_client(
        base_url: &str,
        ws_url: Option<&str>,
        timeout: Duration,
    ) -> Result<ApiClientRef> {
        let mut client = HttpApiClient::new(base_url)?.with_timeout(timeout);
        if let Some(ws_url) = ws_url {
            client = client.with_ws_url(ws_url)?;
        }
        Ok(Arc::new(client))
    }

    /// Create the offline mock client
    pub fn create_mock_client() -> ApiClientRef {
        Arc::new(MockApiClient::new())
    }
}
