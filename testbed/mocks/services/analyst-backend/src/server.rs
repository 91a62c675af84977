use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::fixtures::{BackendFixture, Behavior};
use crate::handlers::{
    admin_cleanup, admin_sessions, chat, chat_socket, delete_document, download_document,
    health_check, list_documents, reset_session, service_info, session_info,
};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub fixture: Arc<BackendFixture>,
    /// Session ids whose sockets should be dropped; `"*"` drops all of them.
    pub disconnects: broadcast::Sender<String>,
}

pub struct MockBackend {
    state: AppState,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::with_behavior(Behavior::default())
    }

    pub fn with_behavior(behavior: Behavior) -> Self {
        let (disconnects, _) = broadcast::channel(16);
        Self {
            state: AppState {
                fixture: Arc::new(BackendFixture::new(behavior)),
                disconnects,
            },
        }
    }

    pub fn fixture(&self) -> Arc<BackendFixture> {
        self.state.fixture.clone()
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(service_info))
            .route("/health", get(health_check))
            .route("/api/chat", post(chat))
            .route("/api/session/{session_id}", get(session_info))
            .route("/api/session/{session_id}/reset", post(reset_session))
            .route("/api/documents", get(list_documents))
            .route(
                "/api/documents/{filename}",
                get(download_document).delete(delete_document),
            )
            .route("/api/admin/sessions", get(admin_sessions))
            .route("/api/admin/cleanup", post(admin_cleanup))
            .route("/ws/chat/{session_id}", get(chat_socket))
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Serve until the process exits.
    pub async fn serve(self, addr: &str) -> anyhow::Result<()> {
        let addr: SocketAddr = addr.parse()?;
        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Analyst mock backend listening on {}", listener.local_addr()?);
        axum::serve(listener, self.router())
            .await
            .map_err(|e| anyhow::anyhow!("server error: {}", e))
    }

    /// Serve on an ephemeral localhost port in the background.
    pub async fn spawn(self) -> anyhow::Result<RunningBackend> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let router = self.router();
        let handle = tokio::spawn(async move {
            if let Err(error) = axum::serve(listener, router).await {
                tracing::error!(%error, "mock backend stopped");
            }
        });
        tracing::debug!(%addr, "spawned analyst mock backend");
        Ok(RunningBackend {
            addr,
            handle,
            state: self.state,
        })
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to a backend started with [`MockBackend::spawn`]. Dropping it stops the server.
pub struct RunningBackend {
    addr: SocketAddr,
    handle: JoinHandle<()>,
    state: AppState,
}

impl RunningBackend {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn http_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    pub fn fixture(&self) -> Arc<BackendFixture> {
        self.state.fixture.clone()
    }

    /// Close the sockets of one session (or `"*"` for all) from the server side.
    pub fn drop_sockets(&self, session_id: &str) -> usize {
        self.state
            .disconnects
            .send(session_id.to_string())
            .unwrap_or(0)
    }

    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for RunningBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
