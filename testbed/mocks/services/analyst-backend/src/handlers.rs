use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use analyst_types::{
    ChatRequest, CleanupResponse, HealthResponse, ResponseFrame, ServerMessage, ServiceInfo,
    StatusResponse,
};

use crate::server::AppState;

const DOCX_MEDIA_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

type ApiResult<T> = Result<T, (StatusCode, Json<Value>)>;

fn not_found(detail: &str) -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "detail": detail })))
}

fn internal_error(message: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "detail": "Internal server error", "message": message })),
    )
}

/// File names must stay inside the document folder.
fn check_filename(filename: &str) -> ApiResult<()> {
    if filename.contains('/') || filename.contains('\\') || filename.contains("..") {
        return Err((StatusCode::FORBIDDEN, Json(json!({ "detail": "Access denied" }))));
    }
    Ok(())
}

pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Some(chrono::Local::now().naive_local().to_string()),
    })
}

pub async fn service_info() -> impl IntoResponse {
    Json(ServiceInfo {
        status: "ok".to_string(),
        version: "1.0.0".to_string(),
        llm_provider: "mock".to_string(),
        models: [
            ("router".to_string(), "mock-router".to_string()),
            ("assistant".to_string(), "mock-assistant".to_string()),
        ]
        .into_iter()
        .collect(),
    })
}

pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> ApiResult<impl IntoResponse> {
    let session_id = request
        .session_id
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    match state.fixture.process_message(&session_id, &request.message).await {
        Ok(turn) => Ok(Json(turn.response)),
        Err(error) => {
            tracing::error!(session_id = %session_id, %error, "chat turn failed");
            Err((StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "detail": error }))))
        }
    }
}

pub async fn session_info(
    Path(session_id): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    Json(state.fixture.session_info(&session_id).await)
}

pub async fn reset_session(
    Path(session_id): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    state.fixture.reset_session(&session_id).await;
    Json(StatusResponse {
        status: "ok".to_string(),
        message: Some("Session reset".to_string()),
        session_id: Some(session_id),
    })
}

pub async fn list_documents(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.fixture.list_documents().await)
}

pub async fn download_document(
    Path(filename): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<Response> {
    check_filename(&filename)?;
    let bytes = state
        .fixture
        .document(&filename)
        .await
        .ok_or_else(|| not_found("Document not found"))?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, DOCX_MEDIA_TYPE)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(bytes.into())
        .map_err(|error| internal_error(&error.to_string()))
}

pub async fn delete_document(
    Path(filename): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<impl IntoResponse> {
    check_filename(&filename)?;
    if !state.fixture.delete_document(&filename).await {
        return Err(not_found("Document not found"));
    }
    Ok(Json(StatusResponse {
        status: "ok".to_string(),
        message: Some(format!("Document {} deleted", filename)),
        session_id: None,
    }))
}

pub async fn admin_sessions(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.fixture.admin_sessions().await)
}

pub async fn admin_cleanup(State(state): State<AppState>) -> impl IntoResponse {
    Json(CleanupResponse {
        status: "ok".to_string(),
        cleaned_sessions: state.fixture.cleanup().await,
    })
}

pub async fn chat_socket(
    ws: WebSocketUpgrade,
    Path(session_id): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| socket_loop(socket, session_id, state))
}

async fn send_frame(socket: &mut WebSocket, frame: &ServerMessage) -> bool {
    let payload = match serde_json::to_string(frame) {
        Ok(payload) => payload,
        Err(error) => {
            tracing::error!(%error, "failed to encode frame");
            return false;
        }
    };
    socket.send(Message::Text(payload.into())).await.is_ok()
}

async fn socket_loop(mut socket: WebSocket, session_id: String, state: AppState) {
    state.fixture.socket_opened(&session_id).await;
    let mut disconnects = state.disconnects.subscribe();
    tracing::info!(session_id = %session_id, "websocket connected");

    let welcome = ServerMessage::Connected {
        session_id: session_id.clone(),
        message: Some("Connected to AI Business Analyst".to_string()),
    };
    if !send_frame(&mut socket, &welcome).await {
        state.fixture.socket_closed(&session_id).await;
        return;
    }

    loop {
        let incoming = tokio::select! {
            incoming = socket.recv() => incoming,
            target = disconnects.recv() => match target {
                Ok(target) if target == session_id || target == "*" => {
                    tracing::info!(session_id = %session_id, "dropping websocket on request");
                    let _ = socket.send(Message::Close(None)).await;
                    break;
                }
                _ => continue,
            },
        };

        let text = match incoming {
            Some(Ok(Message::Text(text))) => text,
            Some(Ok(Message::Close(_))) | None => break,
            Some(Ok(_)) => continue,
            Some(Err(error)) => {
                tracing::warn!(session_id = %session_id, %error, "websocket error");
                break;
            }
        };

        let data: Value = match serde_json::from_str(text.as_str()) {
            Ok(data) => data,
            Err(_) => {
                let frame = ServerMessage::Error {
                    message: "Invalid JSON".to_string(),
                };
                if !send_frame(&mut socket, &frame).await {
                    break;
                }
                continue;
            }
        };

        let delivered = match data.get("type").and_then(Value::as_str) {
            Some("message") => handle_message(&mut socket, &session_id, &state, &data).await,
            Some("ping") => send_frame(&mut socket, &ServerMessage::Pong).await,
            _ => true,
        };
        if !delivered {
            break;
        }
    }

    state.fixture.socket_closed(&session_id).await;
    tracing::info!(session_id = %session_id, "websocket disconnected");
}

async fn handle_message(
    socket: &mut WebSocket,
    session_id: &str,
    state: &AppState,
    data: &Value,
) -> bool {
    let content = data.get("content").and_then(Value::as_str).unwrap_or("");
    if content.is_empty() {
        let frame = ServerMessage::Error {
            message: "Empty message".to_string(),
        };
        return send_frame(socket, &frame).await;
    }

    let typing = ServerMessage::Typing {
        message: Some("AI is thinking...".to_string()),
    };
    if !send_frame(socket, &typing).await {
        return false;
    }

    let turn = match state.fixture.process_message(session_id, content).await {
        Ok(turn) => turn,
        Err(error) => {
            let frame = ServerMessage::Error {
                message: format!("Processing error: {}", error),
            };
            return send_frame(socket, &frame).await;
        }
    };

    if state.fixture.behavior().layer_frames {
        for update in &turn.layer_updates {
            if !send_frame(socket, &ServerMessage::LayerUpdate(update.clone())).await {
                return false;
            }
        }
        if let Some(document) = &turn.document {
            let frame = ServerMessage::DocumentReady {
                document: document.clone(),
            };
            if !send_frame(socket, &frame).await {
                return false;
            }
        }
    }

    send_frame(socket, &ServerMessage::Response(ResponseFrame::from(turn.response))).await
}
