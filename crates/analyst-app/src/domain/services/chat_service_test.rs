use std::sync::Arc;
use std::time::Duration;

use analyst_client::ApiClientFactory;
use analyst_client::HttpApiClient;
use analyst_client::SocketConfig;
use analyst_client::SocketEvent;
use analyst_types::LayerStatus;
use serde_json::json;

use super::ChatService;
use crate::domain::models::Event;
use crate::domain::models::Role;
use crate::domain::services::AppState;

fn mock_service() -> ChatService {
    return ChatService::new(ApiClientFactory::create_mock_client());
}

#[tokio::test]
async fn it_sends_over_http() {
    let service = mock_service();
    let mut state = AppState::new("s1");

    let events = service
        .send_message(&mut state, "  fix the checkout bug  ")
        .await
        .unwrap();

    assert!(matches!(
        &events[0],
        Event::MessageAdded(m) if m.role == Role::User && m.content == "fix the checkout bug"
    ));
    assert!(matches!(events.last(), Some(Event::MessageAdded(m)) if m.role == Role::Assistant));
    assert!(!state.chat.is_loading());
    assert_eq!(state.chat.message_count(), 2);
    assert_eq!(state.layers.status(1), Some(LayerStatus::Completed));
    assert_eq!(state.layers.current_layer(), 2);
}

#[tokio::test]
async fn it_rejects_empty_messages() {
    let service = mock_service();
    let mut state = AppState::new("s1");
    assert!(service.send_message(&mut state, " \n\t").await.is_err());
    assert_eq!(state.chat.message_count(), 0);
    assert!(!state.chat.is_loading());
}

#[tokio::test]
async fn it_produces_a_document_on_the_fifth_turn() {
    let service = mock_service();
    let mut state = AppState::new("s1");
    for turn in 1..=5 {
        service
            .send_message(&mut state, &format!("integration detail {turn}"))
            .await
            .unwrap();
    }

    assert_eq!(state.documents.len(), 1);
    let document = &state.documents.list()[0];
    assert_eq!(document.session_id.as_deref(), Some("s1"));
    assert!(document.is_markdown());
    assert_eq!(
        state.chat.last_message().unwrap().document.as_deref(),
        Some(document.filename.as_str())
    );
}

#[tokio::test]
async fn it_records_http_errors() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/chat")
        .with_status(500)
        .with_header("content-type", "application/json")
        .with_body(r#"{"detail":"LLM provider unavailable"}"#)
        .create_async()
        .await;

    let service = ChatService::new(Arc::new(HttpApiClient::new(&server.url()).unwrap()));
    let mut state = AppState::new("s1");
    let err = service.send_message(&mut state, "hello there").await.unwrap_err();

    mock.assert_async().await;
    assert!(err.to_string().contains("LLM provider unavailable"));
    assert!(!state.chat.is_loading());
    let last = state.chat.last_message().unwrap();
    assert!(last.is_error());
    assert!(last.content.contains("LLM provider unavailable"));
}

#[tokio::test]
async fn it_retries_without_duplicating_the_user_message() {
    let service = mock_service();
    let mut state = AppState::new("s1");
    assert!(service.retry_last(&mut state).await.is_err());

    service.send_message(&mut state, "new report please").await.unwrap();
    service.retry_last(&mut state).await.unwrap();

    assert_eq!(state.chat.messages_by_role(Role::User).len(), 1);
    assert_eq!(state.chat.messages_by_role(Role::Assistant).len(), 2);
}

#[tokio::test]
async fn it_tracks_socket_lifecycle() {
    let service = mock_service();
    let mut state = AppState::new("s1");

    assert!(service.handle_socket_event(&mut state, SocketEvent::Open).is_empty());
    assert!(state.socket_live);

    let events = service.handle_socket_event(
        &mut state,
        SocketEvent::Message {
            name: "response".to_string(),
            payload: json!({
                "type": "response",
                "content": "Hello",
                "session_id": "s1",
                "progress": 0.2
            }),
        },
    );
    assert!(matches!(events.last(), Some(Event::MessageAdded(m)) if m.content == "Hello"));

    let events = service.handle_socket_event(
        &mut state,
        SocketEvent::Reconnecting {
            attempt: 2,
            delay: Duration::from_secs(2),
        },
    );
    assert_eq!(
        events,
        vec![Event::Reconnecting {
            attempt: 2,
            delay: Duration::from_secs(2)
        }]
    );

    assert_eq!(
        service.handle_socket_event(&mut state, SocketEvent::Closed),
        vec![Event::Disconnected]
    );
    assert!(!state.socket_live);

    state.chat.set_loading(true);
    let events = service.handle_socket_event(&mut state, SocketEvent::ReconnectFailed);
    assert_eq!(events[0], Event::ReconnectFailed);
    assert!(!state.chat.is_loading());
    assert_eq!(state.chat.last_message().unwrap().role, Role::System);
}

#[tokio::test]
async fn it_ignores_undecodable_frames() {
    let service = mock_service();
    let mut state = AppState::new("s1");
    let events = service.handle_socket_event(
        &mut state,
        SocketEvent::Message {
            name: "response".to_string(),
            payload: json!({"type": "response"}),
        },
    );
    assert!(events.is_empty());
    assert_eq!(state.chat.message_count(), 0);
}

#[tokio::test]
async fn it_skips_the_socket_for_the_mock_client() {
    let mut service = mock_service();
    let mut state = AppState::new("s1");
    let events = service
        .connect_socket(&mut state, SocketConfig::default())
        .await
        .unwrap();
    assert!(events.is_none());
    assert!(!service.has_socket());
}

#[tokio::test]
async fn it_starts_new_sessions() {
    let mut service = mock_service();
    let mut state = AppState::new("s1");
    service.send_message(&mut state, "a new feature").await.unwrap();

    let events = service.new_session(&mut state).await.unwrap();
    assert!(matches!(&events[0], Event::SessionChanged(id) if id != "s1"));
    assert_eq!(state.chat.message_count(), 0);
    assert_eq!(state.layers.current_layer(), 1);
}
