use std::sync::Arc;

use analyst_backend::MockBackend;
use analyst_client::ApiClientFactory;
use analyst_client::HttpApiClient;
use tempfile::TempDir;

use super::SessionService;
use crate::domain::models::ChatMessage;
use crate::domain::models::Event;
use crate::domain::services::AppState;
use crate::domain::services::ChatService;
use crate::domain::services::Sessions;

#[tokio::test]
async fn it_saves_lists_and_switches() {
    let tmp = TempDir::new().unwrap();
    let service = SessionService::new(
        ApiClientFactory::create_mock_client(),
        Sessions::new(tmp.path()),
    );

    let mut state = AppState::new("first");
    assert!(!service.save(&state).await.unwrap());

    state.chat.add_message(ChatMessage::user("first question"));
    state.layers.complete_layer(1);
    assert!(service.save(&state).await.unwrap());

    state.start_session("second");
    state.chat.add_message(ChatMessage::user("second question"));

    let events = service.switch(&mut state, "first").await.unwrap();
    assert_eq!(events[0], Event::SessionChanged("first".to_string()));
    assert_eq!(state.session_id(), "first");
    assert_eq!(state.chat.messages()[0].content, "first question");
    assert_eq!(state.layers.current_layer(), 2);

    // The session left behind was saved on the way out.
    let ids = service
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|meta| meta.id)
        .collect::<Vec<_>>();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&"second".to_string()));

    assert!(service.switch(&mut state, "missing").await.is_err());
    assert_eq!(state.session_id(), "first");
}

#[tokio::test]
async fn it_refuses_to_delete_the_active_session() {
    let tmp = TempDir::new().unwrap();
    let service = SessionService::new(
        ApiClientFactory::create_mock_client(),
        Sessions::new(tmp.path()),
    );
    let mut state = AppState::new("s1");
    state.chat.add_message(ChatMessage::user("hello"));
    service.save(&state).await.unwrap();

    assert!(service.delete(&state, "s1").await.is_err());
    state.start_session("s2");
    assert!(service.delete(&state, "s1").await.unwrap());
}

#[tokio::test]
async fn it_resets_remote_and_local_state() {
    let backend = MockBackend::new().spawn().await.unwrap();
    let api = Arc::new(HttpApiClient::new(&backend.http_url()).unwrap());
    let tmp = TempDir::new().unwrap();
    let chat = ChatService::new(api.clone());
    let service = SessionService::new(api, Sessions::new(tmp.path()));

    let mut state = AppState::new("s-reset");
    chat.send_message(&mut state, "fix the payment bug").await.unwrap();
    chat.send_message(&mut state, "it fails on checkout").await.unwrap();
    let info = service.remote_info(&state).await.unwrap();
    assert_eq!(info.status, "active");
    assert_eq!(state.layers.completed_layers(), vec![1]);
    assert_eq!(state.layers.current_layer(), 2);

    let events = service.reset_remote(&mut state).await.unwrap();
    assert_eq!(events, vec![Event::LayersChanged]);
    assert_eq!(state.chat.message_count(), 0);
    assert!(state.layers.completed_layers().is_empty());
    assert_eq!(service.remote_info(&state).await.unwrap().status, "no_session");
}

#[tokio::test]
async fn it_forgets_the_saved_session_on_reset() {
    let tmp = TempDir::new().unwrap();
    let service = SessionService::new(
        ApiClientFactory::create_mock_client(),
        Sessions::new(tmp.path()),
    );
    let mut state = AppState::new("s1");
    state.chat.add_message(ChatMessage::user("hello"));
    state.layers.complete_layer(1);
    assert!(service.save(&state).await.unwrap());

    service.reset_remote(&mut state).await.unwrap();
    assert!(!service.save(&state).await.unwrap());
    assert!(!service.sessions().exists("s1").await);
    assert!(service.list().await.unwrap().is_empty());

    // Resetting a session that was never saved is fine too.
    state.start_session("s2");
    assert!(service.reset_remote(&mut state).await.is_ok());
}
