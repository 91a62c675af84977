use super::ChatStore;
use crate::domain::models::ChatMessage;
use crate::domain::models::Role;

#[test]
fn it_appends_and_updates_previews() {
    let mut store = ChatStore::new("s1");
    store.add_message(ChatMessage::user("Need a   new\nreport"));
    assert_eq!(store.session().preview, "Need a new report");

    let long = "x".repeat(200);
    store.add_message(ChatMessage::assistant(&long));
    assert_eq!(store.session().preview.chars().count(), 80);
    assert_eq!(store.message_count(), 2);
}

#[test]
fn it_updates_content_but_not_identity() {
    let mut store = ChatStore::new("s1");
    let id = store.add_message(ChatMessage::assistant("draft")).id.clone();
    let timestamp = store.messages()[0].timestamp;

    assert!(store.update_message(&id, "final"));
    assert!(!store.update_message("missing", "x"));
    assert_eq!(store.messages()[0].id, id);
    assert_eq!(store.messages()[0].content, "final");
    assert_eq!(store.messages()[0].timestamp, timestamp);
}

#[test]
fn it_finds_the_last_user_message() {
    let mut store = ChatStore::new("s1");
    assert!(store.last_user_message().is_none());
    store.add_message(ChatMessage::user("one"));
    store.add_message(ChatMessage::user("two"));
    store.add_message(ChatMessage::assistant("reply"));
    assert_eq!(store.last_user_message().unwrap().content, "two");
    assert_eq!(store.messages_by_role(Role::User).len(), 2);
}

#[test]
fn it_deletes_messages() {
    let mut store = ChatStore::new("s1");
    let id = store.add_message(ChatMessage::user("one")).id.clone();
    assert!(store.delete_message(&id));
    assert!(!store.delete_message(&id));
    assert_eq!(store.session().preview, "");
}

#[test]
fn it_adopts_new_session_ids_only() {
    let mut store = ChatStore::new("local");
    store.add_message(ChatMessage::user("hi"));
    assert!(!store.adopt_session("local"));
    assert!(!store.adopt_session(""));
    assert!(store.adopt_session("server-1"));
    assert_eq!(store.session_id(), "server-1");
    assert_eq!(store.message_count(), 1);
}
