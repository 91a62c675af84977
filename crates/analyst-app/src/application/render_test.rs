use std::collections::HashMap;
use std::time::Duration;

use analyst_types::DocType;
use analyst_types::ServiceInfo;
use analyst_types::SessionInfo;
use chrono::TimeZone;
use chrono::Utc;
use yansi::Paint;

use super::*;
use crate::domain::models::DocumentStatus;

fn plain() {
    Paint::disable();
}

fn document(filename: &str, title: Option<&str>, size: Option<u64>) -> Document {
    return Document {
        id: filename.to_string(),
        filename: filename.to_string(),
        doc_type: DocType::BugFix,
        path: None,
        title: title.map(|title| return title.to_string()),
        session_id: None,
        status: DocumentStatus::Ready,
        created_at: Some(Utc.with_ymd_and_hms(2024, 5, 1, 10, 15, 0).unwrap()),
        size,
    };
}

#[test]
fn it_draws_progress_bars() {
    assert_eq!(progress_bar(0.0), format!("[{}]   0%", "-".repeat(20)));
    assert_eq!(progress_bar(0.4), format!("[{}{}]  40%", "#".repeat(8), "-".repeat(12)));
    assert_eq!(progress_bar(7.0), format!("[{}] 100%", "#".repeat(20)));
}

#[test]
fn it_renders_layers_with_the_current_one_marked() {
    plain();
    let mut layers = LayerStore::new();
    layers.complete_layer(1);
    layers.complete_layer(2);
    layers.fail_layer(4, Some("index offline".to_string()));

    let text = render_layers(&layers);
    let lines = text.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 6);
    assert!(lines[0].contains(" 40%"));
    assert!(lines[1].contains("✓ 1. Intent understanding"));
    assert!(lines[3].contains("3. RAG search"));
    assert!(lines[3].contains("(current)"));
    assert!(lines[4].contains("✗ 4. Document generation  index offline"));

    assert!(render_layer_summary(&layers).starts_with("Layer 3/5 RAG search ["));
}

#[test]
fn it_renders_messages_by_role() {
    plain();
    let reply = ChatMessage::assistant("Which browsers are affected?")
        .with_layer(Some(2))
        .with_document(Some("docs/s1__bug_fix.md".to_string()));
    let text = render_message(&reply);
    assert!(text.starts_with("Analyst "));
    assert!(text.contains("layer 2"));
    assert!(text.contains("\nWhich browsers are affected?"));
    assert!(text.ends_with("Document: docs/s1__bug_fix.md"));

    assert!(render_message(&ChatMessage::user("hi")).starts_with("You "));
    assert!(render_message(&ChatMessage::system("note")).starts_with("System "));
    assert!(render_message(&ChatMessage::error("boom")).starts_with("Error "));
}

#[test]
fn it_numbers_documents() {
    plain();
    assert_eq!(render_documents(&[]), "No documents yet.");

    let text = render_documents(&[
        document("s1__login.md", Some("Login crash"), Some(2048)),
        document("s2__export.md", None, None),
    ]);
    assert!(text.contains("  1. Login crash (Bug Fix Requirements, 2.0 KB, 2024-05-01 10:15)"));
    assert!(text.contains("  2. s2__export.md (Bug Fix Requirements, 2024-05-01 10:15)"));
}

#[test]
fn it_marks_the_current_session() {
    plain();
    let mut first = SessionMeta::new("first");
    first.preview = "fix the login bug".to_string();
    let second = SessionMeta::new("second");

    let text = render_sessions(&[first, second], "second");
    let lines = text.lines().collect::<Vec<_>>();
    assert!(lines[0].starts_with("   1. first"));
    assert_eq!(lines[1].trim(), "fix the login bug");
    assert!(lines[2].starts_with("*  2. second"));
    assert_eq!(render_sessions(&[], "x"), "No saved sessions.");
}

#[test]
fn it_renders_remote_info() {
    plain();
    let info = SessionInfo {
        session_id: "s1".to_string(),
        status: "active".to_string(),
        doc_type: Some(DocType::Integration),
        messages_count: 4,
        progress: 0.6,
        created_at: None,
    };
    let text = render_session_info(&info);
    assert!(text.contains("type:     Integration Requirements"));
    assert!(text.contains("messages: 4"));
    assert!(text.contains(" 60%"));

    let service = ServiceInfo {
        status: "running".to_string(),
        version: "1.0.0".to_string(),
        llm_provider: "openai".to_string(),
        models: HashMap::from([("router".to_string(), "gpt-4o-mini".to_string())]),
    };
    assert!(render_service_info(&service).contains("  router: gpt-4o-mini"));
}

#[test]
fn it_skips_silent_events() {
    plain();
    let layers = LayerStore::new();
    assert_eq!(render_event(&Event::ReconnectFailed, &layers), None);
    let reconnecting = Event::Reconnecting {
        attempt: 2,
        delay: Duration::from_millis(2000),
    };
    assert_eq!(
        render_event(&reconnecting, &layers).as_deref(),
        Some("Reconnecting (attempt 2) in 2.0s...")
    );
    assert!(render_event(&Event::LayersChanged, &layers)
        .unwrap()
        .starts_with("Layer 1/5 Intent understanding"));
}

#[test]
fn it_lists_every_command_in_help() {
    let help = help_text();
    let commands = [
        "/new",
        "/sessions",
        "/switch",
        "/reset",
        "/layers",
        "/docs",
        "/download",
        "/delete",
        "/export",
        "/retry",
        "/quit",
    ];
    for command in commands {
        assert!(help.contains(command), "{command} missing from help");
    }
}
