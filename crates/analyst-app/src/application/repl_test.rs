use std::time::Duration;

use analyst_client::ApiClientFactory;
use analyst_client::SocketEvent;
use serde_json::json;
use tempfile::TempDir;
use yansi::Paint;

use super::Flow;
use super::Repl;
use super::ReplProps;

fn props(tmp: &TempDir, session_id: Option<&str>) -> ReplProps {
    return ReplProps {
        api: ApiClientFactory::create_mock_client(),
        data_dir: tmp.path().join("data"),
        download_dir: tmp.path().join("downloads"),
        export_dir: tmp.path().join("exports"),
        socket_config: None,
        session_id: session_id.map(|id| return id.to_string()),
    };
}

async fn repl(tmp: &TempDir) -> Repl {
    Paint::disable();
    let mut repl = Repl::new(props(tmp, Some("s1"))).await.unwrap();
    repl.start().await;
    return repl;
}

async fn say(repl: &mut Repl, line: &str) -> String {
    let (flow, lines) = repl.handle_line(line).await;
    assert_eq!(flow, Flow::Continue);
    return lines.join("\n");
}

#[tokio::test]
async fn it_greets_with_the_session() {
    Paint::disable();
    let tmp = TempDir::new().unwrap();
    let mut repl = Repl::new(props(&tmp, Some("s1"))).await.unwrap();
    let lines = repl.start().await;
    assert!(lines.iter().any(|line| line == "Session s1"));
    assert!(!lines.iter().any(|line| line.contains("not reachable")));
}

#[tokio::test]
async fn it_prints_the_reply_but_not_the_input() {
    let tmp = TempDir::new().unwrap();
    let mut repl = repl(&tmp).await;

    let output = say(&mut repl, "fix the checkout bug").await;
    assert!(output.lines().any(|line| line.starts_with("Analyst ")));
    assert!(!output.contains("You "));
    assert!(output.contains("Layer 2/5"));
    assert_eq!(repl.state.chat.message_count(), 2);
}

#[tokio::test]
async fn it_ignores_blank_lines_and_quits() {
    let tmp = TempDir::new().unwrap();
    let mut repl = repl(&tmp).await;

    assert_eq!(repl.handle_line("   ").await, (Flow::Continue, vec![]));
    assert_eq!(repl.handle_line("/q").await.0, Flow::Quit);
    assert_eq!(repl.handle_line("/exit").await.0, Flow::Quit);
}

#[tokio::test]
async fn it_reports_command_errors_inline() {
    let tmp = TempDir::new().unwrap();
    let mut repl = repl(&tmp).await;

    assert_eq!(say(&mut repl, "/frobnicate").await, "Unknown command /frobnicate, try /help");
    assert_eq!(say(&mut repl, "/retry").await, "There is no message to retry");
    assert_eq!(say(&mut repl, "/download").await, "Usage: /download [NUMBER], see /docs");
    assert_eq!(say(&mut repl, "/export rtf").await, "Unknown export format rtf, use docx or pdf");
    assert!(say(&mut repl, "/help").await.contains("/layers"));
}

#[tokio::test]
async fn it_downloads_and_exports_the_generated_document() {
    let tmp = TempDir::new().unwrap();
    let mut repl = repl(&tmp).await;

    for turn in 1..=5 {
        say(&mut repl, &format!("integrate billing, detail {turn}")).await;
    }
    assert!(say(&mut repl, "/layers").await.contains("document type: Integration Requirements"));

    let docs = say(&mut repl, "/docs").await;
    assert!(docs.contains("  1. "));

    let saved = say(&mut repl, "/download 1").await;
    assert!(saved.starts_with("Saved "));
    assert_eq!(std::fs::read_dir(tmp.path().join("downloads")).unwrap().count(), 1);

    assert!(say(&mut repl, "/export pdf doc 1").await.starts_with("Exported "));
    assert!(say(&mut repl, "/export docx").await.starts_with("Exported "));
    assert!(say(&mut repl, "/e pdf all").await.starts_with("Exported "));
    assert!(say(&mut repl, "/export pdf 2").await.starts_with("Exported "));
    assert_eq!(std::fs::read_dir(tmp.path().join("exports")).unwrap().count(), 4);

    assert!(say(&mut repl, "/delete 1").await.starts_with("Deleted "));
    assert_eq!(say(&mut repl, "/docs").await, "No documents yet.");
}

#[tokio::test]
async fn it_moves_between_sessions() {
    let tmp = TempDir::new().unwrap();
    let mut repl = repl(&tmp).await;

    say(&mut repl, "fix the login bug").await;
    let output = say(&mut repl, "/new").await;
    assert!(output.starts_with("Session "));
    assert_ne!(repl.state.session_id(), "s1");
    assert_eq!(repl.state.chat.message_count(), 0);

    say(&mut repl, "weekly data report").await;
    let sessions = say(&mut repl, "/sessions").await;
    assert!(sessions.contains("1. s1"));

    let output = say(&mut repl, "/switch 1").await;
    assert!(output.contains("fix the login bug"));
    assert_eq!(repl.state.session_id(), "s1");
    assert_eq!(repl.state.layers.current_layer(), 2);
    assert_eq!(say(&mut repl, "/switch s1").await, "Already in session s1");

    // Both sessions are on disk now.
    assert_eq!(repl.sessions.list().await.unwrap().len(), 2);
}

#[tokio::test]
async fn it_resumes_a_saved_session() {
    let tmp = TempDir::new().unwrap();
    let mut first = repl(&tmp).await;
    say(&mut first, "add a loyalty program").await;
    first.shutdown().await.unwrap();

    let mut resumed = Repl::new(props(&tmp, Some("s1"))).await.unwrap();
    let lines = resumed.start().await;
    assert_eq!(resumed.state.chat.message_count(), 2);
    assert!(lines.iter().any(|line| line.contains("add a loyalty program")));
}

#[tokio::test]
async fn it_resets_and_retries() {
    let tmp = TempDir::new().unwrap();
    let mut repl = repl(&tmp).await;

    say(&mut repl, "new onboarding process").await;
    let retried = say(&mut repl, "/r").await;
    assert!(retried.lines().any(|line| line.starts_with("Analyst ")));
    assert_eq!(repl.state.chat.message_count(), 3);

    assert!(say(&mut repl, "/reset").await.starts_with("Session reset."));
    assert_eq!(repl.state.chat.message_count(), 0);
    assert_eq!(repl.state.layers.current_layer(), 1);
}

#[tokio::test]
async fn it_does_not_resume_a_reset_session() {
    let tmp = TempDir::new().unwrap();
    let mut first = repl(&tmp).await;
    say(&mut first, "add a loyalty program").await;
    say(&mut first, "/new").await;
    say(&mut first, "/switch s1").await;
    assert_eq!(first.state.chat.message_count(), 2);

    say(&mut first, "/reset").await;
    let (flow, _) = first.handle_line("/quit").await;
    assert_eq!(flow, Flow::Quit);
    first.shutdown().await.unwrap();

    let mut resumed = Repl::new(props(&tmp, Some("s1"))).await.unwrap();
    resumed.start().await;
    assert_eq!(resumed.state.session_id(), "s1");
    assert_eq!(resumed.state.chat.message_count(), 0);
    assert_eq!(resumed.state.layers.current_layer(), 1);
}

#[tokio::test]
async fn it_renders_socket_frames() {
    let tmp = TempDir::new().unwrap();
    let mut repl = repl(&tmp).await;

    let lines = repl.handle_socket_event(SocketEvent::Message {
        name: "typing".to_string(),
        payload: json!({"type": "typing", "session_id": "s1"}),
    });
    assert_eq!(lines, vec!["Analyst is typing...".to_string()]);

    let lines = repl.handle_socket_event(SocketEvent::Closed);
    assert_eq!(lines, vec!["Realtime connection closed.".to_string()]);
}

#[tokio::test]
async fn it_waits_forever_without_a_socket() {
    let tmp = TempDir::new().unwrap();
    let mut repl = repl(&tmp).await;
    assert!(tokio::time::timeout(Duration::from_millis(20), repl.next_socket_event())
        .await
        .is_err());
}
