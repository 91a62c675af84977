use analyst_app::{Config, ConfigKey, Flow, Repl, ReplProps};
use analyst_client::ApiClientRef;
use anyhow::Result;
use std::io::{self, Write};
use tokio::io::{AsyncBufReadExt, BufReader};

fn prompt() -> Result<()> {
    print!("> ");
    io::stdout().flush()?;
    Ok(())
}

fn print_blocks(blocks: &[String]) {
    for block in blocks {
        println!("{}", block);
    }
}

pub async fn run(api: ApiClientRef) -> Result<()> {
    let session_id = Config::get(ConfigKey::SessionId);
    let mut repl = Repl::new(ReplProps {
        api,
        data_dir: Config::get_path(ConfigKey::DataDir),
        download_dir: Config::get_path(ConfigKey::DownloadDir),
        export_dir: Config::get_path(ConfigKey::ExportDir),
        socket_config: Some(Config::socket_config()),
        session_id: Some(session_id).filter(|id| !id.is_empty()),
    })
    .await?;

    print_blocks(&repl.start().await);
    prompt()?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line? {
                    Some(line) => line,
                    None => break,
                };
                let (flow, blocks) = repl.handle_line(&line).await;
                print_blocks(&blocks);
                if flow == Flow::Quit {
                    break;
                }
                prompt()?;
            }
            event = repl.next_socket_event() => {
                let Some(event) = event else { continue };
                let blocks = repl.handle_socket_event(event);
                if !blocks.is_empty() {
                    println!();
                    print_blocks(&blocks);
                    prompt()?;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        }
    }

    let session_id = repl.state.session_id().to_string();
    let saved = repl.state.chat.message_count() > 0;
    repl.shutdown().await?;
    tracing::info!(session_id = %session_id, saved, "chat ended");
    if saved {
        println!("Resume with: analyst --session-id {}", session_id);
    }
    Ok(())
}
