use analyst_app::{Config, ConfigKey};
use analyst_client::{ApiClientFactory, ApiClientRef};
use anyhow::Result;
use clap::{Arg, ArgMatches, Command, CommandFactory, FromArgMatches, Parser, Subcommand};
use std::io::IsTerminal;
use strum::IntoEnumIterator;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

mod commands;
mod interactive;

#[derive(Parser, Debug)]
#[command(
    name = "analyst",
    author,
    version,
    about = "Terminal client for the AI Business Analyst service"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[arg(long, global = true, help = "Write logs as JSON")]
    json_logs: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Chat with the analyst interactively (default command)
    Chat,
    /// Send one message and print the reply
    Send { message: String },
    /// Check that the backend is reachable
    Health,
    /// Show the backend version and models
    Info,
    /// Inspect the current session (--session-id)
    Session {
        #[command(subcommand)]
        action: SessionCommands,
    },
    /// Manage generated documents
    Documents {
        #[command(subcommand)]
        action: DocumentCommands,
    },
    /// Export a markdown file, a saved session or a generated document
    Export {
        /// Markdown file path, saved session id, or document number/name
        source: String,
        #[arg(long, short, default_value = "docx", value_parser = ["docx", "pdf"])]
        format: String,
    },
    /// Backend session administration
    Admin {
        #[command(subcommand)]
        action: AdminCommands,
    },
    /// Print a default config.toml
    Config,
}

#[derive(Subcommand, Debug)]
enum SessionCommands {
    /// Server-side state of the session
    Show,
    /// Clear the session on the server and locally
    Reset,
    /// List saved sessions
    List,
    /// Delete a saved session
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
enum DocumentCommands {
    /// List generated documents, newest first
    List,
    /// Save a document to the download directory
    Download {
        /// Document number from `documents list`, or its file name
        reference: String,
    },
    /// Delete a document on the server
    Delete {
        /// Document number from `documents list`, or its file name
        reference: String,
    },
}

#[derive(Subcommand, Debug)]
enum AdminCommands {
    /// Sessions held by the backend
    Sessions,
    /// Drop idle sessions on the backend
    Cleanup,
}

fn config_help(key: ConfigKey) -> &'static str {
    match key {
        ConfigKey::ApiUrl => "Base URL of the analyst backend.",
        ConfigKey::WsUrl => {
            "Base URL of the realtime channel. Derived from the API URL when empty."
        }
        ConfigKey::ConfigFile => "Path to the config file.",
        ConfigKey::DataDir => "Directory for saved sessions and logs.",
        ConfigKey::DownloadDir => "Directory for downloaded documents.",
        ConfigKey::ExportDir => "Directory for DOCX and PDF exports.",
        ConfigKey::Mock => "Answer locally without contacting the backend.",
        ConfigKey::SessionId => "Session to resume or inspect.",
        ConfigKey::RequestTimeout => "HTTP request timeout in seconds.",
        ConfigKey::ReconnectAttempts => "Realtime reconnect attempts before falling back to HTTP.",
        ConfigKey::ReconnectDelay => {
            "Delay before the first reconnect in milliseconds, doubled on each attempt."
        }
        ConfigKey::HeartbeatInterval => "Seconds between realtime pings, 0 disables them.",
        ConfigKey::LogLevel => "Log level.",
    }
}

/// One global flag per config key, named after it and readable from
/// `ANALYST_<KEY>`.
fn config_args() -> Vec<Arg> {
    ConfigKey::iter()
        .map(|key| {
            let name = key.to_string();
            let mut arg = Arg::new(name.clone())
                .long(name.clone())
                .global(true)
                .env(format!("ANALYST_{}", name.to_uppercase().replace('-', "_")))
                .help(format!("{} [default: {}]", config_help(key), Config::default(key)));

            match key {
                ConfigKey::Mock => {
                    arg = arg
                        .num_args(0..=1)
                        .default_missing_value("true")
                        .value_parser(["true", "false"]);
                }
                ConfigKey::LogLevel => {
                    arg = arg.value_parser(["error", "warn", "info", "debug", "trace"]);
                }
                _ => {}
            }
            arg
        })
        .collect()
}

fn command() -> Command {
    Cli::command().args(config_args())
}

/// Top-level matches followed by every nested subcommand's matches.
fn all_matches(matches: &ArgMatches) -> Vec<&ArgMatches> {
    let mut all = vec![matches];
    let mut current = matches;
    while let Some((_, sub_matches)) = current.subcommand() {
        all.push(sub_matches);
        current = sub_matches;
    }
    all
}

fn init_logging(interactive: bool, json: bool) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(Config::get(ConfigKey::LogLevel)))?;

    // The chat loop owns the terminal, so logs go to a file there.
    if interactive {
        let data_dir = Config::get_path(ConfigKey::DataDir);
        std::fs::create_dir_all(&data_dir)?;
        let appender = tracing_appender::rolling::never(&data_dir, "analyst.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(false);
        if json {
            builder.json().try_init().map_err(|e| anyhow::anyhow!(e))?;
        } else {
            builder.try_init().map_err(|e| anyhow::anyhow!(e))?;
        }
        return Ok(Some(guard));
    }

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().try_init().map_err(|e| anyhow::anyhow!(e))?;
    } else {
        builder.try_init().map_err(|e| anyhow::anyhow!(e))?;
    }
    Ok(None)
}

fn api_client() -> Result<ApiClientRef> {
    if Config::get_bool(ConfigKey::Mock) {
        tracing::info!("mock mode, no backend calls");
        return Ok(ApiClientFactory::create_mock_client());
    }

    let ws_url = Config::get(ConfigKey::WsUrl);
    let ws_url = Some(ws_url.as_str()).filter(|url| !url.is_empty());
    let client = ApiClientFactory::create_http_client(
        &Config::get(ConfigKey::ApiUrl),
        ws_url,
        Config::request_timeout(),
    )?;
    Ok(client)
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = command().get_matches();
    let cli = Cli::from_arg_matches(&matches)?;
    Config::load(command(), all_matches(&matches)).await?;

    let interactive = matches!(cli.command, None | Some(Commands::Chat));
    let _guard = init_logging(interactive, cli.json_logs)?;

    if !std::io::stdout().is_terminal() {
        yansi::Paint::disable();
    }

    std::panic::set_hook(Box::new(|panic_info| {
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => interactive::run(api_client()?).await,
        Commands::Send { message } => commands::send(api_client()?, &message).await,
        Commands::Health => commands::health(api_client()?).await,
        Commands::Info => commands::info(api_client()?).await,
        Commands::Session { action } => {
            let api = api_client()?;
            match action {
                SessionCommands::Show => commands::session_show(api).await,
                SessionCommands::Reset => commands::session_reset(api).await,
                SessionCommands::List => commands::session_list(api).await,
                SessionCommands::Delete { id } => commands::session_delete(api, &id).await,
            }
        }
        Commands::Documents { action } => {
            let api = api_client()?;
            match action {
                DocumentCommands::List => commands::documents_list(api).await,
                DocumentCommands::Download { reference } => {
                    commands::documents_download(api, &reference).await
                }
                DocumentCommands::Delete { reference } => {
                    commands::documents_delete(api, &reference).await
                }
            }
        }
        Commands::Export { source, format } => {
            commands::export(api_client()?, &source, &format).await
        }
        Commands::Admin { action } => {
            let api = api_client()?;
            match action {
                AdminCommands::Sessions => commands::admin_sessions(api).await,
                AdminCommands::Cleanup => commands::admin_cleanup(api).await,
            }
        }
        Commands::Config => {
            println!("{}", Config::serialize_default(command()));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_is_valid() {
        command().debug_assert();
    }

    #[test]
    fn test_config_flags_are_global() {
        let matches = command()
            .try_get_matches_from([
                "analyst",
                "documents",
                "list",
                "--api-url",
                "http://example.test",
                "--mock",
            ])
            .unwrap();
        let all = all_matches(&matches);
        assert_eq!(all.len(), 3);
        assert_eq!(
            all[2].get_one::<String>("api-url").map(String::as_str),
            Some("http://example.test")
        );
        assert_eq!(all[2].get_one::<String>("mock").map(String::as_str), Some("true"));
    }

    #[test]
    fn test_defaults_to_chat() {
        let matches = command().try_get_matches_from(["analyst"]).unwrap();
        let cli = Cli::from_arg_matches(&matches).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_rejects_unknown_log_level() {
        assert!(command()
            .try_get_matches_from(["analyst", "--log-level", "loud", "health"])
            .is_err());
    }
}
