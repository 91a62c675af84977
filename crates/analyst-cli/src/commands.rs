use analyst_app::application::render;
use analyst_app::{
    AppState, ChatService, Config, ConfigKey, DocumentService, Event, ExportFormat, ExportService,
    Role, SessionService, Sessions,
};
use analyst_client::ApiClientRef;
use anyhow::{bail, Context, Result};
use std::path::Path;
use std::str::FromStr;

fn session_service(api: &ApiClientRef) -> SessionService {
    SessionService::new(
        api.clone(),
        Sessions::new(&Config::get_path(ConfigKey::DataDir)),
    )
}

/// State for `--session-id`, restored from disk when it was saved before.
/// Without an id a fresh session is started unless one is required.
async fn current_state(sessions: &SessionService, required: bool) -> Result<AppState> {
    let id = Config::get(ConfigKey::SessionId);
    if id.is_empty() {
        if required {
            bail!("No session given, pass --session-id or set ANALYST_SESSION_ID");
        }
        return Ok(AppState::new(&Sessions::create_id()));
    }

    let mut state = AppState::new(&id);
    if sessions.sessions().exists(&id).await {
        state.load_session(sessions.sessions().load(&id).await?);
    }
    Ok(state)
}

/// Fresh state holding the server's document list.
async fn document_state(documents: &DocumentService) -> Result<AppState> {
    let mut state = AppState::new(&Config::get(ConfigKey::SessionId));
    documents.refresh(&mut state).await?;
    Ok(state)
}

pub async fn send(api: ApiClientRef, message: &str) -> Result<()> {
    let sessions = session_service(&api);
    let mut state = current_state(&sessions, false).await?;
    let chat = ChatService::new(api);

    let events = chat.send_message(&mut state, message).await?;
    sessions.save(&state).await?;

    for event in &events {
        match event {
            Event::MessageAdded(message) if message.role == Role::Assistant => {
                println!("{}", message.content)
            }
            Event::DocumentReady(document) => eprintln!("Document ready: {}", document.filename),
            _ => {}
        }
    }
    eprintln!("{}", render::render_layer_summary(&state.layers));
    eprintln!("Session: {}", state.session_id());
    Ok(())
}

pub async fn health(api: ApiClientRef) -> Result<()> {
    let health = api.health_check().await?;
    match health.timestamp {
        Some(timestamp) => println!("{} ({})", health.status, timestamp),
        None => println!("{}", health.status),
    }
    Ok(())
}

pub async fn info(api: ApiClientRef) -> Result<()> {
    let info = api.service_info().await?;
    println!("{}", render::render_service_info(&info));
    Ok(())
}

pub async fn session_show(api: ApiClientRef) -> Result<()> {
    let sessions = session_service(&api);
    let state = current_state(&sessions, true).await?;

    let info = sessions.remote_info(&state).await?;
    println!("{}", render::render_session_info(&info));
    if state.chat.message_count() > 0 {
        println!("  saved:    {} messages", state.chat.message_count());
        println!("{}", render::render_layers(&state.layers));
    }
    Ok(())
}

pub async fn session_reset(api: ApiClientRef) -> Result<()> {
    let sessions = session_service(&api);
    let mut state = current_state(&sessions, true).await?;

    sessions.reset_remote(&mut state).await?;
    println!("Session {} reset.", state.session_id());
    Ok(())
}

pub async fn session_list(api: ApiClientRef) -> Result<()> {
    let sessions = session_service(&api);
    let list = sessions.list().await?;
    println!(
        "{}",
        render::render_sessions(&list, &Config::get(ConfigKey::SessionId))
    );
    Ok(())
}

pub async fn session_delete(api: ApiClientRef, id: &str) -> Result<()> {
    let sessions = session_service(&api);
    let state = current_state(&sessions, false).await?;
    if !sessions.delete(&state, id).await? {
        bail!("No saved session {}", id);
    }
    println!("Deleted session {}", id);
    Ok(())
}

pub async fn documents_list(api: ApiClientRef) -> Result<()> {
    let documents = DocumentService::new(api);
    let state = document_state(&documents).await?;
    println!("{}", render::render_documents(state.documents.list()));
    Ok(())
}

pub async fn documents_download(api: ApiClientRef, reference: &str) -> Result<()> {
    let documents = DocumentService::new(api);
    let state = document_state(&documents).await?;
    let document = match state.documents.resolve(reference) {
        Some(document) => document,
        None => bail!("No document {}, see `analyst documents list`", reference),
    };

    let path = documents
        .download(document, &Config::get_path(ConfigKey::DownloadDir))
        .await?;
    println!("Saved {}", path.display());
    Ok(())
}

pub async fn documents_delete(api: ApiClientRef, reference: &str) -> Result<()> {
    let documents = DocumentService::new(api);
    let mut state = document_state(&documents).await?;
    let document = documents.delete(&mut state, reference).await?;
    println!("Deleted {}", document.filename);
    Ok(())
}

/// Export a markdown file, a saved session's transcript or a generated
/// document, tried in that order.
pub async fn export(api: ApiClientRef, source: &str, format: &str) -> Result<()> {
    let format = ExportFormat::from_str(format)
        .with_context(|| format!("Unknown export format {}", format))?;
    let exports = ExportService::new(&Config::get_path(ConfigKey::ExportDir));

    let path = Path::new(source);
    if path.is_file() {
        let markdown = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let title = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| "document".to_string());
        let exported = exports.export_markdown(&title, &markdown, format).await?;
        println!("Exported {}", exported.display());
        return Ok(());
    }

    let sessions = session_service(&api);
    if sessions.sessions().exists(source).await {
        let mut state = AppState::new(source);
        state.load_session(sessions.sessions().load(source).await?);
        let exported = exports.export_transcript(&state, format).await?;
        println!("Exported {}", exported.display());
        return Ok(());
    }

    let documents = DocumentService::new(api);
    let state = document_state(&documents).await?;
    let document = match state.documents.resolve(source) {
        Some(document) => document,
        None => bail!("Nothing to export: {} is not a file, saved session or document", source),
    };
    let exported = exports.export_document(&documents, document, format).await?;
    println!("Exported {}", exported.display());
    Ok(())
}

pub async fn admin_sessions(api: ApiClientRef) -> Result<()> {
    let sessions = api.list_admin_sessions().await?;
    if sessions.is_empty() {
        println!("No active sessions.");
        return Ok(());
    }

    for session in sessions {
        let doc_type = session
            .doc_type
            .map(|doc_type| doc_type.display_name())
            .unwrap_or("unclassified");
        println!(
            "{}  {}  {}  {} messages  {}{}",
            session.session_id,
            session.status,
            doc_type,
            session.messages_count,
            render::progress_bar(session.progress),
            if session.websocket_active { "  live" } else { "" }
        );
    }
    Ok(())
}

pub async fn admin_cleanup(api: ApiClientRef) -> Result<()> {
    let cleanup = api.cleanup_sessions().await?;
    println!("Cleaned {} idle sessions.", cleanup.cleaned_sessions);
    Ok(())
}
