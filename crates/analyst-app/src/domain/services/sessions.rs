#[cfg(test)]
#[path = "sessions_test.rs"]
mod tests;

use std::path::Path;
use std::path::PathBuf;

use anyhow::bail;
use anyhow::Context;
use anyhow::Result;
use tokio::fs;
use uuid::Uuid;

use crate::domain::models::Session;
use crate::domain::models::SessionMeta;

/// Session files under `<data_dir>/sessions`, one JSON file per session.
#[derive(Clone, Debug)]
pub struct Sessions {
    dir: PathBuf,
}

impl Sessions {
    pub fn new(data_dir: &Path) -> Sessions {
        return Sessions {
            dir: data_dir.join("sessions"),
        };
    }

    pub fn create_id() -> String {
        return Uuid::new_v4().to_string();
    }

    pub fn dir(&self) -> &Path {
        return &self.dir;
    }

    fn path(&self, id: &str) -> Result<PathBuf> {
        if id.is_empty() || id.contains('/') || id.contains('\\') || id.contains("..") {
            bail!("Invalid session id '{id}'");
        }
        return Ok(self.dir.join(format!("{id}.json")));
    }

    pub async fn save(&self, session: &Session) -> Result<()> {
        let path = self.path(&session.meta.id)?;
        fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;

        let json = serde_json::to_string_pretty(session)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &path).await?;

        tracing::debug!(session_id = %session.meta.id, path = %path.display(), "saved session");
        return Ok(());
    }

    pub async fn load(&self, id: &str) -> Result<Session> {
        let path = self.path(id)?;
        let json = fs::read_to_string(&path)
            .await
            .with_context(|| format!("Session '{id}' not found"))?;
        let session = serde_json::from_str::<Session>(&json)
            .with_context(|| format!("Session '{id}' is corrupt"))?;
        return Ok(session);
    }

    pub async fn exists(&self, id: &str) -> bool {
        return match self.path(id) {
            Ok(path) => fs::try_exists(path).await.unwrap_or(false),
            Err(_) => false,
        };
    }

    /// Metadata of every saved session, most recently updated first.
    /// Unreadable files are skipped.
    pub async fn list(&self) -> Result<Vec<SessionMeta>> {
        let mut sessions = vec![];
        if !fs::try_exists(&self.dir).await? {
            return Ok(sessions);
        }

        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| return ext.to_str()) != Some("json") {
                continue;
            }

            let parsed = fs::read_to_string(&path)
                .await
                .map_err(anyhow::Error::from)
                .and_then(|json| return Ok(serde_json::from_str::<Session>(&json)?));
            match parsed {
                Ok(session) => sessions.push(session.meta),
                Err(err) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %err,
                        "skipping unreadable session"
                    );
                }
            }
        }

        sessions.sort_by(|a, b| return b.updated_at.cmp(&a.updated_at));
        return Ok(sessions);
    }

    /// Returns false when there was nothing to delete.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let path = self.path(id)?;
        if !fs::try_exists(&path).await? {
            return Ok(false);
        }
        fs::remove_file(&path).await?;
        return Ok(true);
    }
}
