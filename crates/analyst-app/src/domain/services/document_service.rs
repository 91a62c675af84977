#[cfg(test)]
#[path = "document_service_test.rs"]
mod tests;

use std::path::Path;
use std::path::PathBuf;

use analyst_client::ApiClientRef;
use analyst_types::DocumentPayload;
use anyhow::bail;
use anyhow::Context;
use anyhow::Result;
use tokio::fs;

use super::AppState;
use crate::domain::models::Document;
use crate::domain::models::DocumentStatus;

pub struct DocumentService {
    api: ApiClientRef,
}

impl DocumentService {
    pub fn new(api: ApiClientRef) -> DocumentService {
        return DocumentService { api };
    }

    /// Pull the server's document list into the store. Returns how many
    /// documents the server reported.
    pub async fn refresh(&self, state: &mut AppState) -> Result<usize> {
        let documents = self.api.list_documents().await?;
        let count = documents.len();

        // Oldest first so the newest ends up at the front.
        for info in documents.into_iter().rev() {
            state
                .documents
                .upsert(&DocumentPayload::from(info), DocumentStatus::Ready);
        }

        tracing::debug!(count, "refreshed documents");
        return Ok(count);
    }

    pub async fn fetch(&self, document: &Document) -> Result<Vec<u8>> {
        let bytes = self
            .api
            .download_document(&document.filename)
            .await
            .with_context(|| format!("Failed to download {}", document.filename))?;
        return Ok(bytes);
    }

    /// Save a document into `dir` under its own file name.
    pub async fn download(&self, document: &Document, dir: &Path) -> Result<PathBuf> {
        let name = match Path::new(&document.filename).file_name() {
            Some(name) => name.to_owned(),
            None => bail!("Document has no usable file name: {}", document.filename),
        };

        let bytes = self.fetch(document).await?;
        fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        let path = dir.join(name);
        fs::write(&path, bytes).await?;

        tracing::info!(path = %path.display(), "downloaded document");
        return Ok(path);
    }

    /// Delete on the server, then locally. A document the server no longer
    /// has is still removed from the store.
    pub async fn delete(&self, state: &mut AppState, reference: &str) -> Result<Document> {
        let document = match state.documents.resolve(reference) {
            Some(document) => document.clone(),
            None => bail!("Unknown document '{reference}'"),
        };

        if let Err(err) = self.api.delete_document(&document.filename).await {
            if !err.is_not_found() {
                return Err(err.into());
            }
            tracing::warn!(filename = %document.filename, "document already gone on the server");
        }

        state.documents.remove(&document.id);
        return Ok(document);
    }

    pub fn documents_for_session<'a>(
        &self,
        state: &'a AppState,
        session_id: &str,
    ) -> Vec<&'a Document> {
        return state.documents.for_session(session_id);
    }
}
