#[cfg(test)]
#[path = "document_store_test.rs"]
mod tests;

use analyst_types::DocumentPayload;

use crate::domain::models::Document;
use crate::domain::models::DocumentStatus;

/// Generated documents, newest first.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DocumentStore {
    documents: Vec<Document>,
}

impl DocumentStore {
    pub fn new() -> DocumentStore {
        return DocumentStore::default();
    }

    pub fn from_documents(documents: Vec<Document>) -> DocumentStore {
        return DocumentStore { documents };
    }

    pub fn list(&self) -> &[Document] {
        return &self.documents;
    }

    pub fn len(&self) -> usize {
        return self.documents.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.documents.is_empty();
    }

    /// Look up by id or filename.
    pub fn get(&self, key: &str) -> Option<&Document> {
        return self
            .documents
            .iter()
            .find(|document| return document.id == key || document.filename == key);
    }

    /// 1-based position in the list, as shown to the user.
    pub fn nth(&self, position: usize) -> Option<&Document> {
        if position == 0 {
            return None;
        }
        return self.documents.get(position - 1);
    }

    /// A list position as typed by the user, or an id or filename.
    pub fn resolve(&self, reference: &str) -> Option<&Document> {
        if let Ok(position) = reference.trim().parse::<usize>() {
            return self.nth(position);
        }
        return self.get(reference.trim());
    }

    /// Insert or shallow-merge a document. Returns the stored entry, or
    /// `None` when the payload carries neither an id nor a filename.
    pub fn upsert(
        &mut self,
        payload: &DocumentPayload,
        status: DocumentStatus,
    ) -> Option<&Document> {
        if let Some(idx) = self
            .documents
            .iter()
            .position(|document| return document.matches(payload))
        {
            let document = &mut self.documents[idx];
            document.merge(payload);
            document.status = status;
            return Some(&self.documents[idx]);
        }

        let mut document = Document::from_payload(payload)?;
        document.status = status;
        tracing::debug!(id = %document.id, doc_type = %document.doc_type, "new document");
        self.documents.insert(0, document);
        return self.documents.first();
    }

    pub fn remove(&mut self, key: &str) -> Option<Document> {
        let idx = self
            .documents
            .iter()
            .position(|document| return document.id == key || document.filename == key)?;
        return Some(self.documents.remove(idx));
    }

    pub fn for_session(&self, session_id: &str) -> Vec<&Document> {
        return self
            .documents
            .iter()
            .filter(|document| return document.session_id.as_deref() == Some(session_id))
            .collect();
    }

    pub fn clear(&mut self) {
        self.documents.clear();
    }
}
