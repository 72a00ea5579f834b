use std::sync::Arc;

use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    CreateDocumentParams, DOCUMENT_LIST_LIMIT, DocumentsRepo, DocumentsWriteRepo, RepoError,
    UpdateDocumentParams,
};
use crate::domain::{entities::DocumentRecord, error::DomainError};

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("document not found")]
    NotFound,
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(RepoError),
}

impl From<RepoError> for DocumentError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => DocumentError::NotFound,
            other => DocumentError::Repo(other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateDocumentCommand {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct UpdateDocumentCommand {
    pub id: Uuid,
    pub title: Option<String>,
    pub content: Option<String>,
}

/// CRUD over saved editor documents. Independent of the compile pipeline.
#[derive(Clone)]
pub struct DocumentService {
    reader: Arc<dyn DocumentsRepo>,
    writer: Arc<dyn DocumentsWriteRepo>,
}

impl DocumentService {
    pub fn new(reader: Arc<dyn DocumentsRepo>, writer: Arc<dyn DocumentsWriteRepo>) -> Self {
        Self { reader, writer }
    }

    pub async fn list(&self) -> Result<Vec<DocumentRecord>, DocumentError> {
        Ok(self.reader.list_documents(DOCUMENT_LIST_LIMIT).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<DocumentRecord, DocumentError> {
        self.reader
            .find_document(id)
            .await?
            .ok_or(DocumentError::NotFound)
    }

    pub async fn create(
        &self,
        command: CreateDocumentCommand,
    ) -> Result<DocumentRecord, DocumentError> {
        let title = normalize_title(command.title)?;
        let params = CreateDocumentParams {
            id: Uuid::new_v4(),
            title,
            content: command.content,
            now: OffsetDateTime::now_utc(),
        };
        Ok(self.writer.create_document(params).await?)
    }

    pub async fn update(
        &self,
        command: UpdateDocumentCommand,
    ) -> Result<DocumentRecord, DocumentError> {
        let title = command.title.map(normalize_title).transpose()?;
        let params = UpdateDocumentParams {
            id: command.id,
            title,
            content: command.content,
            now: OffsetDateTime::now_utc(),
        };
        Ok(self.writer.update_document(params).await?)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), DocumentError> {
        Ok(self.writer.delete_document(id).await?)
    }
}

fn normalize_title(title: String) -> Result<String, DomainError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("document title must not be blank"));
    }
    if trimmed.len() == title.len() {
        Ok(title)
    } else {
        Ok(trimmed.to_string())
    }
}
