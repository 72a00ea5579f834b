//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::entities::DocumentRecord;

/// Upper bound on documents returned by a single listing.
pub const DOCUMENT_LIST_LIMIT: u32 = 1000;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct CreateDocumentParams {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub now: OffsetDateTime,
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone)]
pub struct UpdateDocumentParams {
    pub id: Uuid,
    pub title: Option<String>,
    pub content: Option<String>,
    pub now: OffsetDateTime,
}

#[async_trait]
pub trait DocumentsRepo: Send + Sync {
    /// Most recently updated first.
    async fn list_documents(&self, limit: u32) -> Result<Vec<DocumentRecord>, RepoError>;

    async fn find_document(&self, id: Uuid) -> Result<Option<DocumentRecord>, RepoError>;
}

#[async_trait]
pub trait DocumentsWriteRepo: Send + Sync {
    async fn create_document(
        &self,
        params: CreateDocumentParams,
    ) -> Result<DocumentRecord, RepoError>;

    /// Fails with [`RepoError::NotFound`] when the id is unknown.
    async fn update_document(
        &self,
        params: UpdateDocumentParams,
    ) -> Result<DocumentRecord, RepoError>;

    /// Fails with [`RepoError::NotFound`] when the id is unknown.
    async fn delete_document(&self, id: Uuid) -> Result<(), RepoError>;
}

#[async_trait]
pub trait HealthRepo: Send + Sync {
    async fn ping(&self) -> Result<(), RepoError>;
}
