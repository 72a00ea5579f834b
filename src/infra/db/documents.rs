use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::repos::{
        CreateDocumentParams, DocumentsRepo, DocumentsWriteRepo, RepoError, UpdateDocumentParams,
    },
    domain::entities::DocumentRecord,
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct DocumentRow {
    id: Uuid,
    title: String,
    content: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<DocumentRow> for DocumentRecord {
    fn from(row: DocumentRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            content: row.content,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl DocumentsRepo for PostgresRepositories {
    async fn list_documents(&self, limit: u32) -> Result<Vec<DocumentRecord>, RepoError> {
        let rows = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT id, title, content, created_at, updated_at
            FROM documents
            ORDER BY updated_at DESC, id
            LIMIT $1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(DocumentRecord::from).collect())
    }

    async fn find_document(&self, id: Uuid) -> Result<Option<DocumentRecord>, RepoError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT id, title, content, created_at, updated_at
            FROM documents
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(DocumentRecord::from))
    }
}

#[async_trait]
impl DocumentsWriteRepo for PostgresRepositories {
    async fn create_document(
        &self,
        params: CreateDocumentParams,
    ) -> Result<DocumentRecord, RepoError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            INSERT INTO documents (id, title, content, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING id, title, content, created_at, updated_at
            "#,
        )
        .bind(params.id)
        .bind(params.title)
        .bind(params.content)
        .bind(params.now)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn update_document(
        &self,
        params: UpdateDocumentParams,
    ) -> Result<DocumentRecord, RepoError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            UPDATE documents
            SET title = COALESCE($2, title),
                content = COALESCE($3, content),
                updated_at = $4
            WHERE id = $1
            RETURNING id, title, content, created_at, updated_at
            "#,
        )
        .bind(params.id)
        .bind(params.title)
        .bind(params.content)
        .bind(params.now)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(DocumentRecord::from).ok_or(RepoError::NotFound)
    }

    async fn delete_document(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
