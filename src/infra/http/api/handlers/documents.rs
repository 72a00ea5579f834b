//! Document CRUD handlers

use axum::Json;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::application::documents::{CreateDocumentCommand, UpdateDocumentCommand};

use super::document_to_api;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

/// Malformed ids cannot name a stored document, so they are reported the
/// same way as unknown ones.
fn parse_document_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::not_found("document not found"))
}

pub async fn list_documents(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let documents = state.documents.list().await.map_err(document_to_api)?;
    let body: Vec<DocumentResponse> = documents.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

pub async fn get_document(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_document_id(&id)?;
    let document = state.documents.get(id).await.map_err(document_to_api)?;
    Ok(Json(DocumentResponse::from(document)))
}

pub async fn create_document(
    State(state): State<ApiState>,
    Json(payload): Json<DocumentCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = CreateDocumentCommand {
        title: payload.title,
        content: payload.content,
    };
    let document = state
        .documents
        .create(command)
        .await
        .map_err(document_to_api)?;
    Ok(Json(DocumentResponse::from(document)))
}

pub async fn update_document(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(payload): Json<DocumentUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = UpdateDocumentCommand {
        id: parse_document_id(&id)?,
        title: payload.title,
        content: payload.content,
    };
    let document = state
        .documents
        .update(command)
        .await
        .map_err(document_to_api)?;
    Ok(Json(DocumentResponse::from(document)))
}

pub async fn delete_document(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_document_id(&id)?;
    state.documents.delete(id).await.map_err(document_to_api)?;
    Ok(Json(MessageResponse::new("Document deleted")))
}
