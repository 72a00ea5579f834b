//! API handlers organized by resource type.
//!
//! Error conversions shared across the submodules live here.

mod compile;
mod documents;
mod templates;

pub use compile::*;
pub use documents::*;
pub use templates::*;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::application::compile::PipelineError;
use crate::application::documents::DocumentError;
use crate::application::error::ErrorReport;
use crate::application::repos::RepoError;
use crate::domain::error::DomainError;

use super::error::{ApiError, codes};
use super::models::MessageResponse;
use super::state::ApiState;

pub async fn index() -> impl IntoResponse {
    Json(MessageResponse::new("Rapid Typst API"))
}

pub async fn db_health(State(state): State<ApiState>) -> Response {
    crate::infra::http::db_health_response(state.health.ping().await)
}

pub(crate) fn repo_to_api(err: RepoError) -> ApiError {
    match err {
        RepoError::Duplicate { constraint } => ApiError::new(
            StatusCode::CONFLICT,
            codes::DUPLICATE,
            "Duplicate record",
            Some(constraint),
        ),
        RepoError::NotFound => ApiError::not_found("resource not found"),
        RepoError::InvalidInput { message } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid input",
            Some(message),
        ),
        RepoError::Integrity { message } => ApiError::new(
            StatusCode::CONFLICT,
            codes::INTEGRITY,
            "Integrity constraint violated",
            Some(message),
        ),
        RepoError::Timeout => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::DB_TIMEOUT,
            "Database timeout",
            None,
        ),
        RepoError::Persistence(msg) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::REPO,
            "Persistence error",
            Some(msg),
        ),
    }
}

pub(crate) fn domain_to_api(err: DomainError) -> ApiError {
    match err {
        DomainError::Validation { message } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid input",
            Some(message),
        ),
    }
}

pub(crate) fn document_to_api(err: DocumentError) -> ApiError {
    match err {
        DocumentError::NotFound => ApiError::not_found("document not found"),
        DocumentError::Domain(domain) => domain_to_api(domain),
        DocumentError::Repo(repo) => repo_to_api(repo),
    }
}

/// Pipeline errors never carry compiler diagnostics, so they are always 500s.
/// The full chain goes to the log via [`ErrorReport`].
pub(crate) fn pipeline_to_api(err: PipelineError) -> Response {
    let mut response = ApiError::internal(err.to_string()).into_response();
    ErrorReport::from_error(
        "infra::http::api::compile",
        StatusCode::INTERNAL_SERVER_ERROR,
        &err,
    )
    .attach(&mut response);
    response
}
