//! Template gallery handlers

use axum::Json;
use axum::extract::Path;
use axum::response::IntoResponse;

use crate::application::templates;

use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::*;

pub async fn list_templates() -> impl IntoResponse {
    let body: Vec<TemplateSummary> = templates::all().iter().map(Into::into).collect();
    Json(body)
}

pub async fn get_template(Path(id): Path<String>) -> Result<impl IntoResponse, ApiError> {
    templates::find(&id)
        .map(|template| Json(TemplateResponse::from(template)))
        .ok_or_else(|| ApiError::not_found("template not found"))
}
