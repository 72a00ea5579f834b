//! Live preview and file export handlers

use axum::Json;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::application::compile::ExportArtifact;
use crate::domain::types::ExportFormat;

use super::pipeline_to_api;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

/// Compile failures are part of the preview payload; only internal faults
/// turn into error statuses.
pub async fn compile(
    State(state): State<ApiState>,
    Json(payload): Json<CompileRequest>,
) -> Response {
    match state.pipeline.render_preview(&payload.content).await {
        Ok(outcome) => Json(CompileResponse::from(outcome)).into_response(),
        Err(err) => pipeline_to_api(err),
    }
}

pub async fn export(
    State(state): State<ApiState>,
    Path(format): Path<String>,
    Json(payload): Json<ExportRequest>,
) -> Result<Response, ApiError> {
    let format = format
        .parse::<ExportFormat>()
        .map_err(|_| ApiError::not_found("unknown export format"))?;
    if let Some(requested) = payload.format.as_deref() {
        let matches = requested
            .parse::<ExportFormat>()
            .is_ok_and(|requested| requested == format);
        if !matches {
            return Err(ApiError::bad_request(
                "format does not match the export route",
                Some(format!("route exports `{format}`, body asked for `{requested}`")),
            ));
        }
    }

    let outcome = match state.pipeline.render_export(format, &payload.content).await {
        Ok(outcome) => outcome,
        Err(err) => return Ok(pipeline_to_api(err)),
    };
    let artifact = ExportArtifact::from_outcome(format, outcome).map_err(ApiError::compile)?;

    Ok((
        [
            (header::CONTENT_TYPE, artifact.content_type().to_string()),
            (header::CONTENT_DISPOSITION, artifact.content_disposition()),
        ],
        artifact.bytes,
    )
        .into_response())
}
