pub mod api;
mod middleware;

pub use api::{ApiState, build_api_router};
pub use middleware::RequestContext;

use axum::{
    Router,
    http::{HeaderValue, StatusCode},
    middleware as axum_middleware,
    response::{IntoResponse, Response},
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::{
    application::{error::ErrorReport, repos::RepoError},
    config::CorsSettings,
    infra::error::InfraError,
};

/// Assembles the full application router: API routes, CORS and the request
/// context/logging middleware.
pub fn build_router(state: ApiState, cors: &CorsSettings) -> Result<Router, InfraError> {
    let cors = cors_layer(cors)?;
    Ok(build_api_router(state)
        .layer(cors)
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .layer(axum_middleware::from_fn(middleware::set_request_context)))
}

fn cors_layer(settings: &CorsSettings) -> Result<CorsLayer, InfraError> {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if settings.allows_any_origin() {
        return Ok(layer.allow_origin(Any));
    }

    let origins = settings
        .allowed_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin).map_err(|err| {
                InfraError::configuration(format!("invalid CORS origin `{origin}`: {err}"))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(layer.allow_origin(AllowOrigin::list(origins)))
}

fn db_health_response(result: Result<(), RepoError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unparseable_origin() {
        let settings = CorsSettings {
            allowed_origins: vec!["http://ok.test".into(), "bad\norigin".into()],
        };
        let err = cors_layer(&settings).expect_err("invalid origin");
        assert!(err.to_string().contains("bad"));
    }

    #[test]
    fn health_failure_maps_to_service_unavailable() {
        let response = db_health_response(Err(RepoError::Timeout));
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let report = response.extensions().get::<ErrorReport>().expect("report");
        assert_eq!(report.messages[0], "database timeout");
    }
}
