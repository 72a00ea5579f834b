pub mod error;
pub mod handlers;
pub mod models;
pub mod state;

pub use state::ApiState;

use axum::{
    Router,
    routing::{get, post},
};

pub fn build_api_router(state: ApiState) -> Router {
    Router::new()
        .route("/api/", get(handlers::index))
        .route("/api/compile", post(handlers::compile))
        .route("/api/export/{format}", post(handlers::export))
        .route(
            "/api/documents",
            get(handlers::list_documents).post(handlers::create_document),
        )
        .route(
            "/api/documents/{id}",
            get(handlers::get_document)
                .put(handlers::update_document)
                .delete(handlers::delete_document),
        )
        .route("/api/templates", get(handlers::list_templates))
        .route("/api/templates/{id}", get(handlers::get_template))
        .route("/api/_health/db", get(handlers::db_health))
        .with_state(state)
}
