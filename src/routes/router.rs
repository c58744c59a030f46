use crate::cors::CorsRegistry;
use crate::middleware::{cors_middleware, request_id_middleware};
use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use serde_json::json;
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use super::comptes_handlers;
use super::health;
use super::AppState;

/// Maximum accepted request body size
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Create application router
///
/// The CORS middleware wraps every route and the fallback, so rules apply
/// to unknown paths under a mapped prefix as well.
pub fn create_router(state: Arc<AppState>, cors: Arc<CorsRegistry>) -> axum::Router {
    let banque_routes = axum::Router::new()
        .route(
            "/banque/comptes",
            get(comptes_handlers::list_comptes).post(comptes_handlers::create_compte),
        )
        .route(
            "/banque/comptes/{id}",
            get(comptes_handlers::get_compte)
                .put(comptes_handlers::update_compte)
                .delete(comptes_handlers::delete_compte),
        )
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES));

    // Health check endpoint, outside any CORS mapping by default
    let health_routes = axum::Router::new().route("/health", get(health::health_check));

    banque_routes
        .merge(health_routes)
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(cors, cors_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "NOT_FOUND",
            "message": "Resource not found",
        })),
    )
}
