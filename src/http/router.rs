//! Route table for the ifc2glb API

use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, middleware, routing::get, Router};
use tower_http::cors::CorsLayer;

use crate::core::services::Services;
use crate::http::{handlers, middleware as http_middleware};

/// Build the application router
///
/// `/convert_ifc_to_glb` answers GET as well as POST; a GET carries no
/// form and is rejected as a bad request.
pub fn build_router(services: Arc<Services>) -> Router {
    let body_limit = services.config.max_upload_bytes();

    Router::new()
        .route("/", get(handlers::index_handler))
        .route("/health", get(handlers::health_handler))
        .route(
            "/convert_ifc_to_glb",
            get(handlers::convert_handler).post(handlers::convert_handler),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(http_middleware::log_request))
        .layer(CorsLayer::permissive())
        .with_state(services)
}
