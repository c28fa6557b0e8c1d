//! API Route Configuration
//!
//! Central route definition for all Site Service endpoints.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::limit::RequestBodyLimitLayer;
use utoipa::OpenApi;

use crate::api::health_handlers::health_check;
use crate::api::site_handlers::{list_sites, search_sites};
use crate::api::upload_handlers::upload_sites;
use crate::app_state::AppState;

// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::health_handlers::health_check,
        crate::api::site_handlers::list_sites,
        crate::api::site_handlers::search_sites,
        crate::api::upload_handlers::upload_sites
    ),
    components(
        schemas(
            crate::model::SiteSummary,
            crate::api::upload_handlers::UploadReport
        )
    ),
    tags(
        (name = "sitesrv", description = "Site swap ingestion and query API")
    )
)]
pub struct SiteSrvApiDoc;

/// Create all API routes with state
pub fn create_routes(state: AppState) -> Router {
    let upload_limit = state.config.upload.limit;

    Router::new()
        .route("/health", get(health_check))
        .route("/api/sites", get(list_sites))
        .route("/api/sites/search", get(search_sites))
        .route("/api/sites/upload", post(upload_sites))
        // Size ceiling applies before any parsing work happens
        .layer(RequestBodyLimitLayer::new(upload_limit))
        .layer(DefaultBodyLimit::disable())
        // Apply HTTP request logging middleware
        .layer(axum::middleware::from_fn(common::logging::http_request_logger))
        .with_state(state)
}
