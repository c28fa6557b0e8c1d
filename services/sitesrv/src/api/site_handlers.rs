//! Read endpoints for site data
//!
//! Serves the site summary projection, either the full table or a
//! substring search over site identifier and name.

use axum::{
    extract::{Query, State},
    response::Json,
};
use common::DataResponse;
use serde::Deserialize;
use tracing::debug;

use crate::app_state::AppState;
use crate::error::Result;
use crate::model::SiteSummary;

/// Search query parameters
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Substring matched against site_id and site_name
    pub q: Option<String>,
}

/// List all sites
///
/// @route GET /api/sites
/// @output `Json<DataResponse<SiteSummary>>` - All sites ordered by site_id
/// @status 200 - Success with {data: [...]}
/// @status 500 - Database error
#[utoipa::path(
    get,
    path = "/api/sites",
    responses(
        (status = 200, description = "All sites ordered by site_id", body = DataResponse<SiteSummary>),
        (status = 500, description = "Database error")
    ),
    tag = "sitesrv"
)]
pub async fn list_sites(State(state): State<AppState>) -> Result<Json<DataResponse<SiteSummary>>> {
    let rows = state.store.fetch_all().await?;
    debug!("Listed {} sites", rows.len());
    Ok(Json(DataResponse::new(rows)))
}

/// Search sites by identifier or name
///
/// A missing or blank `q` behaves like the unfiltered listing.
///
/// @route GET /api/sites/search?q={optional}
/// @output `Json<DataResponse<SiteSummary>>` - Matching sites ordered by site_id
/// @status 200 - Success with {data: [...]}
/// @status 500 - Database error
#[utoipa::path(
    get,
    path = "/api/sites/search",
    params(
        ("q" = Option<String>, Query, description = "Substring matched against site_id and site_name")
    ),
    responses(
        (status = 200, description = "Matching sites ordered by site_id", body = DataResponse<SiteSummary>),
        (status = 500, description = "Database error")
    ),
    tag = "sitesrv"
)]
pub async fn search_sites(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<DataResponse<SiteSummary>>> {
    let rows = match query.q.as_deref().map(str::trim) {
        Some(term) if !term.is_empty() => {
            debug!("Searching sites for {:?}", term);
            state.store.search(term).await?
        },
        _ => state.store.fetch_all().await?,
    };
    Ok(Json(DataResponse::new(rows)))
}
