//! Health check handler
//!
//! Reports overall service health plus a SQLite probe with the current
//! site count.

use std::collections::HashMap;
use std::time::Instant;

use axum::{extract::State, response::Json};
use chrono::Utc;
use common::{ComponentHealth, HealthStatus, ServiceStatus};

use crate::app_state::AppState;
use crate::error::Result;

/// Health check endpoint
///
/// @route GET /health
/// @output `Json<HealthStatus>` - Service health with sqlite component check
/// @status 200 - Always responds; degraded status is carried in the body
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service health report", body = HealthStatus)
    ),
    tag = "sitesrv"
)]
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthStatus>> {
    let probe_start = Instant::now();

    let (status, sqlite) = match state.store.count().await {
        Ok(count) => (
            ServiceStatus::Healthy,
            ComponentHealth {
                status: ServiceStatus::Healthy,
                message: Some(format!("{count} sites stored")),
                duration_ms: probe_duration_ms(probe_start),
            },
        ),
        Err(e) => (
            ServiceStatus::Degraded,
            ComponentHealth {
                status: ServiceStatus::Unhealthy,
                message: Some(e.to_string()),
                duration_ms: probe_duration_ms(probe_start),
            },
        ),
    };

    let mut checks = HashMap::new();
    checks.insert("sqlite".to_string(), sqlite);

    Ok(Json(HealthStatus {
        status,
        service: state.config.service.name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        timestamp: Utc::now(),
        checks,
    }))
}

fn probe_duration_ms(start: Instant) -> Option<u64> {
    Some(u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX))
}
