//! Site Service (SiteSrv)
//!
//! Spreadsheet ingestion and query service for telecom site swap tracking.

use std::net::SocketAddr;

use axum::serve;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
#[cfg(feature = "swagger-ui")]
use utoipa::OpenApi;
#[cfg(feature = "swagger-ui")]
use utoipa_swagger_ui::SwaggerUi;

use common::bootstrap_args::ServiceArgs;
use common::service_bootstrap::{self, ServiceInfo};
use common::shutdown::wait_for_shutdown;

use sitesrv::config::DEFAULT_PORT;
use sitesrv::error::{Result, SiteSrvError};
use sitesrv::routes::create_routes;
#[cfg(feature = "swagger-ui")]
use sitesrv::routes::SiteSrvApiDoc;
use sitesrv::{AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let args = ServiceArgs::parse();

    let service_info = ServiceInfo::new(
        "sitesrv",
        "Site Swap Tracking Service - Spreadsheet Ingestion and Query",
        DEFAULT_PORT,
    );

    // Bootstrap: development env, logging, banner
    service_bootstrap::load_development_env();
    service_bootstrap::init_logging(&service_info, None)?;
    if !args.no_color {
        service_bootstrap::print_startup_banner(&service_info);
    }

    // Load configuration, with CLI overrides on top
    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(db_path) = &args.db_path {
        config.database.path = db_path.clone();
    }

    // Validation mode: check configuration and exit
    if args.validate {
        info!("Configuration is valid");
        info!("  service: {} on {}", config.service.name, config.bind_address());
        info!("  database: {}", config.database.path);
        info!("  upload limit: {} bytes", config.upload.limit);
        return Ok(());
    }

    // Resolve bind address: CLI override, then env port override, then config
    let bind_addr = match &args.bind_address {
        Some(addr) => addr.clone(),
        None => {
            let port = service_bootstrap::get_service_port(config.service.port, &service_info);
            format!("{}:{}", config.service.host, port)
        },
    };
    let addr: SocketAddr = bind_addr
        .parse()
        .map_err(|e| SiteSrvError::config(format!("Invalid bind address {bind_addr}: {e}")))?;

    // Open the database and prepare the schema
    let state = AppState::new(config).await?;
    let app = create_routes(state);

    #[cfg(feature = "swagger-ui")]
    let app = {
        info!("Swagger UI enabled at /docs");
        app.merge(SwaggerUi::new("/docs").url("/openapi.json", SiteSrvApiDoc::openapi()))
    };

    let socket = tokio::net::TcpSocket::new_v4()
        .map_err(|e| SiteSrvError::io(format!("Failed to create socket: {e}")))?;
    socket
        .set_reuseaddr(true)
        .map_err(|e| SiteSrvError::io(format!("Failed to set SO_REUSEADDR: {e}")))?;
    socket
        .bind(addr)
        .map_err(|e| SiteSrvError::io(format!("Failed to bind to {addr}: {e}")))?;
    let listener = socket
        .listen(1024)
        .map_err(|e| SiteSrvError::io(format!("Failed to listen: {e}")))?;

    info!("API server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    let shutdown_token = CancellationToken::new();
    let server = serve(listener, app);
    let server_token = shutdown_token.clone();
    let server_handle = tokio::spawn(async move {
        let shutdown = async move { server_token.cancelled().await };
        if let Err(e) = server.with_graceful_shutdown(shutdown).await {
            error!("Server error: {}", e);
        }
    });

    wait_for_shutdown().await;
    info!("Shutdown signal received, stopping service");
    shutdown_token.cancel();
    if let Err(e) = server_handle.await {
        error!("Server task join error: {}", e);
    }
    info!("Site Service stopped");

    Ok(())
}
