//! Unified service bootstrap utilities
//!
//! Provides common initialization functionality for SwapTrack services,
//! including startup banners, logging initialization, and environment setup.

use crate::logging::{self, LogConfig};
use tracing::{info, Level};

/// Service metadata for startup
pub struct ServiceInfo {
    /// Service name (e.g., "sitesrv")
    pub name: String,
    /// Service version from Cargo.toml
    pub version: String,
    /// Service description
    pub description: String,
    /// Default port
    pub default_port: u16,
}

impl ServiceInfo {
    /// Create new service info
    pub fn new(name: impl Into<String>, description: impl Into<String>, default_port: u16) -> Self {
        Self {
            name: name.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: description.into(),
            default_port,
        }
    }
}

/// Print unified startup banner for any service
pub fn print_startup_banner(service: &ServiceInfo) {
    // Generate ASCII art based on service name
    let banner = match service.name.as_str() {
        "sitesrv" => {
            r#"
 ███████╗██╗████████╗███████╗███████╗██████╗ ██╗   ██╗
 ██╔════╝██║╚══██╔══╝██╔════╝██╔════╝██╔══██╗██║   ██║
 ███████╗██║   ██║   █████╗  ███████╗██████╔╝██║   ██║
 ╚════██║██║   ██║   ██╔══╝  ╚════██║██╔══██╗╚██╗ ██╔╝
 ███████║██║   ██║   ███████╗███████║██║  ██║ ╚████╔╝
 ╚══════╝╚═╝   ╚═╝   ╚══════╝╚═╝  ╚═╝╚═╝  ╚═╝  ╚═══╝
            "#
        },
        _ => {
            // Generic banner for other services
            r#"
 ███████╗██╗    ██╗ █████╗ ██████╗
 ██╔════╝██║    ██║██╔══██╗██╔══██╗
 ███████╗██║ █╗ ██║███████║██████╔╝
 ╚════██║██║███╗██║██╔══██║██╔═══╝
 ███████║╚███╔███╔╝██║  ██║██║
 ╚══════╝ ╚══╝╚══╝ ╚═╝  ╚═╝╚═╝
            "#
        },
    };

    info!("{}", banner);
    info!("");
    info!(" {} v{}", service.name.to_uppercase(), service.version);
    info!(" {}", service.description);
    info!(" Default Port: {}", service.default_port);
    info!("");
}

/// Initialize logging for a service with standard configuration
///
/// Log root directory priority:
/// 1. SWAPTRACK_LOG_DIR environment variable
/// 2. `log_dir` from the loaded configuration
/// 3. Default "logs"
pub fn init_logging(service: &ServiceInfo, log_dir: Option<&str>) -> anyhow::Result<()> {
    // Initialize log root directory from config or environment
    crate::logging::init_log_root(log_dir);

    // Check RUST_LOG environment variable for log level
    let console_level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|s| s.parse::<Level>().ok())
        .unwrap_or(Level::INFO);

    // Get log directory with service name subdirectory
    let log_dir = crate::logging::get_log_root().join(&service.name);

    let log_config = LogConfig {
        service_name: service.name.clone(),
        log_dir,
        file_level: Level::DEBUG,
        console_level,
        enable_json: false,
        enable_api_log: true,
        api_log_level: Level::INFO,
    };

    // Initialize the logging system
    logging::init_with_config(log_config).map_err(|e| anyhow::anyhow!("{}", e))?;

    Ok(())
}

/// Load environment variables in development mode
///
/// In debug builds, reads .env file and sets environment variables.
/// In release builds, this is a no-op (production environments should set variables externally).
pub fn load_development_env() {
    #[cfg(debug_assertions)]
    {
        if let Ok(content) = std::fs::read_to_string(".env") {
            for line in content.lines() {
                // Skip comments and empty lines
                let trimmed = line.trim();
                if trimmed.starts_with('#') || trimmed.is_empty() {
                    continue;
                }

                // Parse KEY=VALUE format
                if let Some((key, value)) = trimmed.split_once('=') {
                    let key = key.trim();
                    let value = value.trim();

                    // Only set if not already set
                    if std::env::var(key).is_err() {
                        std::env::set_var(key, value);
                    }
                }
            }
        }
    }

    // No-op in release builds - production environments should set environment variables externally
}

/// Helper to get service port from configuration or environment
pub fn get_service_port(config_port: u16, service: &ServiceInfo) -> u16 {
    // Check if config port is default
    let is_default = config_port == 0 || config_port == service.default_port;

    if is_default {
        // Try SERVICE_PORT first (unified across all services)
        if let Ok(port) = std::env::var("SERVICE_PORT") {
            if let Ok(p) = port.parse::<u16>() {
                return p;
            }
        }

        // Fallback to service-specific environment variable
        let env_var = format!("{}_PORT", service.name.to_uppercase());
        if let Ok(port) = std::env::var(&env_var) {
            if let Ok(p) = port.parse::<u16>() {
                return p;
            }
        }
    }

    // Return config port or default
    if config_port > 0 {
        config_port
    } else {
        service.default_port
    }
}
