//! SwapTrack basic library
//!
//! Provides basic functions shared by all services, including:
//! - SQLite connection pool wrapper
//! - API envelope and health types
//! - logging functions
//! - service bootstrap helpers

#[cfg(feature = "sqlite")]
pub mod sqlite;

// Common modules
pub mod api_types;
pub mod logging;
pub mod service_bootstrap;
pub mod shutdown;

// Re-export commonly used API types
pub use api_types::{
    ComponentHealth,
    DataResponse,
    ErrorBody,
    HealthStatus,
    ServiceStatus,
};

// Re-export AppError when axum feature is enabled
#[cfg(feature = "axum")]
pub use api_types::AppError;

// Bootstrap modules
pub mod bootstrap_args;

// Re-export common dependencies
pub use anyhow;
pub use serde;
pub use serde_json;
pub use tokio;

// Re-export CLI dependencies when cli feature is enabled
#[cfg(feature = "cli")]
pub use clap;

// Re-export clap derive macros separately for proper macro resolution
#[cfg(feature = "cli")]
pub use clap::{Args, Parser, Subcommand, ValueEnum};
