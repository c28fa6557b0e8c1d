//! Site Service configuration
//!
//! Loaded from `config/sitesrv.yaml`, with `SITESRV_*` environment variables
//! taking precedence (e.g. `SITESRV_SERVICE_PORT=9000`).

use figment::{
    providers::{Env, Format, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SiteSrvError};

/// Default HTTP port for the service
pub const DEFAULT_PORT: u16 = 8090;

/// HTTP service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service name used in logs and health output
    #[serde(default = "default_service_name")]
    pub name: String,
    /// Host address to bind
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database file path
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Upload limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Maximum accepted upload size in bytes
    #[serde(default = "default_upload_limit")]
    pub limit: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            limit: default_upload_limit(),
        }
    }
}

/// Complete service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub upload: UploadConfig,
}

fn default_service_name() -> String {
    "sitesrv".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_db_path() -> String {
    "data/swaptrack.db".to_string()
}

fn default_upload_limit() -> usize {
    10 * 1024 * 1024
}

impl Config {
    /// Load configuration from the default file location
    pub fn load() -> Result<Self> {
        Self::load_from("config/sitesrv.yaml")
    }

    /// Load configuration from an explicit file path
    pub fn load_from(path: &str) -> Result<Self> {
        let config: Config = Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed("SITESRV_").split("_"))
            .extract()?;

        config.validate()?;
        Ok(config)
    }

    /// Socket address string for the HTTP listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.service.host, self.service.port)
    }

    /// Validate configuration completeness
    pub fn validate(&self) -> Result<()> {
        if self.service.name.is_empty() {
            return Err(SiteSrvError::config("Service name cannot be empty"));
        }
        if self.service.port == 0 {
            return Err(SiteSrvError::config("Service port cannot be 0"));
        }
        if self.database.path.is_empty() {
            return Err(SiteSrvError::config("Database path cannot be empty"));
        }
        if self.upload.limit == 0 {
            return Err(SiteSrvError::config("Upload size limit cannot be 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.service.name, "sitesrv");
        assert_eq!(config.bind_address(), "0.0.0.0:8090");
        assert_eq!(config.database.path, "data/swaptrack.db");
        assert_eq!(config.upload.limit, 10 * 1024 * 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_remaining_defaults() {
        let config: Config = Figment::new()
            .merge(Yaml::string("service:\n  port: 9100\n"))
            .extract()
            .unwrap();
        assert_eq!(config.service.port, 9100);
        assert_eq!(config.service.host, "0.0.0.0");
        assert_eq!(config.database.path, "data/swaptrack.db");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.service.port = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.database.path.clear();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.upload.limit = 0;
        assert!(config.validate().is_err());
    }
}
