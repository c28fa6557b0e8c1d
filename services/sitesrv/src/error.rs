//! Error handling for Site Service
//!
//! This module provides error type definitions and the HTTP response mapping
//! for the site data service. Client-facing labels on the canonical upload and
//! fetch paths are kept verbatim from the operator-facing frontend.

use axum::response::{IntoResponse, Response};
use common::{AppError, ErrorBody};
use thiserror::Error;

/// Site Service Error Type
#[derive(Error, Debug, Clone)]
pub enum SiteSrvError {
    /// Configuration loading or validation errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Input/Output operation errors
    #[error("IO error: {0}")]
    IoError(String),

    /// Malformed upload requests (missing file part, unsupported extension)
    #[error("Upload error: {0}")]
    UploadError(String),

    /// Workbook decode failures (corrupt archive, unreadable sheet)
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Row validation failures, one message per rejected row
    #[error("Validation failed for {} row(s)", .0.len())]
    ValidationError(Vec<String>),

    /// Database failures while persisting an upload
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Database failures while serving read queries
    #[error("Fetch error: {0}")]
    FetchError(String),

    /// Internal errors (unknown, general)
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Result type alias for Site Service
pub type Result<T> = std::result::Result<T, SiteSrvError>;

impl SiteSrvError {
    pub fn config(msg: impl Into<String>) -> Self {
        SiteSrvError::ConfigError(msg.into())
    }

    pub fn io(msg: impl Into<String>) -> Self {
        SiteSrvError::IoError(msg.into())
    }

    pub fn upload(msg: impl Into<String>) -> Self {
        SiteSrvError::UploadError(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        SiteSrvError::ParseError(msg.into())
    }

    pub fn validation(messages: Vec<String>) -> Self {
        SiteSrvError::ValidationError(messages)
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        SiteSrvError::StorageError(msg.into())
    }

    pub fn fetch(msg: impl Into<String>) -> Self {
        SiteSrvError::FetchError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        SiteSrvError::InternalError(msg.into())
    }

    /// Missing multipart file field on the upload endpoint
    pub fn no_file_uploaded() -> Self {
        SiteSrvError::UploadError("Tidak ada file yang diunggah".to_string())
    }
}

// ============================================================================
// From implementations for external error types
// ============================================================================

impl From<serde_json::Error> for SiteSrvError {
    fn from(err: serde_json::Error) -> Self {
        SiteSrvError::InternalError(format!("JSON: {err}"))
    }
}

impl From<figment::Error> for SiteSrvError {
    fn from(err: figment::Error) -> Self {
        SiteSrvError::ConfigError(err.to_string())
    }
}

impl From<anyhow::Error> for SiteSrvError {
    fn from(err: anyhow::Error) -> Self {
        SiteSrvError::InternalError(err.to_string())
    }
}

impl From<calamine::XlsxError> for SiteSrvError {
    fn from(err: calamine::XlsxError) -> Self {
        SiteSrvError::ParseError(err.to_string())
    }
}

impl From<csv::Error> for SiteSrvError {
    fn from(err: csv::Error) -> Self {
        SiteSrvError::ParseError(format!("CSV: {err}"))
    }
}

impl From<sqlx::Error> for SiteSrvError {
    fn from(err: sqlx::Error) -> Self {
        SiteSrvError::StorageError(err.to_string())
    }
}

impl From<axum::extract::multipart::MultipartError> for SiteSrvError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        SiteSrvError::UploadError(format!("Invalid multipart request: {err}"))
    }
}

// ============================================================================
// API Adaptation: SiteSrvError → AppError conversion
// ============================================================================

impl From<SiteSrvError> for AppError {
    fn from(err: SiteSrvError) -> Self {
        match err {
            SiteSrvError::UploadError(msg) => AppError::bad_request(msg),
            SiteSrvError::ParseError(msg) => {
                AppError::bad_request_with_details("Gagal membaca file Excel", vec![msg])
            },
            SiteSrvError::ValidationError(messages) => {
                AppError::bad_request_with_details("Validasi gagal", messages)
            },
            SiteSrvError::StorageError(msg) => AppError::new(
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::with_detail("Terjadi kesalahan saat mengunggah file", msg),
            ),
            SiteSrvError::FetchError(_) => {
                AppError::internal_error("Terjadi kesalahan saat mengambil data")
            },
            other => AppError::internal_error(other.to_string()),
        }
    }
}

impl IntoResponse for SiteSrvError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}
