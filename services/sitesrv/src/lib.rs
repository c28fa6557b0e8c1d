//! Site Service Library (SiteSrv)
//!
//! HTTP service that tracks telecom site swap progress. Operators upload the
//! vendor-issued tracking spreadsheet (`.xlsx` or `.csv`); the service decodes
//! it, validates row identity, normalizes date serials into absolute
//! timestamps, and upserts every row into a SQLite `sites` table keyed by
//! `system_key`. Read endpoints serve the summary projection and a substring
//! search over site identifier and name.
//!
//! # Architecture
//!
//! - **`ingest`**: workbook decoding, row validation, and normalization
//! - **`store`**: SQLite persistence with transactional batch upsert
//! - **`api`**: axum handlers for upload, listing, search, and health
//! - **`routes`**: router assembly and OpenAPI documentation
//!
//! Re-uploading an unchanged file is idempotent: the row count and every
//! field value stay the same.

pub mod api;
pub mod app_state;
pub mod config;
pub mod error;
pub mod ingest;
pub mod model;
pub mod routes;
pub mod store;

pub use app_state::AppState;
pub use config::Config;
pub use error::{Result, SiteSrvError};
