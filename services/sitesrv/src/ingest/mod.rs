//! Upload ingestion pipeline
//!
//! Uploaded workbooks pass through three stages: decoding into a cell table
//! ([`workbook`]), row-level validation ([`validate`]), and coercion into
//! typed site records ([`normalize`]).

pub mod normalize;
pub mod validate;
pub mod workbook;
