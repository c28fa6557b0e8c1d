//! Spreadsheet upload handler
//!
//! Accepts a multipart form with a single `file` field carrying an `.xlsx`
//! or `.csv` export, runs it through the parse → validate → normalize
//! pipeline, and upserts the rows in one transaction.

use axum::{
    extract::{Multipart, State},
    response::Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::{Result, SiteSrvError};
use crate::ingest::normalize::normalize_rows;
use crate::ingest::validate::validate_rows;
use crate::ingest::workbook::{parse_workbook, FileFormat};

/// Upload acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadReport {
    /// Confirmation message shown to the operator
    pub message: String,
    /// Number of rows written in this upload
    #[serde(rename = "dataCount")]
    pub data_count: usize,
}

/// Upload a site spreadsheet
///
/// @route POST /api/sites/upload
/// @input Multipart form with a `file` field (.xlsx or .csv)
/// @output `Json<UploadReport>` - Confirmation with written row count
/// @status 200 - File parsed, validated and stored
/// @status 400 - Missing file, unreadable workbook, or failed validation
/// @status 500 - Database failure while storing rows
#[utoipa::path(
    post,
    path = "/api/sites/upload",
    request_body(content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File parsed, validated and stored", body = UploadReport),
        (status = 400, description = "Missing file, unreadable workbook, or failed validation"),
        (status = 500, description = "Database failure while storing rows")
    ),
    tag = "sitesrv"
)]
pub async fn upload_sites(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadReport>> {
    let upload_id = Uuid::new_v4();

    let Some((file_name, payload)) = read_file_field(&mut multipart).await? else {
        warn!(%upload_id, "Upload rejected: no file field in form");
        return Err(SiteSrvError::no_file_uploaded());
    };

    info!(%upload_id, file = %file_name, size = payload.len(), "Upload received");

    let format = FileFormat::from_filename(&file_name)
        .ok_or_else(|| SiteSrvError::parse(format!("Unsupported file extension: {file_name}")))?;

    let table = parse_workbook(&payload, format)?;
    debug!(%upload_id, rows = table.len(), "Workbook parsed");

    validate_rows(&table).map_err(|e| {
        warn!(%upload_id, "Upload rejected: {e}");
        e
    })?;
    debug!(%upload_id, "Validation passed");

    let records = normalize_rows(&table);
    let written = state.store.upsert_batch(&records).await.map_err(|e| {
        warn!(%upload_id, "Upload rolled back: {e}");
        e
    })?;

    info!(%upload_id, rows = written, "Upload committed");

    Ok(Json(UploadReport {
        message: "File berhasil diunggah dan divalidasi".to_string(),
        data_count: written,
    }))
}

/// Pull the first `file` field out of the multipart form
async fn read_file_field(multipart: &mut Multipart) -> Result<Option<(String, Bytes)>> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let payload = field.bytes().await?;
        return Ok(Some((file_name, payload)));
    }
    Ok(None)
}
