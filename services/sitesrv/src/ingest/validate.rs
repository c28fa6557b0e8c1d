//! Row-level validation for uploaded site data
//!
//! The identity columns travel in pairs: a row that names a site must carry
//! both `site_id` and `site_name`. Messages are collected for every bad row
//! before the upload is rejected, so the operator fixes the sheet once.

use crate::error::{Result, SiteSrvError};
use crate::ingest::normalize::cell_to_string;
use crate::ingest::workbook::{Cell, SheetTable, FIRST_DATA_SHEET_ROW};

/// Validate the identity columns on every data row.
///
/// Rows that carry neither `site_id` nor `site_name` pass through untouched;
/// the storage layer later skips anything without a `system_key`. Row numbers
/// in the messages are 1-based sheet rows (data starts at row 3).
pub fn validate_rows(table: &SheetTable) -> Result<()> {
    let mut errors = Vec::new();

    for (index, row) in table.rows().iter().enumerate() {
        let row_number = index + FIRST_DATA_SHEET_ROW;
        let site_id = field(table, row, "site_id");
        let site_name = field(table, row, "site_name");

        if site_id.is_empty() && site_name.is_empty() {
            continue;
        }
        if site_id.is_empty() {
            errors.push(format!("Baris {row_number}: site_id tidak boleh kosong"));
        }
        if site_name.is_empty() {
            errors.push(format!("Baris {row_number}: site_name tidak boleh kosong"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(SiteSrvError::validation(errors))
    }
}

fn field(table: &SheetTable, row: &[Cell], name: &str) -> String {
    table.cell(row, name).map(cell_to_string).unwrap_or_default()
}
