//! Cell coercion and date conversion
//!
//! Turns the untyped cell table into typed [`SiteRecord`]s. Date cells may
//! arrive as spreadsheet serials, formatted text, or raw serial text; all
//! three convert to UTC timestamps, and anything unreadable degrades to NULL
//! rather than aborting the import.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::ingest::workbook::{Cell, SheetTable};
use crate::model::SiteRecord;

/// Day offset of the Unix epoch within the spreadsheet serial scheme
/// (serial 25569 is 1970-01-01).
const UNIX_EPOCH_SERIAL: f64 = 25569.0;

const SECONDS_PER_DAY: f64 = 86400.0;

/// Convert a spreadsheet date serial to a UTC timestamp.
///
/// Serial 45000 converts to 2023-03-15T00:00:00Z. Non-finite, negative, or
/// out-of-range serials return `None`.
pub fn excel_serial_to_datetime(serial: f64) -> Option<DateTime<Utc>> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let seconds = (serial - UNIX_EPOCH_SERIAL) * SECONDS_PER_DAY;
    let secs = seconds.floor() as i64;
    let nanos = ((seconds - seconds.floor()) * 1_000_000_000.0) as u32;
    DateTime::from_timestamp(secs, nanos)
}

/// Render a cell as the text stored in the free-form columns.
///
/// Integral floats drop the trailing `.0` so numeric site codes keep their
/// sheet spelling.
pub fn cell_to_string(cell: &Cell) -> String {
    match cell {
        Cell::Text(s) => s.trim().to_string(),
        Cell::Number(f) => {
            if f.fract() == 0.0 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        },
        Cell::DateTime(serial) => excel_serial_to_datetime(*serial)
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_default(),
        Cell::Bool(b) => b.to_string(),
        Cell::Empty => String::new(),
    }
}

/// Numeric view of a cell for the coordinate columns. Unparsable text
/// degrades to `None`.
pub fn cell_to_f64(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(f) => Some(*f),
        Cell::DateTime(serial) => Some(*serial),
        Cell::Text(s) => s.trim().parse::<f64>().ok(),
        Cell::Bool(_) | Cell::Empty => None,
    }
}

/// Calendar view of a cell for the milestone columns.
pub fn cell_to_datetime(cell: &Cell) -> Option<DateTime<Utc>> {
    match cell {
        Cell::DateTime(serial) | Cell::Number(serial) => excel_serial_to_datetime(*serial),
        Cell::Text(s) => parse_text_datetime(s),
        Cell::Bool(_) | Cell::Empty => None,
    }
}

fn parse_text_datetime(text: &str) -> Option<DateTime<Utc>> {
    let value = text.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%d/%m/%Y") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    // Formatted exports sometimes deliver the raw serial as text.
    if let Ok(serial) = value.parse::<f64>() {
        return excel_serial_to_datetime(serial);
    }
    None
}

/// Build site records from every data row of the decoded sheet.
pub fn normalize_rows(table: &SheetTable) -> Vec<SiteRecord> {
    table
        .rows()
        .iter()
        .map(|row| normalize_row(table, row))
        .collect()
}

fn normalize_row(table: &SheetTable, row: &[Cell]) -> SiteRecord {
    let text = |name: &str| table.cell(row, name).map(cell_to_string).unwrap_or_default();
    let float = |name: &str| table.cell(row, name).and_then(cell_to_f64);
    let date = |name: &str| table.cell(row, name).and_then(cell_to_datetime);

    SiteRecord {
        system_key: text("system_key"),

        vendor_name: text("vendor_name"),
        vendor_code: text("vendor_code"),
        year: text("year"),
        scope_of_work: text("scope_of_work"),
        ran_score: text("ran_score"),
        unique_id: text("unique_id"),
        site_id: text("site_id"),
        site_name: text("site_name"),
        site_type: text("site_type"),
        dati_ii: text("dati_ii"),
        province: text("province"),
        mc_cluster: text("mc_cluster"),
        nano_cluster: text("nano_cluster"),
        scope_category: text("scope_category"),
        ran_scope: text("ran_scope"),

        longitude: float("longitude"),
        latitude: float("latitude"),

        caf_approved: date("caf_approved"),
        caf_submitted: date("caf_submitted"),
        caf_status: text("caf_status"),

        survey_ff: date("survey_ff"),
        survey_af: date("survey_af"),
        mos_bf: date("mos_bf"),
        mos_ff: date("mos_ff"),
        mos_af: date("mos_af"),
        cutover_bf: date("cutover_bf"),
        cutover_ff: date("cutover_ff"),
        cutover_af: date("cutover_af"),
        ic_000040_bf: date("ic_000040_bf"),
        ic_000040_ff: date("ic_000040_ff"),
        ic_000040_af: date("ic_000040_af"),
        imp_integ_bf: date("imp_integ_bf"),
        imp_integ_ff: date("imp_integ_ff"),
        imp_integ_af: date("imp_integ_af"),
        rfs_bf: date("rfs_bf"),
        rfs_ff: date("rfs_ff"),
        rfs_af: date("rfs_af"),
        site_dismantle_bf: date("site_dismantle_bf"),
        site_dismantle_ff: date("site_dismantle_ff"),
        site_dismantle_af: date("site_dismantle_af"),

        site_status: text("site_status"),
        site_trm_type: text("site_trm_type"),
        summary_scope: text("summary_scope"),
        cx_post_mr_af: text("cx_post_mr_af"),
        cx_post_mr_ff: text("cx_post_mr_ff"),
        swap_time: text("swap_time"),
        downtime_actual: text("downtime_actual"),
        area_spider: text("area_spider"),
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use crate::ingest::workbook::{parse_workbook, FileFormat};

    #[test]
    fn test_serial_45000_is_march_2023() {
        let dt = excel_serial_to_datetime(45000.0).unwrap();
        assert_eq!(dt.to_rfc3339(), "2023-03-15T00:00:00+00:00");
    }

    #[test]
    fn test_serial_at_unix_epoch() {
        let dt = excel_serial_to_datetime(25569.0).unwrap();
        assert_eq!(dt.timestamp(), 0);
    }

    #[test]
    fn test_fractional_serial_keeps_time_of_day() {
        let dt = excel_serial_to_datetime(45000.5).unwrap();
        assert_eq!(dt.to_rfc3339(), "2023-03-15T12:00:00+00:00");
    }

    #[test]
    fn test_bad_serials_degrade_to_none() {
        assert!(excel_serial_to_datetime(f64::NAN).is_none());
        assert!(excel_serial_to_datetime(f64::INFINITY).is_none());
        assert!(excel_serial_to_datetime(-1.0).is_none());
        assert!(excel_serial_to_datetime(1e15).is_none());
    }

    #[test]
    fn test_cell_to_string_formats_integral_floats() {
        assert_eq!(cell_to_string(&Cell::Number(123.0)), "123");
        assert_eq!(cell_to_string(&Cell::Number(1.5)), "1.5");
        assert_eq!(cell_to_string(&Cell::Text("  BTN001  ".to_string())), "BTN001");
        assert_eq!(cell_to_string(&Cell::Empty), "");
    }

    #[test]
    fn test_cell_to_f64_coercions() {
        assert_eq!(cell_to_f64(&Cell::Number(-6.2)), Some(-6.2));
        assert_eq!(cell_to_f64(&Cell::Text("106.8".to_string())), Some(106.8));
        assert_eq!(cell_to_f64(&Cell::Text("not a number".to_string())), None);
        assert_eq!(cell_to_f64(&Cell::Empty), None);
    }

    #[test]
    fn test_cell_to_datetime_accepts_serials_and_text() {
        let expected = "2023-03-15T00:00:00+00:00";

        let dt = cell_to_datetime(&Cell::DateTime(45000.0)).unwrap();
        assert_eq!(dt.to_rfc3339(), expected);

        let dt = cell_to_datetime(&Cell::Number(45000.0)).unwrap();
        assert_eq!(dt.to_rfc3339(), expected);

        let dt = cell_to_datetime(&Cell::Text("2023-03-15".to_string())).unwrap();
        assert_eq!(dt.to_rfc3339(), expected);

        let dt = cell_to_datetime(&Cell::Text("15/03/2023".to_string())).unwrap();
        assert_eq!(dt.to_rfc3339(), expected);

        let dt = cell_to_datetime(&Cell::Text("45000".to_string())).unwrap();
        assert_eq!(dt.to_rfc3339(), expected);

        assert!(cell_to_datetime(&Cell::Text("soon".to_string())).is_none());
        assert!(cell_to_datetime(&Cell::Empty).is_none());
    }

    #[test]
    fn test_text_datetime_with_time_component() {
        let dt = parse_text_datetime("2023-03-15 08:30:00").unwrap();
        assert_eq!(dt.to_rfc3339(), "2023-03-15T08:30:00+00:00");

        let dt = parse_text_datetime("2023-03-15T08:30:00+07:00").unwrap();
        assert_eq!(dt.to_rfc3339(), "2023-03-15T01:30:00+00:00");
    }

    #[test]
    fn test_normalize_rows_from_csv() {
        let data = b"banner,,,,\n\
            system_key,site_id,site_name,lat,cutover_af\n\
            KEY-1,BTN001,Site Alpha,-6.2,2023-03-15\n\
            KEY-2,BTN002,Site Beta,,\n";
        let table = parse_workbook(data, FileFormat::Csv).unwrap();
        let records = normalize_rows(&table);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].system_key, "KEY-1");
        assert_eq!(records[0].site_id, "BTN001");
        assert_eq!(records[0].latitude, Some(-6.2));
        assert_eq!(
            records[0].cutover_af.unwrap().to_rfc3339(),
            "2023-03-15T00:00:00+00:00"
        );

        assert_eq!(records[1].latitude, None);
        assert_eq!(records[1].cutover_af, None);
        // Columns absent from the sheet default to empty.
        assert_eq!(records[1].vendor_name, "");
        assert_eq!(records[1].longitude, None);
    }
}
