//! Site record data model
//!
//! `SiteRecord` is the typed, fixed-shape row produced by the ingest pipeline
//! and persisted to the `sites` table. `SiteSummary` is the projection served
//! by the read endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One site-swap project row, keyed by `system_key`.
///
/// Text attributes are empty-string coerced (the sheet carries blanks, not
/// nulls); coordinates and milestone timestamps degrade to `None` when the
/// source cell is blank or unparsable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteRecord {
    /// Unique per-site key, identity for upserts
    pub system_key: String,

    // Descriptive attributes
    pub vendor_name: String,
    pub vendor_code: String,
    pub year: String,
    pub scope_of_work: String,
    pub ran_score: String,
    pub unique_id: String,
    pub site_id: String,
    pub site_name: String,
    pub site_type: String,
    /// City / regency (kabupaten)
    pub dati_ii: String,
    pub province: String,
    pub mc_cluster: String,
    pub nano_cluster: String,
    pub scope_category: String,
    pub ran_scope: String,

    // Coordinates
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,

    // CAF milestones
    pub caf_approved: Option<DateTime<Utc>>,
    pub caf_submitted: Option<DateTime<Utc>>,
    pub caf_status: String,

    // Activity milestones: before / forecast / actual markers per family
    pub survey_ff: Option<DateTime<Utc>>,
    pub survey_af: Option<DateTime<Utc>>,
    pub mos_bf: Option<DateTime<Utc>>,
    pub mos_ff: Option<DateTime<Utc>>,
    pub mos_af: Option<DateTime<Utc>>,
    pub cutover_bf: Option<DateTime<Utc>>,
    pub cutover_ff: Option<DateTime<Utc>>,
    pub cutover_af: Option<DateTime<Utc>>,
    pub ic_000040_bf: Option<DateTime<Utc>>,
    pub ic_000040_ff: Option<DateTime<Utc>>,
    pub ic_000040_af: Option<DateTime<Utc>>,
    pub imp_integ_bf: Option<DateTime<Utc>>,
    pub imp_integ_ff: Option<DateTime<Utc>>,
    pub imp_integ_af: Option<DateTime<Utc>>,
    pub rfs_bf: Option<DateTime<Utc>>,
    pub rfs_ff: Option<DateTime<Utc>>,
    pub rfs_af: Option<DateTime<Utc>>,
    pub site_dismantle_bf: Option<DateTime<Utc>>,
    pub site_dismantle_ff: Option<DateTime<Utc>>,
    pub site_dismantle_af: Option<DateTime<Utc>>,

    // Pass-through tracking fields, never validated
    pub site_status: String,
    pub site_trm_type: String,
    pub summary_scope: String,
    pub cx_post_mr_af: String,
    pub cx_post_mr_ff: String,
    pub swap_time: String,
    pub downtime_actual: String,
    pub area_spider: String,
}

impl SiteRecord {
    /// Rows without a system key are carried through validation but never
    /// persisted.
    pub fn has_system_key(&self) -> bool {
        !self.system_key.trim().is_empty()
    }
}

/// Read-endpoint projection of a site record.
///
/// `city` is served from the `dati_ii` column.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct SiteSummary {
    pub site_id: String,
    pub site_name: String,
    pub mc_cluster: String,
    pub province: String,
    pub city: String,
    pub scope_category: String,
    pub scope_of_work: String,
    pub ran_scope: String,
    pub nano_cluster: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub survey_ff: Option<DateTime<Utc>>,
    pub survey_af: Option<DateTime<Utc>>,
    pub mos_ff: Option<DateTime<Utc>>,
    pub mos_af: Option<DateTime<Utc>>,
    pub cutover_ff: Option<DateTime<Utc>>,
    pub cutover_af: Option<DateTime<Utc>>,
    pub site_dismantle_ff: Option<DateTime<Utc>>,
    pub site_dismantle_af: Option<DateTime<Utc>>,
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;

    #[test]
    fn test_has_system_key() {
        let record = SiteRecord::default();
        assert!(!record.has_system_key());

        let record = SiteRecord {
            system_key: "  ".to_string(),
            ..Default::default()
        };
        assert!(!record.has_system_key());

        let record = SiteRecord {
            system_key: "MC-001-A".to_string(),
            ..Default::default()
        };
        assert!(record.has_system_key());
    }

    #[test]
    fn test_site_summary_serializes_city_field() {
        let summary = SiteSummary {
            site_id: "JAW-001".to_string(),
            site_name: "Alpha".to_string(),
            mc_cluster: String::new(),
            province: "Jawa Barat".to_string(),
            city: "Bandung".to_string(),
            scope_category: String::new(),
            scope_of_work: String::new(),
            ran_scope: String::new(),
            nano_cluster: String::new(),
            latitude: Some(-6.9),
            longitude: Some(107.6),
            survey_ff: None,
            survey_af: None,
            mos_ff: None,
            mos_af: None,
            cutover_ff: None,
            cutover_af: None,
            site_dismantle_ff: None,
            site_dismantle_af: None,
        };

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["city"], "Bandung");
        assert!(json.get("dati_ii").is_none());
    }
}
