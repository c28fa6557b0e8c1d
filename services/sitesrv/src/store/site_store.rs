//! Site store - SQLite persistence for swap tracking records
//!
//! Uploads replace whole rows keyed by `system_key`; re-uploading the same
//! sheet is idempotent. Every batch runs in a single transaction so a failed
//! upload leaves the table untouched.

use std::sync::Arc;

use common::sqlite::SqliteClient;
use sqlx::sqlite::SqlitePool;
use sqlx::{Row, Sqlite, Transaction};
use tracing::debug;

use crate::error::{Result, SiteSrvError};
use crate::model::{SiteRecord, SiteSummary};

const CREATE_SITES_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS sites (
    system_key TEXT PRIMARY KEY,
    vendor_name TEXT,
    vendor_code TEXT,
    year TEXT,
    scope_of_work TEXT,
    ran_score TEXT,
    unique_id TEXT,
    site_id TEXT,
    site_name TEXT,
    longitude REAL,
    latitude REAL,
    site_type TEXT,
    dati_ii TEXT,
    province TEXT,
    mc_cluster TEXT,
    caf_approved TIMESTAMP,
    site_status TEXT,
    cutover_bf TIMESTAMP,
    cutover_ff TIMESTAMP,
    cutover_af TIMESTAMP,
    survey_ff TIMESTAMP,
    survey_af TIMESTAMP,
    caf_status TEXT,
    caf_submitted TIMESTAMP,
    mos_af TIMESTAMP,
    mos_bf TIMESTAMP,
    mos_ff TIMESTAMP,
    ic_000040_af TIMESTAMP,
    ic_000040_bf TIMESTAMP,
    ic_000040_ff TIMESTAMP,
    imp_integ_af TIMESTAMP,
    imp_integ_bf TIMESTAMP,
    imp_integ_ff TIMESTAMP,
    rfs_af TIMESTAMP,
    rfs_ff TIMESTAMP,
    rfs_bf TIMESTAMP,
    nano_cluster TEXT,
    scope_category TEXT,
    ran_scope TEXT,
    site_dismantle_af TIMESTAMP,
    site_dismantle_bf TIMESTAMP,
    site_dismantle_ff TIMESTAMP,
    site_trm_type TEXT,
    summary_scope TEXT,
    cx_post_mr_af TEXT,
    cx_post_mr_ff TEXT,
    swap_time TEXT,
    downtime_actual TEXT,
    area_spider TEXT,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)
"#;

const UPSERT_SITE_SQL: &str = r#"
INSERT INTO sites (
    system_key, vendor_name, vendor_code, year, scope_of_work,
    ran_score, unique_id, site_id, site_name, longitude, latitude,
    site_type, dati_ii, province, mc_cluster, caf_approved,
    site_status, cutover_bf, cutover_ff, cutover_af, survey_ff,
    survey_af, caf_status, caf_submitted, mos_af, mos_bf,
    mos_ff, ic_000040_af, ic_000040_bf, ic_000040_ff, imp_integ_af,
    imp_integ_bf, imp_integ_ff, rfs_af, rfs_ff, rfs_bf,
    nano_cluster, scope_category, ran_scope, site_dismantle_af,
    site_dismantle_bf, site_dismantle_ff, site_trm_type,
    summary_scope, cx_post_mr_af, cx_post_mr_ff, swap_time,
    downtime_actual, area_spider
) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?,
    ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?,
    ?, ?, ?, ?, ?)
ON CONFLICT(system_key) DO UPDATE SET
    vendor_name = excluded.vendor_name,
    vendor_code = excluded.vendor_code,
    year = excluded.year,
    scope_of_work = excluded.scope_of_work,
    ran_score = excluded.ran_score,
    unique_id = excluded.unique_id,
    site_id = excluded.site_id,
    site_name = excluded.site_name,
    longitude = excluded.longitude,
    latitude = excluded.latitude,
    site_type = excluded.site_type,
    dati_ii = excluded.dati_ii,
    province = excluded.province,
    mc_cluster = excluded.mc_cluster,
    caf_approved = excluded.caf_approved,
    site_status = excluded.site_status,
    cutover_bf = excluded.cutover_bf,
    cutover_ff = excluded.cutover_ff,
    cutover_af = excluded.cutover_af,
    survey_ff = excluded.survey_ff,
    survey_af = excluded.survey_af,
    caf_status = excluded.caf_status,
    caf_submitted = excluded.caf_submitted,
    mos_af = excluded.mos_af,
    mos_bf = excluded.mos_bf,
    mos_ff = excluded.mos_ff,
    ic_000040_af = excluded.ic_000040_af,
    ic_000040_bf = excluded.ic_000040_bf,
    ic_000040_ff = excluded.ic_000040_ff,
    imp_integ_af = excluded.imp_integ_af,
    imp_integ_bf = excluded.imp_integ_bf,
    imp_integ_ff = excluded.imp_integ_ff,
    rfs_af = excluded.rfs_af,
    rfs_ff = excluded.rfs_ff,
    rfs_bf = excluded.rfs_bf,
    nano_cluster = excluded.nano_cluster,
    scope_category = excluded.scope_category,
    ran_scope = excluded.ran_scope,
    site_dismantle_af = excluded.site_dismantle_af,
    site_dismantle_bf = excluded.site_dismantle_bf,
    site_dismantle_ff = excluded.site_dismantle_ff,
    site_trm_type = excluded.site_trm_type,
    summary_scope = excluded.summary_scope,
    cx_post_mr_af = excluded.cx_post_mr_af,
    cx_post_mr_ff = excluded.cx_post_mr_ff,
    swap_time = excluded.swap_time,
    downtime_actual = excluded.downtime_actual,
    area_spider = excluded.area_spider,
    updated_at = CURRENT_TIMESTAMP
"#;

const SUMMARY_PROJECTION_SQL: &str = r#"
SELECT
    site_id, site_name, mc_cluster, province, dati_ii AS city,
    scope_category, scope_of_work, ran_scope, nano_cluster,
    latitude, longitude,
    survey_ff, survey_af, mos_ff, mos_af,
    cutover_ff, cutover_af, site_dismantle_ff, site_dismantle_af
FROM sites
"#;

/// Summary dimensions exposed by [`SiteStore::distribution`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupColumn {
    Province,
    McCluster,
}

impl GroupColumn {
    fn as_sql(self) -> &'static str {
        match self {
            GroupColumn::Province => "province",
            GroupColumn::McCluster => "mc_cluster",
        }
    }
}

/// SQLite-backed store for site swap records
#[derive(Clone)]
pub struct SiteStore {
    client: Arc<SqliteClient>,
}

impl SiteStore {
    pub fn new(client: Arc<SqliteClient>) -> Self {
        Self { client }
    }

    fn pool(&self) -> &SqlitePool {
        self.client.pool()
    }

    /// Create the sites table and its lookup indexes
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(CREATE_SITES_SQL)
            .execute(self.pool())
            .await
            .map_err(|e| SiteSrvError::StorageError(format!("Failed to create sites table: {e}")))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_sites_site_id ON sites (site_id)")
            .execute(self.pool())
            .await
            .map_err(|e| SiteSrvError::StorageError(format!("Failed to create index: {e}")))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_sites_site_name ON sites (site_name)")
            .execute(self.pool())
            .await
            .map_err(|e| SiteSrvError::StorageError(format!("Failed to create index: {e}")))?;

        debug!("Site schema initialized at {}", self.client.path());
        Ok(())
    }

    /// Upsert a batch of records in a single transaction.
    ///
    /// Records without a `system_key` are skipped silently. Returns the
    /// number of rows written; on any failure the transaction rolls back and
    /// the table is left untouched.
    pub async fn upsert_batch(&self, records: &[SiteRecord]) -> Result<usize> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| SiteSrvError::StorageError(format!("Failed to start transaction: {e}")))?;

        let mut stored = 0usize;
        for record in records {
            if !record.has_system_key() {
                continue;
            }
            upsert_record(&mut tx, record).await?;
            stored += 1;
        }

        tx.commit()
            .await
            .map_err(|e| SiteSrvError::StorageError(format!("Failed to commit transaction: {e}")))?;

        debug!("Stored {} site record(s)", stored);
        Ok(stored)
    }

    /// Every stored site in the read projection, ordered by site id
    pub async fn fetch_all(&self) -> Result<Vec<SiteSummary>> {
        let sql = format!("{SUMMARY_PROJECTION_SQL} ORDER BY site_id ASC");
        sqlx::query_as::<_, SiteSummary>(&sql)
            .fetch_all(self.pool())
            .await
            .map_err(|e| SiteSrvError::FetchError(e.to_string()))
    }

    /// Case-insensitive substring search over `site_id` and `site_name`
    pub async fn search(&self, term: &str) -> Result<Vec<SiteSummary>> {
        let pattern = format!("%{}%", escape_like(term));
        let sql = format!(
            r#"{SUMMARY_PROJECTION_SQL}
            WHERE site_id LIKE ? ESCAPE '\' OR site_name LIKE ? ESCAPE '\'
            ORDER BY site_id ASC"#
        );
        sqlx::query_as::<_, SiteSummary>(&sql)
            .bind(&pattern)
            .bind(&pattern)
            .fetch_all(self.pool())
            .await
            .map_err(|e| SiteSrvError::FetchError(e.to_string()))
    }

    /// Number of stored sites
    pub async fn count(&self) -> Result<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM sites")
            .fetch_one(self.pool())
            .await
            .map_err(|e| SiteSrvError::FetchError(e.to_string()))?;
        let n: i64 = row
            .try_get("n")
            .map_err(|e| SiteSrvError::FetchError(e.to_string()))?;
        Ok(n as u64)
    }

    /// Row counts per distinct value of a summary column, busiest first.
    ///
    /// Rows with a blank value in that column are left out.
    pub async fn distribution(&self, column: GroupColumn, limit: u32) -> Result<Vec<(String, u64)>> {
        let name = column.as_sql();
        let sql = format!(
            "SELECT {name} AS label, COUNT(*) AS n FROM sites \
             WHERE {name} <> '' GROUP BY {name} ORDER BY n DESC, label ASC LIMIT ?"
        );
        let rows = sqlx::query(&sql)
            .bind(i64::from(limit))
            .fetch_all(self.pool())
            .await
            .map_err(|e| SiteSrvError::FetchError(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let label: String = row
                .try_get("label")
                .map_err(|e| SiteSrvError::FetchError(e.to_string()))?;
            let n: i64 = row
                .try_get("n")
                .map_err(|e| SiteSrvError::FetchError(e.to_string()))?;
            out.push((label, n as u64));
        }
        Ok(out)
    }
}

async fn upsert_record(tx: &mut Transaction<'_, Sqlite>, record: &SiteRecord) -> Result<()> {
    sqlx::query(UPSERT_SITE_SQL)
        .bind(&record.system_key)
        .bind(&record.vendor_name)
        .bind(&record.vendor_code)
        .bind(&record.year)
        .bind(&record.scope_of_work)
        .bind(&record.ran_score)
        .bind(&record.unique_id)
        .bind(&record.site_id)
        .bind(&record.site_name)
        .bind(record.longitude)
        .bind(record.latitude)
        .bind(&record.site_type)
        .bind(&record.dati_ii)
        .bind(&record.province)
        .bind(&record.mc_cluster)
        .bind(record.caf_approved)
        .bind(&record.site_status)
        .bind(record.cutover_bf)
        .bind(record.cutover_ff)
        .bind(record.cutover_af)
        .bind(record.survey_ff)
        .bind(record.survey_af)
        .bind(&record.caf_status)
        .bind(record.caf_submitted)
        .bind(record.mos_af)
        .bind(record.mos_bf)
        .bind(record.mos_ff)
        .bind(record.ic_000040_af)
        .bind(record.ic_000040_bf)
        .bind(record.ic_000040_ff)
        .bind(record.imp_integ_af)
        .bind(record.imp_integ_bf)
        .bind(record.imp_integ_ff)
        .bind(record.rfs_af)
        .bind(record.rfs_ff)
        .bind(record.rfs_bf)
        .bind(&record.nano_cluster)
        .bind(&record.scope_category)
        .bind(&record.ran_scope)
        .bind(record.site_dismantle_af)
        .bind(record.site_dismantle_bf)
        .bind(record.site_dismantle_ff)
        .bind(&record.site_trm_type)
        .bind(&record.summary_scope)
        .bind(&record.cx_post_mr_af)
        .bind(&record.cx_post_mr_ff)
        .bind(&record.swap_time)
        .bind(&record.downtime_actual)
        .bind(&record.area_spider)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            SiteSrvError::StorageError(format!("Failed to upsert site {}: {e}", record.system_key))
        })?;
    Ok(())
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
