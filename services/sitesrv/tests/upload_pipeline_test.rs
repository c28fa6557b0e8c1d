//! End-to-end upload pipeline tests
//!
//! Drives the full HTTP surface: multipart upload through parse, validate,
//! normalize, and upsert, then reads the result back through the list and
//! search endpoints.

#![allow(clippy::disallowed_methods)] // Integration test - unwrap is acceptable

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use sqlx::sqlite::SqlitePoolOptions;
use tower::util::ServiceExt;

use common::sqlite::SqliteClient;
use sitesrv::config::Config;
use sitesrv::routes::create_routes;
use sitesrv::AppState;

const BOUNDARY: &str = "sitesrv-test-boundary";

/// Real workbook following the template layout: banner row, header row with
/// the `lat` / `long` / `cutover_af` columns, two data rows. Cell F3 carries
/// the date serial 45000 with a date number format.
const TRACKER_XLSX: &[u8] = include_bytes!("fixtures/tracker.xlsx");

/// Three well-formed data rows under the banner/header layout.
const VALID_CSV: &str = "PT Network Swap Tracker,,,,,,\n\
    system_key,site_id,site_name,province,mc_cluster,lat,cutover_af\n\
    KEY-1,BTN001,Site Alpha,Banten,MC-01,-6.2,45000\n\
    KEY-2,BTN002,Site Beta,Banten,MC-01,-6.3,\n\
    KEY-3,JKT001,Site Gamma,Jakarta,MC-02,,2023-04-01\n";

async fn test_state(config: Config) -> AppState {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    let client = Arc::new(SqliteClient::from_pool(pool));
    AppState::with_client(config, client).await.unwrap()
}

async fn test_app() -> (Router, AppState) {
    let state = test_state(Config::default()).await;
    (create_routes(state.clone()), state)
}

fn multipart_body(filename: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn upload(app: &Router, filename: &str, content: &[u8]) -> (StatusCode, serde_json::Value) {
    let body = multipart_body(filename, content);
    let req = Request::builder()
        .uri("/api/sites/upload")
        .method("POST")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), 1_000_000).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), 1_000_000).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn test_upload_then_list() {
    let (app, state) = test_app().await;

    let (status, json) = upload(&app, "tracker.csv", VALID_CSV.as_bytes()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "File berhasil diunggah dan divalidasi");
    assert_eq!(json["dataCount"], 3);
    assert_eq!(state.store.count().await.unwrap(), 3);

    let (status, json) = get_json(&app, "/api/sites").await;
    assert_eq!(status, StatusCode::OK);
    let data = json["data"].as_array().unwrap();
    assert_eq!(data.len(), 3);
    // Ordered by site_id; dati_ii is absent from this sheet so city is empty
    assert_eq!(data[0]["site_id"], "BTN001");
    assert_eq!(data[2]["site_id"], "JKT001");
    assert_eq!(data[0]["city"], "");
    // Serial 45000 landed as an absolute timestamp
    assert_eq!(data[0]["cutover_af"], "2023-03-15T00:00:00Z");
    assert_eq!(data[1]["cutover_af"], serde_json::Value::Null);
}

#[test]
fn test_xlsx_workbook_decodes_headers_and_date_serial() {
    use sitesrv::ingest::normalize::{cell_to_datetime, cell_to_f64, cell_to_string};
    use sitesrv::ingest::workbook::{parse_workbook, FileFormat};

    let table = parse_workbook(TRACKER_XLSX, FileFormat::Xlsx).unwrap();
    assert_eq!(table.len(), 2);
    assert!(table.has_column("system_key"));
    assert!(table.has_column("latitude"));
    assert!(table.has_column("longitude"));
    assert!(!table.has_column("lat"));

    let row = &table.rows()[0];
    assert_eq!(cell_to_string(table.cell(row, "site_id").unwrap()), "BTN001");
    assert_eq!(cell_to_f64(table.cell(row, "latitude").unwrap()), Some(-6.2));
    assert_eq!(
        cell_to_datetime(table.cell(row, "cutover_af").unwrap())
            .unwrap()
            .to_rfc3339(),
        "2023-03-15T00:00:00+00:00"
    );

    // Second row carries no coordinate or milestone values
    let row = &table.rows()[1];
    assert_eq!(cell_to_string(table.cell(row, "system_key").unwrap()), "KEY-2");
    assert_eq!(table.cell(row, "latitude").and_then(cell_to_f64), None);
    assert_eq!(table.cell(row, "cutover_af").and_then(cell_to_datetime), None);
}

#[tokio::test]
async fn test_xlsx_upload_end_to_end() {
    let (app, state) = test_app().await;

    let (status, json) = upload(&app, "tracker.xlsx", TRACKER_XLSX).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "File berhasil diunggah dan divalidasi");
    assert_eq!(json["dataCount"], 2);
    assert_eq!(state.store.count().await.unwrap(), 2);

    let (_, json) = get_json(&app, "/api/sites").await;
    let data = json["data"].as_array().unwrap();
    assert_eq!(data[0]["site_id"], "BTN001");
    assert_eq!(data[0]["latitude"], -6.2);
    assert_eq!(data[0]["longitude"], 106.8);
    assert_eq!(data[0]["cutover_af"], "2023-03-15T00:00:00Z");
    assert_eq!(data[1]["site_id"], "BTN002");
    assert_eq!(data[1]["cutover_af"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_upload_survives_service_restart() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("swaptrack.db");

    let mut config = Config::default();
    config.database.path = db_path.to_string_lossy().to_string();

    {
        let state = AppState::new(config.clone()).await.unwrap();
        let app = create_routes(state);
        let (status, json) = upload(&app, "tracker.csv", VALID_CSV.as_bytes()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["dataCount"], 3);
    }

    // A fresh state over the same file sees the committed rows
    let state = AppState::new(config).await.unwrap();
    assert_eq!(state.store.count().await.unwrap(), 3);
    let rows = state.store.fetch_all().await.unwrap();
    assert_eq!(rows[0].site_id, "BTN001");
    assert_eq!(
        rows[0].cutover_af.unwrap().to_rfc3339(),
        "2023-03-15T00:00:00+00:00"
    );
}

#[tokio::test]
async fn test_reupload_is_idempotent() {
    let (app, state) = test_app().await;

    upload(&app, "tracker.csv", VALID_CSV.as_bytes()).await;
    let before = state.store.fetch_all().await.unwrap();

    let (status, json) = upload(&app, "tracker.csv", VALID_CSV.as_bytes()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["dataCount"], 3);

    let after = state.store.fetch_all().await.unwrap();
    assert_eq!(before.len(), after.len());
    for (a, b) in before.iter().zip(after.iter()) {
        assert_eq!(serde_json::to_value(a).unwrap(), serde_json::to_value(b).unwrap());
    }
}

#[tokio::test]
async fn test_second_upload_overwrites_by_system_key() {
    let (app, _state) = test_app().await;

    upload(&app, "tracker.csv", VALID_CSV.as_bytes()).await;

    let update = "banner,,,\n\
        system_key,site_id,site_name\n\
        KEY-1,BTN001-NEW,Site Alpha Swap\n";
    let (status, json) = upload(&app, "update.csv", update.as_bytes()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["dataCount"], 1);

    let (_, json) = get_json(&app, "/api/sites/search?q=BTN001-NEW").await;
    let data = json["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["site_name"], "Site Alpha Swap");
    // Full replace: the province from the first upload is gone
    assert_eq!(data[0]["province"], "");
}

#[tokio::test]
async fn test_one_bad_row_rejects_whole_batch() {
    let (app, state) = test_app().await;

    let csv = "banner,,,\n\
        system_key,site_id,site_name\n\
        KEY-1,BTN001,Site Alpha\n\
        KEY-2,,Site Beta\n\
        KEY-3,BTN003,Site Gamma\n";
    let (status, json) = upload(&app, "tracker.csv", csv.as_bytes()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Validasi gagal");
    assert_eq!(
        json["details"],
        serde_json::json!(["Baris 4: site_id tidak boleh kosong"])
    );

    // Nothing was written
    assert_eq!(state.store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_rows_without_identity_pass_but_are_not_stored() {
    let (app, state) = test_app().await;

    let csv = "banner,,,\n\
        system_key,site_id,site_name\n\
        KEY-1,BTN001,Site Alpha\n\
        ,,\n";
    let (status, json) = upload(&app, "tracker.csv", csv.as_bytes()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["dataCount"], 1);
    assert_eq!(state.store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_corrupt_xlsx_is_rejected() {
    let (app, state) = test_app().await;

    let (status, json) = upload(&app, "tracker.xlsx", b"definitely not a zip archive").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Gagal membaca file Excel");
    assert!(!json["details"].as_array().unwrap().is_empty());
    assert_eq!(state.store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_unsupported_extension_is_rejected() {
    let (app, _state) = test_app().await;

    let (status, json) = upload(&app, "tracker.pdf", b"%PDF-1.4").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Gagal membaca file Excel");
}

#[tokio::test]
async fn test_oversized_upload_is_rejected_before_parsing() {
    let mut config = Config::default();
    config.upload.limit = 64;
    let state = test_state(config).await;
    let app = create_routes(state.clone());

    let body = multipart_body("tracker.csv", VALID_CSV.as_bytes());
    let length = body.len();
    let req = Request::builder()
        .uri("/api/sites/upload")
        .method("POST")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header("content-length", length)
        .body(Body::from(body))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(state.store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_search_filters_by_substring() {
    let (app, _state) = test_app().await;
    upload(&app, "tracker.csv", VALID_CSV.as_bytes()).await;

    let (status, json) = get_json(&app, "/api/sites/search?q=gamma").await;
    assert_eq!(status, StatusCode::OK);
    let data = json["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["site_id"], "JKT001");

    let (_, json) = get_json(&app, "/api/sites/search?q=BTN").await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);

    // Blank term behaves like the unfiltered listing
    let (_, json) = get_json(&app, "/api/sites/search?q=").await;
    assert_eq!(json["data"].as_array().unwrap().len(), 3);
}
