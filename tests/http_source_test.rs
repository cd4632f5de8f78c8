use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use bioreactor_sensorflow::{
    process_pipeline, process_pipeline_streaming, IngestConfig, SourceError, SourceKind, SourceReader,
};
use serde_json::{json, Value};
use tokio_test::{assert_err, assert_ok};

mod common;
use common::{assert_close, spawn};

// ---

/// Stand-in for the paginated sensor API.
struct MockApi {
    pages: Vec<Value>,
    hits: AtomicUsize,
}

async fn paged(
    Query(params): Query<HashMap<String, String>>,
    State(api): State<Arc<MockApi>>,
) -> Json<Value> {
    // ---
    api.hits.fetch_add(1, Ordering::SeqCst);
    let page: usize = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(0);
    let body = page
        .checked_sub(1)
        .and_then(|i| api.pages.get(i))
        .cloned()
        .unwrap_or_else(|| json!([]));
    Json(body)
}

async fn endless(State(api): State<Arc<MockApi>>) -> Json<Value> {
    // ---
    api.hits.fetch_add(1, Ordering::SeqCst);
    Json(json!([
        {"sensor_id": "BioR1", "timestamp": "2025-08-16 14:00", "ph_value": 7.0, "temperature": 30.0}
    ]))
}

async fn broken() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "boom")
}

async fn start(pages: Vec<Value>) -> (String, Arc<MockApi>) {
    // ---
    let api = Arc::new(MockApi {
        pages,
        hits: AtomicUsize::new(0),
    });
    let app = Router::new()
        .route("/readings", get(paged))
        .route("/endless", get(endless))
        .route("/broken", get(broken))
        .with_state(api.clone());
    (spawn(app).await, api)
}

fn reading(sensor_id: &str, timestamp: &str, ph_value: Value, temperature: Value) -> Value {
    json!({
        "sensor_id": sensor_id,
        "timestamp": timestamp,
        "ph_value": ph_value,
        "temperature": temperature,
    })
}

fn scenario_pages() -> Vec<Value> {
    // ---
    vec![
        json!([
            reading("BioR1", "2025-08-16 14:00", json!(7.2), json!(37.5)),
            reading("BioR1", "2025-08-16 14:30", json!(7.1), json!(45.0)),
        ]),
        json!({
            "results": [
                reading("BioR2", "2025-08-16 14:00", json!(-1.0), json!(25.0)),
                reading("BioR3", "2025-08-16 14:00", json!("invalid"), json!(30.0)),
                "not a record",
            ]
        }),
        json!([reading("", "2025-08-16 14:00", json!(7.0), json!(35.0))]),
    ]
}

#[tokio::test]
async fn http_reader_follows_pages_until_empty() {
    // ---
    let (base, api) = start(scenario_pages()).await;
    let source = format!("{base}/readings");
    let config = IngestConfig::default().with_batch_size(2);

    let mut reader = assert_ok!(SourceReader::open(&source, &config).await);
    assert_eq!(reader.kind(), SourceKind::Http);

    let mut sizes = Vec::new();
    while let Some(batch) = assert_ok!(reader.next_batch().await) {
        sizes.push(batch.len());
    }

    // Five records across three pages; the non-object item is skipped
    assert_eq!(sizes, vec![2, 2, 1]);
    // Three data pages plus the empty page that ends pagination
    assert_eq!(api.hits.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn http_pipeline_matches_reference_scenario() {
    // ---
    let (base, _api) = start(scenario_pages()).await;
    let source = format!("{base}/readings");

    let results = assert_ok!(process_pipeline(&source, &IngestConfig::default()).await);

    assert_eq!(results.len(), 1);
    let (avg_ph, anomalies, latest) = results["BioR1"].to_tuple();
    assert_close(avg_ph, 7.15);
    assert_eq!(anomalies, 1);
    assert_eq!(latest, "2025-08-16 14:30");
}

#[tokio::test]
async fn http_reader_respects_page_limit() {
    // ---
    let (base, api) = start(Vec::new()).await;
    let source = format!("{base}/endless");
    let config = IngestConfig {
        api_max_pages: 3,
        batch_size: 10,
        ..IngestConfig::default()
    };

    let results = assert_ok!(process_pipeline(&source, &config).await);
    assert_eq!(api.hits.load(Ordering::SeqCst), 3);
    assert_eq!(results["BioR1"].anomaly_count, 0);
    assert_close(results["BioR1"].avg_ph, 7.0);
}

#[tokio::test]
async fn http_error_status_is_a_hard_failure() {
    // ---
    let (base, _api) = start(Vec::new()).await;
    let source = format!("{base}/broken");

    let err = assert_err!(process_pipeline(&source, &IngestConfig::default()).await);
    assert!(matches!(err, SourceError::Http { .. }));
    assert!(!err.is_configuration_error());
}

#[tokio::test]
async fn http_streaming_emits_one_snapshot_per_batch() {
    // ---
    let (base, _api) = start(scenario_pages()).await;
    let source = format!("{base}/readings");
    let config = IngestConfig::default().with_batch_size(2);

    let mut stream = assert_ok!(process_pipeline_streaming(&source, &config).await);
    let mut snapshots = Vec::new();
    while let Some(snapshot) = stream.next().await {
        snapshots.push(assert_ok!(snapshot));
    }

    assert_eq!(snapshots.len(), 3);
    assert!(snapshots.iter().all(|s| s.len() == 1));
    assert_eq!(snapshots[0], snapshots[2]);
}

#[tokio::test]
async fn unreachable_api_is_a_hard_failure() {
    // ---
    let listener = assert_ok!(tokio::net::TcpListener::bind("127.0.0.1:0").await);
    let addr = assert_ok!(listener.local_addr());
    drop(listener);

    let config = IngestConfig {
        http_timeout_secs: 2,
        ..IngestConfig::default()
    };
    let err = assert_err!(process_pipeline(&format!("http://{addr}/readings"), &config).await);
    assert!(matches!(err, SourceError::Http { .. }));
}
