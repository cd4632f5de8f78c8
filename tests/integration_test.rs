use anyhow::Result;
use bioreactor_sensorflow::{routes, Config, IngestConfig, SensorSummary};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::BTreeMap;

mod common;
use common::{assert_close, fixture_path, spawn};

// ---

#[derive(Debug, Deserialize)]
struct SummaryBody {
    run_id: uuid::Uuid,
    sensors: BTreeMap<String, SensorSummary>,
}

#[derive(Debug, Deserialize)]
struct StreamBody {
    snapshots: Vec<BTreeMap<String, SensorSummary>>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

async fn start_service(source: String) -> String {
    // ---
    let config = Config {
        source,
        listen_port: 0,
        ingest: IngestConfig::default(),
    };
    spawn(routes::router(config)).await
}

fn fixture_source() -> String {
    fixture_path().to_string_lossy().into_owned()
}

#[tokio::test]
async fn health_endpoint_ok() -> Result<()> {
    // ---
    let base = start_service(fixture_source()).await;
    let body: serde_json::Value = Client::new()
        .get(format!("{base}/health"))
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn summary_endpoint_aggregates_source() -> Result<()> {
    // ---
    let base = start_service(fixture_source()).await;
    let response = Client::new().get(format!("{base}/summary")).send().await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body: SummaryBody = response.json().await?;
    assert!(!body.run_id.is_nil());
    assert_eq!(body.sensors.len(), 3);

    let bio1 = &body.sensors["BioR1"];
    assert_close(bio1.avg_ph, (7.2 + 7.1 + 7.3) / 3.0);
    assert_eq!(bio1.anomaly_count, 1);
    assert_eq!(bio1.latest_timestamp, "2025-08-16 14:30");
    Ok(())
}

#[tokio::test]
async fn stream_endpoint_returns_snapshot_per_batch() -> Result<()> {
    // ---
    let base = start_service(fixture_source()).await;
    let body: StreamBody = Client::new()
        .get(format!("{base}/summary/stream?batch_size=4"))
        .send()
        .await?
        .json()
        .await?;

    assert!(body.error.is_none());
    assert_eq!(body.snapshots.len(), 3);
    assert_eq!(body.snapshots.last().map(|s| s.len()), Some(3));
    Ok(())
}

#[tokio::test]
async fn zero_batch_size_is_rejected() -> Result<()> {
    // ---
    let base = start_service(fixture_source()).await;
    let response = Client::new()
        .get(format!("{base}/summary?batch_size=0"))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = response.json().await?;
    assert!(body.error.contains("batch_size"));
    Ok(())
}

#[tokio::test]
async fn unrecognized_source_is_a_bad_request() -> Result<()> {
    // ---
    let base = start_service("mystery-source".to_string()).await;
    let response = Client::new().get(format!("{base}/summary")).send().await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = response.json().await?;
    assert!(body.error.contains("mystery-source"));
    Ok(())
}

#[tokio::test]
async fn missing_source_file_is_a_bad_gateway() -> Result<()> {
    // ---
    let dir = tempfile::tempdir()?;
    let missing = dir.path().join("gone.jsonl");
    let base = start_service(missing.to_string_lossy().into_owned()).await;
    let response = Client::new().get(format!("{base}/summary")).send().await?;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    Ok(())
}
