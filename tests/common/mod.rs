#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};

use axum::Router;
use tempfile::NamedTempFile;

// ---

/// Path of the shared ten-line fixture.
pub fn fixture_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data/bioreactor_readings.jsonl")
}

/// A `.jsonl` temp file holding `bytes`, removed when dropped.
pub fn jsonl_file(bytes: &[u8]) -> NamedTempFile {
    // ---
    let mut file = tempfile::Builder::new()
        .prefix("sensorflow-")
        .suffix(".jsonl")
        .tempfile()
        .expect("create temp file");
    file.write_all(bytes).expect("write temp file");
    file.flush().expect("flush temp file");
    file
}

pub fn jsonl_lines(lines: &[&str]) -> NamedTempFile {
    jsonl_file(lines.join("\n").as_bytes())
}

/// Source descriptor for a temp file.
pub fn descriptor(file: &NamedTempFile) -> String {
    file.path().to_string_lossy().into_owned()
}

/// Serve `app` on an ephemeral local port and return its base URL.
pub async fn spawn(app: Router) -> String {
    // ---
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve test app");
    });

    format!("http://{addr}")
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
