use axum::{
    extract::Query, extract::State, http::StatusCode, response::IntoResponse, response::Response,
    routing::get, Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::{process_pipeline, process_pipeline_streaming, Config, IngestConfig, Snapshot, SourceError};

// ---

pub fn router() -> Router<Config> {
    // ---
    Router::new()
        .route("/summary", get(summary))
        .route("/summary/stream", get(summary_stream))
}

/// Query parameters accepted by the summary routes
#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    batch_size: Option<usize>,
}

#[derive(Debug, Serialize)]
struct SummaryResponse {
    run_id: Uuid,
    sensors: Snapshot,
}

#[derive(Debug, Serialize)]
struct StreamResponse {
    run_id: Uuid,
    snapshots: Vec<Snapshot>,
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    run_id: Uuid,
    error: String,
}

/// `GET /summary` - final snapshot of the configured source
async fn summary(Query(params): Query<SummaryQuery>, State(config): State<Config>) -> Response {
    // ---
    let run_id = Uuid::new_v4();
    info!(%run_id, "GET /summary - Starting pipeline for {}", config.source);

    let ingest = match ingest_config(&config, &params) {
        Ok(ingest) => ingest,
        Err(message) => return failure(run_id, StatusCode::BAD_REQUEST, message),
    };

    match process_pipeline(&config.source, &ingest).await {
        Ok(sensors) => {
            info!(%run_id, "Pipeline complete, returning {} sensors", sensors.len());
            (StatusCode::OK, Json(SummaryResponse { run_id, sensors })).into_response()
        }
        Err(e) => {
            error!(%run_id, "Pipeline failed: {}", e);
            failure(run_id, status_for(&e), e.to_string())
        }
    }
}

/// `GET /summary/stream` - every cumulative snapshot, one per source batch
///
/// A source failure part-way through keeps the snapshots produced so far and
/// reports the failure alongside them.
async fn summary_stream(
    Query(params): Query<SummaryQuery>,
    State(config): State<Config>,
) -> Response {
    // ---
    let run_id = Uuid::new_v4();
    info!(%run_id, "GET /summary/stream - Starting pipeline for {}", config.source);

    let ingest = match ingest_config(&config, &params) {
        Ok(ingest) => ingest,
        Err(message) => return failure(run_id, StatusCode::BAD_REQUEST, message),
    };

    let mut stream = match process_pipeline_streaming(&config.source, &ingest).await {
        Ok(stream) => stream,
        Err(e) => {
            error!(%run_id, "Failed to open source: {}", e);
            return failure(run_id, status_for(&e), e.to_string());
        }
    };

    let mut snapshots = Vec::new();
    let mut error = None;
    while let Some(item) = stream.next().await {
        match item {
            Ok(snapshot) => {
                debug!(%run_id, "Snapshot {} ready", snapshots.len() + 1);
                snapshots.push(snapshot);
            }
            Err(e) => {
                error = Some(e.to_string());
                break;
            }
        }
    }

    info!(%run_id, "Stream complete, returning {} snapshots", snapshots.len());
    let body = StreamResponse {
        run_id,
        snapshots,
        error,
    };
    (StatusCode::OK, Json(body)).into_response()
}

// ---

/// Apply per-request overrides to the configured reader settings
fn ingest_config(config: &Config, params: &SummaryQuery) -> Result<IngestConfig, String> {
    // ---
    match params.batch_size {
        Some(0) => Err("batch_size must be greater than zero".to_string()),
        Some(size) => Ok(config.ingest.with_batch_size(size)),
        None => Ok(config.ingest.clone()),
    }
}

fn status_for(err: &SourceError) -> StatusCode {
    // ---
    if err.is_configuration_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::BAD_GATEWAY
    }
}

fn failure(run_id: Uuid, status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { run_id, error })).into_response()
}
