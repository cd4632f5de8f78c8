//! Streaming validation and aggregation of bioreactor sensor readings.
//!
//! Raw records arrive in batches from a [`SourceReader`] (local JSONL file,
//! paginated HTTP API or S3-compatible object). The [`Aggregator`] validates
//! each record and keeps running per-sensor statistics: average pH, number of
//! temperature anomalies and the most recent reading timestamp. The
//! [`pipeline`] module wires the two together in batch or streaming mode, and
//! [`routes`] exposes the pipeline over HTTP.
//!
//! Modules follow the Explicit Module Boundary Pattern (EMBP): siblings only
//! reach each other through the re-exports below.

pub mod aggregator;
pub mod config;
pub mod error;
pub mod ingestion;
pub mod models;
pub mod pipeline;
pub mod routes;
pub mod validation;

pub use aggregator::{summarize, Aggregator, SensorState, TIMESTAMP_FORMAT};
pub use config::{Config, IngestConfig};
pub use error::{SourceError, SourceResult};
pub use ingestion::{detect_source_kind, SourceKind, SourceReader};
pub use models::{Batch, RawRecord, Reading, SensorSummary, Snapshot};
pub use pipeline::{process_pipeline, process_pipeline_streaming, SnapshotStream};
pub use validation::{filter_chunk, validate_reading};
