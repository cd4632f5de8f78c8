//! Data models for the bioreactor sensor pipeline.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ---

/// One raw record as produced by a source reader.
///
/// No schema is enforced by producers; the validator is the only gatekeeper.
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// An ordered group of raw records produced by a source reader in one step.
pub type Batch = Vec<RawRecord>;

/// Full per-sensor result mapping at a point in time.
pub type Snapshot = BTreeMap<String, SensorSummary>;

/// A reading that passed validation and whose timestamp parsed.
///
/// Produced and immediately folded by the aggregator, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading<'a> {
    // ---
    pub sensor_id: &'a str,
    pub timestamp: &'a str,
    pub recorded_at: NaiveDateTime,
    pub ph_value: f64,
    pub temperature: f64,
}

/// Aggregated result for one sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSummary {
    // ---
    pub avg_ph: f64,
    pub anomaly_count: u64,
    pub latest_timestamp: String,
}

impl SensorSummary {
    // ---
    /// `(avg_ph, anomaly_count, latest_timestamp)`
    pub fn to_tuple(&self) -> (f64, u64, &str) {
        (self.avg_ph, self.anomaly_count, &self.latest_timestamp)
    }
}
