//! Single-pass validation and aggregation of sensor readings.
//!
//! The [`Aggregator`] keeps one running [`SensorState`] per sensor id and
//! folds batches into it as they arrive, so a source can be summarized in
//! one pass regardless of its size. It is not synchronized; callers sharing
//! one instance across tasks must serialize access themselves.

use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::models::{RawRecord, Reading, SensorSummary, Snapshot};
use crate::validation::validate_reading;

// ---

/// The only timestamp layout accepted at fold time.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Temperatures strictly below this count as anomalies.
pub const TEMPERATURE_LOW: f64 = 20.0;

/// Temperatures strictly above this count as anomalies.
pub const TEMPERATURE_HIGH: f64 = 40.0;

/// Whether a temperature lies outside the exclusive `[20.0, 40.0]` band.
pub fn is_temperature_anomaly(temperature: f64) -> bool {
    temperature > TEMPERATURE_HIGH || temperature < TEMPERATURE_LOW
}

/// Running totals for one sensor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorState {
    // ---
    pub ph_sum: f64,
    pub ph_count: u64,
    pub anomaly_count: u64,
    /// Parsed instant and original string of the latest reading.
    pub latest: Option<(NaiveDateTime, String)>,
}

impl SensorState {
    // ---
    /// Fold one reading into the running totals.
    pub fn fold(&mut self, reading: &Reading<'_>) {
        // ---
        self.ph_sum += reading.ph_value;
        self.ph_count += 1;

        if is_temperature_anomaly(reading.temperature) {
            self.anomaly_count += 1;
        }

        // Equal instants keep the reading folded first
        let newer = match &self.latest {
            Some((current, _)) => reading.recorded_at > *current,
            None => true,
        };
        if newer {
            self.latest = Some((reading.recorded_at, reading.timestamp.to_string()));
        }
    }

    /// Combine another sensor's totals into this one. Ties keep `self`.
    fn absorb(&mut self, other: SensorState) {
        // ---
        self.ph_sum += other.ph_sum;
        self.ph_count += other.ph_count;
        self.anomaly_count += other.anomaly_count;

        if let Some((instant, raw)) = other.latest {
            if self.latest.as_ref().map_or(true, |(current, _)| instant > *current) {
                self.latest = Some((instant, raw));
            }
        }
    }

    pub fn avg_ph(&self) -> f64 {
        // ---
        if self.ph_count > 0 {
            self.ph_sum / self.ph_count as f64
        } else {
            0.0
        }
    }

    fn summary(&self) -> SensorSummary {
        // ---
        SensorSummary {
            avg_ph: self.avg_ph(),
            anomaly_count: self.anomaly_count,
            latest_timestamp: self
                .latest
                .as_ref()
                .map(|(_, raw)| raw.clone())
                .unwrap_or_default(),
        }
    }
}

/// Validates raw records and maintains per-sensor aggregates across batches.
#[derive(Debug, Default)]
pub struct Aggregator {
    sensors: HashMap<String, SensorState>,
}

impl Aggregator {
    // ---
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and fold every record of `chunk`, in order.
    ///
    /// Invalid records and records whose timestamp does not match
    /// [`TIMESTAMP_FORMAT`] are skipped silently.
    pub fn process_chunk(&mut self, chunk: &[RawRecord]) {
        // ---
        for record in chunk {
            if !validate_reading(record) {
                continue;
            }
            let Some(reading) = parse_reading(record) else {
                continue;
            };

            self.sensors
                .entry(reading.sensor_id.to_string())
                .or_default()
                .fold(&reading);
        }
    }

    /// Current per-sensor results, computed fresh on every call.
    pub fn get_results(&self) -> Snapshot {
        // ---
        self.sensors
            .iter()
            .filter(|(_, state)| state.ph_count > 0)
            .map(|(id, state)| (id.clone(), state.summary()))
            .collect()
    }

    /// Fold another aggregator's state into this one.
    ///
    /// On equal latest timestamps the value already held here is kept.
    pub fn merge(&mut self, other: Aggregator) {
        // ---
        for (id, state) in other.sensors {
            self.sensors.entry(id).or_default().absorb(state);
        }
    }

    /// Drop all per-sensor state.
    pub fn reset(&mut self) {
        self.sensors.clear();
    }

    pub fn state(&self, sensor_id: &str) -> Option<&SensorState> {
        self.sensors.get(sensor_id)
    }

    pub fn sensor_count(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }
}

/// Summarize a single group of records with a fresh aggregator.
pub fn summarize(records: &[RawRecord]) -> Snapshot {
    // ---
    let mut aggregator = Aggregator::new();
    aggregator.process_chunk(records);
    aggregator.get_results()
}

/// Extract a typed reading from a record that already passed validation.
/// `None` when the timestamp does not parse.
fn parse_reading(record: &RawRecord) -> Option<Reading<'_>> {
    // ---
    let sensor_id = record.get("sensor_id")?.as_str()?;
    let timestamp = record.get("timestamp")?.as_str()?;
    if !has_timestamp_shape(timestamp) {
        return None;
    }
    let recorded_at = NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT).ok()?;

    Some(Reading {
        sensor_id,
        timestamp,
        recorded_at,
        ph_value: record.get("ph_value")?.as_f64()?,
        temperature: record.get("temperature")?.as_f64()?,
    })
}

/// Layout check run before chrono, which tolerates signs, leading
/// whitespace and a missing date/time separator.
///
/// Accepts `DDDD-D[D]-D[D]<whitespace>D[D]:D[D]` and nothing else.
fn has_timestamp_shape(raw: &str) -> bool {
    // ---
    fn digits(part: &str, min: usize, max: usize) -> bool {
        (min..=max).contains(&part.len()) && part.bytes().all(|b| b.is_ascii_digit())
    }

    let Some((date, time)) = raw.split_once(|c: char| c.is_ascii_whitespace()) else {
        return false;
    };
    let time = time.trim_start_matches(|c: char| c.is_ascii_whitespace());

    let date: Vec<&str> = date.split('-').collect();
    let time: Vec<&str> = time.split(':').collect();

    match (date.as_slice(), time.as_slice()) {
        ([year, month, day], [hour, minute]) => {
            digits(year, 4, 4)
                && digits(month, 1, 2)
                && digits(day, 1, 2)
                && digits(hour, 1, 2)
                && digits(minute, 1, 2)
        }
        _ => false,
    }
}
