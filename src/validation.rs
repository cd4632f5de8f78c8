//! Record validation for raw sensor readings.
//!
//! Validity here means "well-typed fields": a present, non-empty sensor id
//! and timestamp plus non-negative numeric pH and temperature. Whether the
//! timestamp actually parses is decided later, when the aggregator folds the
//! reading, so a record can pass this check and still be dropped.

use serde_json::Value;

use crate::models::RawRecord;

// ---

/// Decide whether a raw record is a valid reading.
///
/// Never fails; malformed input is simply invalid. All conditions must hold:
/// 1. `sensor_id` is a non-empty string
/// 2. `timestamp` is present and non-empty
/// 3. `ph_value` is present and not null
/// 4. `temperature` is present and not null
/// 5. both measurements are JSON numbers (numeric-looking strings and
///    booleans are rejected)
/// 6. both measurements are `>= 0`
pub fn validate_reading(record: &RawRecord) -> bool {
    // ---
    let sensor_present = matches!(record.get("sensor_id"), Some(Value::String(id)) if !id.is_empty());
    if !sensor_present || !record.get("timestamp").is_some_and(is_truthy) {
        return false;
    }

    let (ph_value, temperature) = match (record.get("ph_value"), record.get("temperature")) {
        (Some(ph), Some(temp)) if !ph.is_null() && !temp.is_null() => (ph, temp),
        _ => return false,
    };

    match (ph_value.as_f64(), temperature.as_f64()) {
        (Some(ph), Some(temp)) => ph >= 0.0 && temp >= 0.0,
        _ => false,
    }
}

/// Records of `chunk` that pass [`validate_reading`], in their original order.
pub fn filter_chunk(chunk: &[RawRecord]) -> Vec<&RawRecord> {
    chunk.iter().filter(|r| validate_reading(r)).collect()
}

/// Presence test for loosely typed fields: null, `false`, zero and empty
/// containers count as absent.
fn is_truthy(value: &Value) -> bool {
    // ---
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
