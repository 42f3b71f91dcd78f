//! Request body parsing
//!
//! Start bodies are coerced rather than rejected: any field that is missing
//! or not a usable number counts as zero.

use serde_json::Value;

use crate::state::CountdownLength;

/// Parse a `/api/start` body into a countdown length.
pub fn parse_start_body(body: &[u8]) -> CountdownLength {
    let value: Value = match serde_json::from_slice(body) {
        Ok(v) => v,
        Err(_) => return CountdownLength::default(),
    };

    CountdownLength {
        hours: coerce_field(&value, "hours"),
        minutes: coerce_field(&value, "minutes"),
        seconds: coerce_field(&value, "seconds"),
    }
}

fn coerce_field(body: &Value, field: &str) -> u64 {
    body.get(field).map(coerce_count).unwrap_or(0)
}

/// Non-negative whole count from a JSON value.
///
/// Floats truncate, negatives clamp to zero, and strings contribute their
/// leading digits (`"5m"` is 5).
pub fn coerce_count(value: &Value) -> u64 {
    match value {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                u
            } else if let Some(f) = n.as_f64() {
                // `as` saturates and maps NaN to 0
                if f > 0.0 { f.trunc() as u64 } else { 0 }
            } else {
                0
            }
        }
        Value::String(s) => {
            let s = s.trim();
            let digits: &str = match s.find(|c: char| !c.is_ascii_digit()) {
                Some(end) => &s[..end],
                None => s,
            };
            digits.parse().unwrap_or(if digits.is_empty() { 0 } else { u64::MAX })
        }
        _ => 0,
    }
}
