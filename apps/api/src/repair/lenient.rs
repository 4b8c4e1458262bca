//! Tolerant conversion from a parsed document to a result shape.
//!
//! A document that parses is kept even when a few values have the wrong type:
//! nulls fall back to defaults, numbers may arrive as strings, and a field that
//! still does not fit is dropped rather than failing the whole result.

use serde::{
    de::{DeserializeOwned, Error},
    Deserialize, Deserializer,
};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// `f64` field that also accepts `"85"`, `"85%"` and `null` (as `0`).
pub fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Null => Ok(0.0),
        other => as_number(&other)
            .ok_or_else(|| D::Error::custom(format!("expected a number, found {other}"))),
    }
}

/// `u32` field that also accepts integral floats such as `1.0` and numeric strings.
pub fn whole<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let n = number(deserializer)?;
    if n.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&n) {
        Ok(n as u32)
    } else {
        Err(D::Error::custom(format!("expected a whole number, found {n}")))
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s
            .trim()
            .trim_end_matches('%')
            .trim_end()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite()),
        _ => None,
    }
}

/// Removes null object members and null array items at every depth.
pub fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(fields) => Value::Object(
            fields
                .into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .filter(|v| !v.is_null())
                .map(strip_nulls)
                .collect(),
        ),
        other => other,
    }
}

/// Converts a parsed document into `T`.
///
/// Tries the document as-is, then without nulls, then keeps top-level members one
/// at a time and drops each one that breaks the conversion. `None` only when the
/// document is not an object and does not convert.
pub fn conform<T: DeserializeOwned>(value: Value) -> Option<T> {
    let err = match serde_json::from_value::<T>(value.clone()) {
        Ok(v) => return Some(v),
        Err(e) => e,
    };
    debug!("Parsed output does not fit the result shape: {err}");

    let value = strip_nulls(value);
    if let Ok(v) = serde_json::from_value::<T>(value.clone()) {
        return Some(v);
    }

    let Value::Object(fields) = value else {
        return None;
    };
    let mut kept = Map::new();
    for (key, field) in fields {
        kept.insert(key.clone(), field);
        if serde_json::from_value::<T>(Value::Object(kept.clone())).is_err() {
            warn!("Dropping field {key:?} that does not fit the result shape");
            kept.remove(&key);
        }
    }
    serde_json::from_value(Value::Object(kept)).ok()
}
