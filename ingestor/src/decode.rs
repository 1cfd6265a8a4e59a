use crate::errors::DecodeError;
use crate::model::TelemetryReading;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};

const DEFAULT_AREA: &str = "unassigned";

/// Parses an inbound payload into a typed reading. All-or-nothing: any
/// missing, mistyped, or out-of-range field rejects the whole message.
pub fn decode(payload: &[u8]) -> Result<TelemetryReading, DecodeError> {
    let value: Value = serde_json::from_slice(payload)
        .map_err(|e| DecodeError::MalformedPayload(e.to_string()))?;
    let obj = value
        .as_object()
        .ok_or_else(|| DecodeError::MalformedPayload("payload is not a JSON object".to_string()))?;

    let device_id = require_str(obj, "device_id")?;
    if device_id.is_empty() {
        return Err(DecodeError::OutOfRange("device_id"));
    }

    let timestamp = parse_timestamp(require_str(obj, "timestamp")?)?;

    let lat = require_f64(obj, "lat")?;
    if !(-90.0..=90.0).contains(&lat) {
        return Err(DecodeError::OutOfRange("lat"));
    }
    let lng = require_f64(obj, "lng")?;
    if !(-180.0..=180.0).contains(&lng) {
        return Err(DecodeError::OutOfRange("lng"));
    }

    // Devices without an assigned paddock omit the label
    let area = match obj.get("area") {
        None | Some(Value::Null) => DEFAULT_AREA.to_string(),
        Some(v) => v
            .as_str()
            .ok_or(DecodeError::TypeMismatch("area"))?
            .to_string(),
    };

    let temperature = require_f64(obj, "temperature")?;

    let pulse = require(obj, "pulse")?
        .as_i64()
        .ok_or(DecodeError::TypeMismatch("pulse"))?;
    let pulse = i32::try_from(pulse).map_err(|_| DecodeError::OutOfRange("pulse"))?;

    let risk_flag = require(obj, "risk_flag")?
        .as_bool()
        .ok_or(DecodeError::TypeMismatch("risk_flag"))?;

    Ok(TelemetryReading {
        device_id: device_id.to_string(),
        timestamp,
        lat,
        lng,
        area,
        temperature,
        pulse,
        risk_flag,
    })
}

fn require<'a>(obj: &'a Map<String, Value>, field: &'static str) -> Result<&'a Value, DecodeError> {
    obj.get(field).ok_or(DecodeError::MissingField(field))
}

fn require_str<'a>(obj: &'a Map<String, Value>, field: &'static str) -> Result<&'a str, DecodeError> {
    require(obj, field)?
        .as_str()
        .ok_or(DecodeError::TypeMismatch(field))
}

fn require_f64(obj: &Map<String, Value>, field: &'static str) -> Result<f64, DecodeError> {
    require(obj, field)?
        .as_f64()
        .ok_or(DecodeError::TypeMismatch(field))
}

/// Collar firmware emits bare ISO-8601 without an offset; newer revisions
/// send RFC 3339. Naive timestamps are taken as UTC.
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DecodeError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| DecodeError::TypeMismatch("timestamp"))
}
