use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// One telemetry event from a collar device, validated and typed.
/// Immutable for the lifetime of the pipeline step that produced it.
#[derive(Debug, Clone)]
pub struct TelemetryReading {
    pub device_id: String,
    pub timestamp: DateTime<Utc>,
    pub lat: f64,
    pub lng: f64,
    pub area: String,
    pub temperature: f64,
    pub pulse: i32,
    pub risk_flag: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AlertKind {
    TemperatureHigh,
    TemperatureLow,
    PulseHigh,
    PulseLow,
    GeofenceBreach,
    RiskFlagged,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::TemperatureHigh => "temperature_high",
            AlertKind::TemperatureLow => "temperature_low",
            AlertKind::PulseHigh => "pulse_high",
            AlertKind::PulseLow => "pulse_low",
            AlertKind::GeofenceBreach => "geofence_breach",
            AlertKind::RiskFlagged => "risk_flagged",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rule violation derived from a single reading. Coordinates are the
/// position at which the condition was observed.
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub device_id: String,
    pub ts: DateTime<Utc>,
    pub kind: AlertKind,
    pub message: String,
    pub lat: f64,
    pub lng: f64,
}

impl TelemetryReading {
    pub fn alert(&self, kind: AlertKind, message: String) -> Alert {
        Alert {
            device_id: self.device_id.clone(),
            ts: self.timestamp,
            kind,
            message,
            lat: self.lat,
            lng: self.lng,
        }
    }
}

/// Persisted alert as served by the read API.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct AlertRecord {
    pub device_id: String,
    pub ts: DateTime<Utc>,
    pub kind: String,
    pub message: String,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct RoutePoint {
    pub lat: f64,
    pub lng: f64,
    pub ts: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct RouteResponse {
    pub device_id: String,
    pub route: Vec<RoutePoint>,
}
