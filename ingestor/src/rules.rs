use crate::config::{AlertThresholds, GeofenceConfig};
use crate::geo::distance_km;
use crate::model::{Alert, AlertKind, TelemetryReading};

/// Evaluates the safety rules for one reading. Predicates run in a fixed
/// order (geofence, temperature, pulse, risk flag) so the output sequence
/// is deterministic. An empty result is the nominal case.
pub fn evaluate(
    reading: &TelemetryReading,
    geofence: &GeofenceConfig,
    thresholds: &AlertThresholds,
) -> Vec<Alert> {
    let mut alerts = Vec::new();

    let distance = distance_km(
        reading.lat,
        reading.lng,
        geofence.center_lat,
        geofence.center_lng,
    );
    if distance > geofence.radius_km {
        alerts.push(reading.alert(
            AlertKind::GeofenceBreach,
            format!(
                "{:.2} km from geofence center (radius {} km)",
                distance, geofence.radius_km
            ),
        ));
    }

    // High and low are mutually exclusive per reading
    if reading.temperature > thresholds.temp_high {
        alerts.push(reading.alert(
            AlertKind::TemperatureHigh,
            format!(
                "temperature {} C above threshold {} C",
                reading.temperature, thresholds.temp_high
            ),
        ));
    } else if let Some(temp_low) = thresholds.temp_low {
        if reading.temperature < temp_low {
            alerts.push(reading.alert(
                AlertKind::TemperatureLow,
                format!(
                    "temperature {} C below threshold {} C",
                    reading.temperature, temp_low
                ),
            ));
        }
    }

    if reading.pulse > thresholds.pulse_high {
        alerts.push(reading.alert(
            AlertKind::PulseHigh,
            format!(
                "pulse {} bpm above threshold {} bpm",
                reading.pulse, thresholds.pulse_high
            ),
        ));
    } else if reading.pulse < thresholds.pulse_low {
        alerts.push(reading.alert(
            AlertKind::PulseLow,
            format!(
                "pulse {} bpm below threshold {} bpm",
                reading.pulse, thresholds.pulse_low
            ),
        ));
    }

    if reading.risk_flag {
        alerts.push(reading.alert(
            AlertKind::RiskFlagged,
            "device reported risk flag".to_string(),
        ));
    }

    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn geofence() -> GeofenceConfig {
        GeofenceConfig {
            center_lat: 20.734503,
            center_lng: -103.455896,
            radius_km: 2.0,
        }
    }

    fn thresholds() -> AlertThresholds {
        AlertThresholds {
            temp_high: 39.5,
            temp_low: Some(37.5),
            pulse_high: 85,
            pulse_low: 50,
        }
    }

    fn reading() -> TelemetryReading {
        TelemetryReading {
            device_id: "C1".to_string(),
            timestamp: Utc::now(),
            lat: 20.734503,
            lng: -103.455896,
            area: "north paddock".to_string(),
            temperature: 38.5,
            pulse: 70,
            risk_flag: false,
        }
    }

    #[test]
    fn test_nominal_reading_yields_no_alerts() {
        let alerts = evaluate(&reading(), &geofence(), &thresholds());
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_geofence_breach_message_rounds_distance() {
        let mut r = reading();
        r.lat += 1.0; // ~111 km north
        let alerts = evaluate(&r, &geofence(), &thresholds());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::GeofenceBreach);
        assert!(alerts[0].message.contains("111.19"), "{}", alerts[0].message);
        // Alert carries the breach position, not the fence center
        assert_eq!(alerts[0].lat, r.lat);
        assert_eq!(alerts[0].lng, r.lng);
    }

    #[test]
    fn test_temperature_high() {
        let mut r = reading();
        r.temperature = 40.1;
        let alerts = evaluate(&r, &geofence(), &thresholds());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::TemperatureHigh);
        assert!(alerts[0].message.contains("40.1"));
    }

    #[test]
    fn test_temperature_low_only_when_configured() {
        let mut r = reading();
        r.temperature = 36.0;
        let alerts = evaluate(&r, &geofence(), &thresholds());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::TemperatureLow);

        let mut no_low = thresholds();
        no_low.temp_low = None;
        assert!(evaluate(&r, &geofence(), &no_low).is_empty());
    }

    #[test]
    fn test_temperature_high_and_low_are_exclusive() {
        // An inverted configuration cannot produce both alerts at once
        let inverted = AlertThresholds {
            temp_high: 37.0,
            temp_low: Some(39.0),
            pulse_high: 85,
            pulse_low: 50,
        };
        let mut r = reading();
        r.temperature = 39.8;
        let kinds: Vec<_> = evaluate(&r, &geofence(), &inverted)
            .into_iter()
            .map(|a| a.kind)
            .collect();
        assert_eq!(kinds, vec![AlertKind::TemperatureHigh]);
    }

    #[test]
    fn test_pulse_bounds_are_exclusive() {
        let mut r = reading();
        r.pulse = 45;
        let alerts = evaluate(&r, &geofence(), &thresholds());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::PulseLow);

        r.pulse = 90;
        let alerts = evaluate(&r, &geofence(), &thresholds());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::PulseHigh);
    }

    #[test]
    fn test_threshold_boundaries_are_strict() {
        let mut r = reading();
        r.temperature = 39.5;
        r.pulse = 85;
        assert!(evaluate(&r, &geofence(), &thresholds()).is_empty());
        r.temperature = 37.5;
        r.pulse = 50;
        assert!(evaluate(&r, &geofence(), &thresholds()).is_empty());
    }

    #[test]
    fn test_risk_flag_is_independent() {
        let mut r = reading();
        r.risk_flag = true;
        let alerts = evaluate(&r, &geofence(), &thresholds());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::RiskFlagged);

        // Alongside a fever and a breach, in evaluation order
        r.temperature = 39.9;
        r.lat += 1.0;
        let kinds: Vec<_> = evaluate(&r, &geofence(), &thresholds())
            .into_iter()
            .map(|a| a.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                AlertKind::GeofenceBreach,
                AlertKind::TemperatureHigh,
                AlertKind::RiskFlagged
            ]
        );
    }
}
