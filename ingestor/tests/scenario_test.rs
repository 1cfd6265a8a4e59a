use chrono::Utc;
use rand::Rng;
use rumqttc::{AsyncClient, MqttOptions, QoS};
use serde_json::json;
use std::time::Duration;
use tokio::time::sleep;

const CENTER_LAT: f64 = 20.734503;
const CENTER_LNG: f64 = -103.455896;

/// Publishes one nominal reading and three forced-alert readings against
/// a live broker + ingestor + database. Run with a stack up:
///
///   cargo test --test scenario_test -- --ignored
///
/// Expected outcome, checked via GET /api/v1/alerts: one geofence
/// breach, one temperature high (+risk), one pulse low (+risk), and
/// four location/health row pairs.
#[tokio::test]
#[ignore]
async fn test_forced_alert_scenarios() {
    let mut mqtt_options = MqttOptions::new("scenario-test", "localhost", 1883);
    mqtt_options.set_keep_alive(Duration::from_secs(30));

    let (client, mut eventloop) = AsyncClient::new(mqtt_options, 100);

    tokio::spawn(async move {
        loop {
            if let Err(e) = eventloop.poll().await {
                eprintln!("MQTT error: {}", e);
                break;
            }
        }
    });

    sleep(Duration::from_millis(500)).await;

    let mut rng = rand::thread_rng();
    let jitter: f64 = rng.gen_range(-0.001..0.001);

    let scenarios = vec![
        // Nominal: inside the fence, healthy vitals
        json!({
            "device_id": "scenario-nominal",
            "timestamp": Utc::now().to_rfc3339(),
            "lat": CENTER_LAT + jitter,
            "lng": CENTER_LNG + jitter,
            "area": "north paddock",
            "temperature": 38.5,
            "pulse": 70,
            "risk_flag": false
        }),
        // One degree north: far outside any sane radius
        json!({
            "device_id": "scenario-strayed",
            "timestamp": Utc::now().to_rfc3339(),
            "lat": CENTER_LAT + 1.0,
            "lng": CENTER_LNG,
            "area": "outside",
            "temperature": 38.5,
            "pulse": 70,
            "risk_flag": false
        }),
        // Fever with the device risk flag set
        json!({
            "device_id": "scenario-fever",
            "timestamp": Utc::now().to_rfc3339(),
            "lat": CENTER_LAT,
            "lng": CENTER_LNG,
            "area": "north paddock",
            "temperature": 39.9,
            "pulse": 78,
            "risk_flag": true
        }),
        // Critically low pulse
        json!({
            "device_id": "scenario-low-pulse",
            "timestamp": Utc::now().to_rfc3339(),
            "lat": CENTER_LAT,
            "lng": CENTER_LNG,
            "area": "north paddock",
            "temperature": 38.4,
            "pulse": 45,
            "risk_flag": true
        }),
    ];

    let mut sent = 0;
    for payload in &scenarios {
        let device_id = payload["device_id"].as_str().unwrap();
        let topic = format!("herd/telemetry/{}", device_id);
        client
            .publish(&topic, QoS::AtLeastOnce, false, payload.to_string())
            .await
            .unwrap_or_else(|e| panic!("publish to {} failed: {}", topic, e));
        sent += 1;
    }

    // Give the pipeline time to commit before the process exits
    sleep(Duration::from_secs(2)).await;

    assert_eq!(sent, scenarios.len());
    println!("Published {} scenario readings", sent);
}
