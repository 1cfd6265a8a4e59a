mod telemetry;

use clap::Parser;
use rumqttc::{AsyncClient, MqttOptions, QoS};
use std::time::Duration;
use telemetry::Scenario;
use tracing::{error, info, warn};

/// Publishes synthetic herd telemetry, forcing one device into each
/// alert scenario so the ingestor pipeline can be exercised end to end.
#[derive(Debug, Parser)]
struct Args {
    #[arg(long, env = "MQTT_BROKER", default_value = "localhost")]
    broker: String,

    #[arg(long, env = "MQTT_PORT", default_value_t = 1883)]
    port: u16,

    /// Number of simulated collar devices
    #[arg(long, env = "DEVICES", default_value_t = 4)]
    devices: usize,

    /// Seconds between reporting cycles
    #[arg(long, env = "INTERVAL_SECS", default_value_t = 15)]
    interval_secs: u64,

    #[arg(long, env = "GEOFENCE_CENTER_LAT", default_value_t = 20.734503)]
    center_lat: f64,

    #[arg(long, env = "GEOFENCE_CENTER_LNG", default_value_t = -103.455896)]
    center_lng: f64,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt::init();

    info!("Starting herd simulator");
    info!(
        "Broker: {}:{}, devices: {}, interval: {}s",
        args.broker, args.port, args.devices, args.interval_secs
    );

    let client_id = format!("sim-{}", uuid::Uuid::new_v4());
    let mut mqtt_options = MqttOptions::new(&client_id, &args.broker, args.port);
    mqtt_options.set_keep_alive(Duration::from_secs(30));
    mqtt_options.set_clean_session(true);

    let (client, mut eventloop) = AsyncClient::new(mqtt_options, 1000);

    // Spawn eventloop handler
    tokio::spawn(async move {
        loop {
            match eventloop.poll().await {
                Ok(_) => {}
                Err(e) => {
                    error!("MQTT eventloop error: {}", e);
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    });

    tokio::time::sleep(Duration::from_secs(2)).await;

    info!("Connected to MQTT broker, reporting every cycle");

    let mut rng = rand::thread_rng();
    let mut cycle = 0u64;

    loop {
        for index in 0..args.devices {
            let device_id = format!("C{}", index + 1);
            let scenario = Scenario::for_device(index);
            let reading = telemetry::generate_reading(
                &mut rng,
                device_id.clone(),
                scenario,
                args.center_lat,
                args.center_lng,
            );

            let topic = format!("herd/telemetry/{}", device_id);
            let payload = match serde_json::to_string(&reading) {
                Ok(p) => p,
                Err(e) => {
                    error!("Failed to serialize reading: {}", e);
                    continue;
                }
            };

            match client.publish(&topic, QoS::AtLeastOnce, false, payload).await {
                Ok(_) => {
                    info!(
                        "{} [{:?}]: temp={} pulse={} at ({:.4}, {:.4})",
                        device_id,
                        scenario,
                        reading.temperature,
                        reading.pulse,
                        reading.lat,
                        reading.lng
                    );
                }
                Err(e) => {
                    warn!("Failed to publish for {}: {}", device_id, e);
                }
            }
        }

        cycle += 1;
        if cycle % 20 == 0 {
            info!("Completed {} reporting cycles", cycle);
        }

        tokio::time::sleep(Duration::from_secs(args.interval_secs)).await;
    }
}
