use crate::db::PgStorage;
use crate::errors::{Error, Result};
use crate::metrics::MESSAGES_TOTAL;
use crate::pipeline::Pipeline;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

const TOPIC: &str = "herd/telemetry/#";

/// Subscribes to the telemetry topic and dispatches every publish into
/// its own pipeline invocation. On shutdown, intake stops first and all
/// in-flight invocations finish their transaction before this returns.
pub async fn run_mqtt(
    broker: String,
    port: u16,
    client_id: String,
    pipeline: Arc<Pipeline<PgStorage>>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    info!("Connecting to MQTT broker at {}:{}", broker, port);

    let mut mqtt_options = MqttOptions::new(client_id, broker, port);
    mqtt_options.set_keep_alive(std::time::Duration::from_secs(30));
    mqtt_options.set_clean_session(false);

    let (client, mut eventloop) = AsyncClient::new(mqtt_options, 10000);

    client
        .subscribe(TOPIC, QoS::AtLeastOnce)
        .await
        .map_err(Error::Mqtt)?;

    info!("Subscribed to {} with QoS 1", TOPIC);

    let mut inflight = JoinSet::new();

    loop {
        tokio::select! {
            notification = eventloop.poll() => {
                match notification {
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        MESSAGES_TOTAL.inc();

                        debug!(
                            "Received message on topic {}, size: {} bytes",
                            publish.topic,
                            publish.payload.len()
                        );

                        let pipeline = pipeline.clone();
                        inflight.spawn(async move {
                            pipeline.handle(&publish.payload).await;
                        });

                        // Reap whatever already finished
                        while inflight.try_join_next().is_some() {}
                    }
                    Ok(_) => {}
                    Err(e) => {
                        error!("MQTT error: {}", e);
                        // rumqttc reconnects by itself, just log and continue
                        tokio::time::sleep(std::time::Duration::from_secs(1)).await;
                    }
                }
            }
            _ = shutdown.changed() => {
                info!("Stopping intake, {} readings in flight", inflight.len());
                break;
            }
        }
    }

    // Let every open transaction commit or roll back before exiting
    while inflight.join_next().await.is_some() {}
    info!("All in-flight readings drained");

    Ok(())
}
