mod config;
mod db;
mod decode;
mod errors;
mod geo;
mod metrics;
mod model;
mod mqtt;
mod pipeline;
mod rest;
mod rules;

use axum::{routing::get, Router};
use db::PgStorage;
use pipeline::Pipeline;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let settings = match config::Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    info!("Starting herd ingestor");
    info!(
        "MQTT broker: {}:{}",
        settings.mqtt_broker, settings.mqtt_port
    );
    info!("HTTP server: {}", settings.http_addr);
    info!(
        "Database: {}",
        settings.database_url.split('@').last().unwrap_or("***")
    );
    info!(
        "Geofence: center ({}, {}), radius {} km",
        settings.geofence.center_lat, settings.geofence.center_lng, settings.geofence.radius_km
    );

    // Initialize metrics
    metrics::init_metrics();

    // Connect to database
    let pool = match db::make_pool(&settings.database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    let pipeline = Arc::new(Pipeline::new(
        PgStorage::new(pool.clone()),
        settings.geofence,
        settings.thresholds,
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Generate client ID
    let client_id = format!("ingestor-{}", uuid::Uuid::new_v4());
    let mqtt_broker = settings.mqtt_broker.clone();
    let mqtt_port = settings.mqtt_port;
    let mut mqtt_handle = tokio::spawn(async move {
        if let Err(e) =
            mqtt::run_mqtt(mqtt_broker, mqtt_port, client_id, pipeline, shutdown_rx).await
        {
            error!("MQTT task failed: {}", e);
        }
    });

    // Build HTTP app with the read API and metrics endpoint
    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .merge(rest::create_router(pool, settings.geofence));

    // Start HTTP server
    let listener = tokio::net::TcpListener::bind(&settings.http_addr)
        .await
        .unwrap_or_else(|e| {
            error!("Failed to bind to {}: {}", settings.http_addr, e);
            std::process::exit(1);
        });

    info!("HTTP server listening on {}", settings.http_addr);

    let mut server_handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap_or_else(|e| {
            error!("HTTP server error: {}", e);
        });
    });

    let mut draining = false;
    tokio::select! {
        _ = &mut mqtt_handle => {
            error!("MQTT task terminated");
        }
        _ = &mut server_handle => {
            error!("HTTP server terminated");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
            let _ = shutdown_tx.send(true);
            draining = true;
        }
    }

    // In-flight transactions commit or roll back before we exit
    if draining {
        if let Err(e) = mqtt_handle.await {
            error!("MQTT task panicked during drain: {}", e);
        }
    }

    info!("Shutting down");
}

async fn metrics_handler() -> String {
    metrics::gather_metrics()
}
