use crate::config::{AlertThresholds, GeofenceConfig};
use crate::db::{Storage, StorageUnit};
use crate::decode::decode;
use crate::errors::StorageError;
use crate::metrics::{
    ALERTS_TOTAL, INGEST_LATENCY_SECONDS, INVALID_MESSAGES_TOTAL, READINGS_PERSISTED_TOTAL,
    STORAGE_FAILURES_TOTAL,
};
use crate::model::{Alert, TelemetryReading};
use crate::rules::evaluate;
use tokio::time::Instant;
use tracing::{error, info, warn};

/// Per-message ingestion: decode, evaluate rules, persist atomically.
/// One invocation per inbound message; invocations may overlap, each on
/// its own transaction checked out from the shared pool.
pub struct Pipeline<S> {
    store: S,
    geofence: GeofenceConfig,
    thresholds: AlertThresholds,
}

impl<S: Storage> Pipeline<S> {
    pub fn new(store: S, geofence: GeofenceConfig, thresholds: AlertThresholds) -> Self {
        Self {
            store,
            geofence,
            thresholds,
        }
    }

    /// Handles one inbound message. Never retries and never panics on bad
    /// input: undecodable messages are dropped with a log record, storage
    /// failures roll the whole reading back. Redelivery is the
    /// transport's concern; a redelivered message simply inserts
    /// duplicate rows.
    pub async fn handle(&self, payload: &[u8]) {
        let reading = match decode(payload) {
            Ok(reading) => reading,
            Err(e) => {
                INVALID_MESSAGES_TOTAL.inc();
                warn!(error = %e, "dropping undecodable message");
                return;
            }
        };

        let start = Instant::now();
        let alerts = evaluate(&reading, &self.geofence, &self.thresholds);

        match self.persist(&reading, &alerts).await {
            Ok(()) => {
                READINGS_PERSISTED_TOTAL.inc();
                ALERTS_TOTAL.inc_by(alerts.len() as f64);
                INGEST_LATENCY_SECONDS.observe(start.elapsed().as_secs_f64());
                info!(
                    device_id = %reading.device_id,
                    alerts = alerts.len(),
                    "reading persisted"
                );
            }
            Err(e) => {
                STORAGE_FAILURES_TOTAL.inc();
                error!(
                    device_id = %reading.device_id,
                    error = %e,
                    "reading rolled back"
                );
            }
        }
    }

    /// One location row, one health row, and every alert row commit as a
    /// unit. Any error drops the transaction, which rolls back all
    /// staged inserts.
    async fn persist(
        &self,
        reading: &TelemetryReading,
        alerts: &[Alert],
    ) -> Result<(), StorageError> {
        let mut unit = self.store.begin().await?;
        unit.insert_location(reading).await?;
        unit.insert_health(reading).await?;
        for alert in alerts {
            unit.insert_alert(alert).await?;
        }
        unit.commit().await
    }
}
