use crate::errors::{Result, StorageError};
use crate::model::{Alert, TelemetryReading};
use sqlx::postgres::{PgPool, PgPoolOptions, Postgres};
use sqlx::Transaction;
use std::time::Duration;
use tracing::info;

pub async fn make_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url)
        .await
        .map_err(StorageError::Database)?;

    info!("Database connection established");
    info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(StorageError::Migration)?;
    info!("Migrations completed");

    Ok(pool)
}

/// Hands out one independent unit of work per pipeline invocation.
/// Concurrent invocations never share a connection or transaction.
#[allow(async_fn_in_trait)]
pub trait Storage {
    type Unit: StorageUnit;

    async fn begin(&self) -> std::result::Result<Self::Unit, StorageError>;
}

/// One transaction scope: the raw reading and its alerts go in together
/// or not at all. Dropping a unit without committing rolls it back.
#[allow(async_fn_in_trait)]
pub trait StorageUnit {
    async fn insert_location(
        &mut self,
        reading: &TelemetryReading,
    ) -> std::result::Result<(), StorageError>;

    async fn insert_health(
        &mut self,
        reading: &TelemetryReading,
    ) -> std::result::Result<(), StorageError>;

    async fn insert_alert(&mut self, alert: &Alert) -> std::result::Result<(), StorageError>;

    async fn commit(self) -> std::result::Result<(), StorageError>;
}

#[derive(Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl Storage for PgStorage {
    type Unit = PgUnit;

    async fn begin(&self) -> std::result::Result<PgUnit, StorageError> {
        let tx = self.pool.begin().await.map_err(|e| match e {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                StorageError::Unavailable(e.to_string())
            }
            other => StorageError::Database(other),
        })?;
        Ok(PgUnit { tx })
    }
}

pub struct PgUnit {
    tx: Transaction<'static, Postgres>,
}

impl StorageUnit for PgUnit {
    async fn insert_location(
        &mut self,
        reading: &TelemetryReading,
    ) -> std::result::Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO location (device_id, ts, lat, lng, area)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&reading.device_id)
        .bind(reading.timestamp)
        .bind(reading.lat)
        .bind(reading.lng)
        .bind(&reading.area)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn insert_health(
        &mut self,
        reading: &TelemetryReading,
    ) -> std::result::Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO health (device_id, ts, temperature, pulse, risk_flag)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&reading.device_id)
        .bind(reading.timestamp)
        .bind(reading.temperature)
        .bind(reading.pulse)
        .bind(reading.risk_flag)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn insert_alert(&mut self, alert: &Alert) -> std::result::Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO alert (device_id, ts, kind, message, lat, lng)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&alert.device_id)
        .bind(alert.ts)
        .bind(alert.kind.as_str())
        .bind(&alert.message)
        .bind(alert.lat)
        .bind(alert.lng)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn commit(self) -> std::result::Result<(), StorageError> {
        self.tx.commit().await?;
        Ok(())
    }
}
