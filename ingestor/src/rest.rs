use crate::config::GeofenceConfig;
use crate::model::{AlertRecord, RoutePoint, RouteResponse};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use tracing::error;

#[derive(Debug, Clone)]
struct AppState {
    pool: PgPool,
    geofence: GeofenceConfig,
}

#[derive(Debug, Deserialize)]
pub struct AlertsQuery {
    limit: Option<i64>,
}

/// Read-only projections of persisted data for downstream consumers.
/// The pipeline only ever writes; nothing here feeds back into it.
pub fn create_router(pool: PgPool, geofence: GeofenceConfig) -> Router {
    let state = AppState { pool, geofence };

    Router::new()
        .route("/api/v1/geofence", get(get_geofence))
        .route("/api/v1/devices", get(list_devices))
        .route("/api/v1/devices/:device_id/route", get(get_route))
        .route("/api/v1/alerts", get(recent_alerts))
        .with_state(state)
}

async fn get_geofence(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "center": {
            "lat": state.geofence.center_lat,
            "lng": state.geofence.center_lng,
        },
        "radius_km": state.geofence.radius_km,
    }))
}

async fn list_devices(State(state): State<AppState>) -> Result<Json<Vec<String>>, AppError> {
    let devices: Vec<String> =
        sqlx::query_scalar("SELECT DISTINCT device_id FROM location ORDER BY device_id")
            .fetch_all(&state.pool)
            .await?;

    Ok(Json(devices))
}

async fn get_route(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
) -> Result<Json<RouteResponse>, AppError> {
    let route: Vec<RoutePoint> =
        sqlx::query_as("SELECT lat, lng, ts FROM location WHERE device_id = $1 ORDER BY ts ASC")
            .bind(&device_id)
            .fetch_all(&state.pool)
            .await?;

    Ok(Json(RouteResponse { device_id, route }))
}

async fn recent_alerts(
    State(state): State<AppState>,
    Query(params): Query<AlertsQuery>,
) -> Result<Json<Vec<AlertRecord>>, AppError> {
    let limit = params.limit.unwrap_or(20).clamp(1, 100);

    let alerts: Vec<AlertRecord> = sqlx::query_as(
        "SELECT device_id, ts, kind, message, lat, lng
         FROM alert
         ORDER BY ts DESC
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(alerts))
}

struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!("API error: {}", self.0);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Internal server error: {}", self.0),
        )
            .into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
