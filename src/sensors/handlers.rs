use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use time::{Duration, OffsetDateTime};
use tracing::{info, instrument};

use crate::{
    auth::{api_key::require_api_key, AuthUser},
    error::AppError,
    sensors::{
        dto::{HistoryQuery, HistoryResponse, IngestResponse, LatestResponse, StatsResponse},
        repo_types::NewReading,
    },
    state::AppState,
};

const STATS_WINDOW_HOURS: i64 = 24;

// --- public routers ---

/// Device ingestion, gated by the shared API key.
pub fn ingest_routes(state: AppState) -> Router<AppState> {
    Router::new().route(
        "/sensor-data",
        post(ingest).route_layer(middleware::from_fn_with_state(state, require_api_key)),
    )
}

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/sensor-data/latest", get(latest))
        .route("/sensor-data/history", get(history))
        .route("/sensor-data/stats", get(stats))
}

// --- handlers ---

#[instrument(skip_all)]
pub async fn ingest(
    State(state): State<AppState>,
    payload: Result<Json<NewReading>, JsonRejection>,
) -> Result<(StatusCode, Json<IngestResponse>), AppError> {
    let Json(reading) = payload?;
    let stored = state.readings.insert(reading).await?;
    info!(id = %stored.id, sensor_id = %stored.sensor_id, "reading stored");
    Ok((
        StatusCode::CREATED,
        Json(IngestResponse {
            message: "Data received successfully".into(),
            data: stored,
        }),
    ))
}

#[instrument(skip_all)]
pub async fn latest(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Json<LatestResponse>, AppError> {
    let data = state.readings.find_latest().await?;
    Ok(Json(LatestResponse { data }))
}

#[instrument(skip_all)]
pub async fn history(
    State(state): State<AppState>,
    _user: AuthUser,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<HistoryResponse>, AppError> {
    let Query(q) = query?;
    let since = window_start(OffsetDateTime::now_utc(), q.hours)?;
    let data = state
        .readings
        .find_history(since, i64::from(q.limit))
        .await?;
    Ok(Json(HistoryResponse { data }))
}

#[instrument(skip_all)]
pub async fn stats(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Json<StatsResponse>, AppError> {
    let since = OffsetDateTime::now_utc() - Duration::hours(STATS_WINDOW_HOURS);
    let stats = state.readings.aggregate_stats(since).await?;
    Ok(Json(StatsResponse { stats }))
}

/// `now - hours`; fractional hours are honored.
fn window_start(now: OffsetDateTime, hours: f64) -> Result<OffsetDateTime, AppError> {
    if !hours.is_finite() || hours < 0.0 {
        return Err(AppError::validation("hours must be a non-negative number"));
    }
    now.checked_sub(Duration::saturating_seconds_f64(hours * 3600.0))
        .ok_or_else(|| AppError::validation("hours is out of range"))
}
