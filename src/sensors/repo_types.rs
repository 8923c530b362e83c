use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// One stored reading from a device.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SensorReading {
    pub id: Uuid,
    pub sensor_id: String,
    pub temperature: f64,
    pub humidity: f64,
    pub air_quality: i32,
    pub category: String,
    #[serde(rename = "createdAt", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(rename = "updatedAt", with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Payload a device submits. Every field is required.
#[derive(Debug, Clone, Deserialize)]
pub struct NewReading {
    pub sensor_id: String,
    pub temperature: f64,
    pub humidity: f64,
    pub air_quality: i32,
    pub category: String,
}

/// Aggregates over a time window. All `None` and `count == 0` when empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SensorStats {
    pub avg_temperature: Option<f64>,
    pub avg_humidity: Option<f64>,
    pub avg_air_quality: Option<f64>,
    pub max_air_quality: Option<i32>,
    pub max_temperature: Option<f64>,
    pub min_temperature: Option<f64>,
    pub count: i64,
}
