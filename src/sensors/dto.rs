use serde::{Deserialize, Serialize};

use crate::sensors::repo_types::{SensorReading, SensorStats};

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub message: String,
    pub data: SensorReading,
}

#[derive(Debug, Serialize)]
pub struct LatestResponse {
    pub data: Option<SensorReading>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub data: Vec<SensorReading>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub stats: SensorStats,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default = "default_hours")]
    pub hours: f64,
}

fn default_limit() -> u32 {
    50
}
fn default_hours() -> f64 {
    24.0
}
