use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;

use crate::sensors::repo_types::{NewReading, SensorReading, SensorStats};

/// Time-series storage for sensor readings. Listings are newest first.
#[async_trait]
pub trait ReadingStore: Send + Sync {
    async fn insert(&self, reading: NewReading) -> anyhow::Result<SensorReading>;
    async fn find_latest(&self) -> anyhow::Result<Option<SensorReading>>;
    /// Rows with `created_at >= since`, at most `limit`.
    async fn find_history(
        &self,
        since: OffsetDateTime,
        limit: i64,
    ) -> anyhow::Result<Vec<SensorReading>>;
    async fn find_by_sensor(&self, sensor_id: &str, limit: i64)
        -> anyhow::Result<Vec<SensorReading>>;
    async fn aggregate_stats(&self, since: OffsetDateTime) -> anyhow::Result<SensorStats>;
    /// Deletes rows with `created_at < cutoff`; returns how many went.
    async fn delete_older_than(&self, cutoff: OffsetDateTime) -> anyhow::Result<u64>;
}

#[derive(Clone)]
pub struct PgReadingStore {
    db: PgPool,
}

impl PgReadingStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ReadingStore for PgReadingStore {
    async fn insert(&self, reading: NewReading) -> anyhow::Result<SensorReading> {
        let row = sqlx::query_as::<_, SensorReading>(
            r#"
            INSERT INTO sensor_data (sensor_id, temperature, humidity, air_quality, category)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, sensor_id, temperature, humidity, air_quality, category,
                      created_at, updated_at
            "#,
        )
        .bind(&reading.sensor_id)
        .bind(reading.temperature)
        .bind(reading.humidity)
        .bind(reading.air_quality)
        .bind(&reading.category)
        .fetch_one(&self.db)
        .await
        .context("insert sensor reading")?;
        Ok(row)
    }

    async fn find_latest(&self) -> anyhow::Result<Option<SensorReading>> {
        let row = sqlx::query_as::<_, SensorReading>(
            r#"
            SELECT id, sensor_id, temperature, humidity, air_quality, category,
                   created_at, updated_at
              FROM sensor_data
             ORDER BY created_at DESC
             LIMIT 1
            "#,
        )
        .fetch_optional(&self.db)
        .await
        .context("fetch latest reading")?;
        Ok(row)
    }

    async fn find_history(
        &self,
        since: OffsetDateTime,
        limit: i64,
    ) -> anyhow::Result<Vec<SensorReading>> {
        let rows = sqlx::query_as::<_, SensorReading>(
            r#"
            SELECT id, sensor_id, temperature, humidity, air_quality, category,
                   created_at, updated_at
              FROM sensor_data
             WHERE created_at >= $1
             ORDER BY created_at DESC
             LIMIT $2
            "#,
        )
        .bind(since)
        .bind(limit)
        .fetch_all(&self.db)
        .await
        .context("fetch reading history")?;
        Ok(rows)
    }

    async fn find_by_sensor(
        &self,
        sensor_id: &str,
        limit: i64,
    ) -> anyhow::Result<Vec<SensorReading>> {
        let rows = sqlx::query_as::<_, SensorReading>(
            r#"
            SELECT id, sensor_id, temperature, humidity, air_quality, category,
                   created_at, updated_at
              FROM sensor_data
             WHERE sensor_id = $1
             ORDER BY created_at DESC
             LIMIT $2
            "#,
        )
        .bind(sensor_id)
        .bind(limit)
        .fetch_all(&self.db)
        .await
        .context("fetch readings by sensor")?;
        Ok(rows)
    }

    async fn aggregate_stats(&self, since: OffsetDateTime) -> anyhow::Result<SensorStats> {
        // AVG over an integer column yields NUMERIC; cast to keep it f64.
        let stats = sqlx::query_as::<_, SensorStats>(
            r#"
            SELECT AVG(temperature)           AS avg_temperature,
                   AVG(humidity)              AS avg_humidity,
                   AVG(air_quality)::float8   AS avg_air_quality,
                   MAX(air_quality)           AS max_air_quality,
                   MAX(temperature)           AS max_temperature,
                   MIN(temperature)           AS min_temperature,
                   COUNT(id)                  AS count
              FROM sensor_data
             WHERE created_at >= $1
            "#,
        )
        .bind(since)
        .fetch_one(&self.db)
        .await
        .context("aggregate sensor stats")?;
        Ok(stats)
    }

    async fn delete_older_than(&self, cutoff: OffsetDateTime) -> anyhow::Result<u64> {
        let res = sqlx::query(r#"DELETE FROM sensor_data WHERE created_at < $1"#)
            .bind(cutoff)
            .execute(&self.db)
            .await
            .context("delete old readings")?;
        Ok(res.rows_affected())
    }
}
