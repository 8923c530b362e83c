use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::sensors::{
    repo::ReadingStore,
    repo_types::{NewReading, SensorReading, SensorStats},
};

#[derive(Default)]
pub struct InMemoryReadingStore {
    rows: Mutex<Vec<SensorReading>>,
}

impl InMemoryReadingStore {
    /// Inserts with an explicit ingestion time, for backdated fixtures.
    pub fn insert_at(&self, reading: NewReading, at: OffsetDateTime) -> SensorReading {
        let row = SensorReading {
            id: Uuid::new_v4(),
            sensor_id: reading.sensor_id,
            temperature: reading.temperature,
            humidity: reading.humidity,
            air_quality: reading.air_quality,
            category: reading.category,
            created_at: at,
            updated_at: at,
        };
        self.rows.lock().unwrap().push(row.clone());
        row
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    fn newest_first<F>(&self, keep: F, limit: i64) -> Vec<SensorReading>
    where
        F: Fn(&SensorReading) -> bool,
    {
        let mut rows: Vec<_> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| keep(r))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(usize::try_from(limit).unwrap_or(0));
        rows
    }
}

#[async_trait]
impl ReadingStore for InMemoryReadingStore {
    async fn insert(&self, reading: NewReading) -> anyhow::Result<SensorReading> {
        Ok(self.insert_at(reading, OffsetDateTime::now_utc()))
    }

    async fn find_latest(&self) -> anyhow::Result<Option<SensorReading>> {
        Ok(self.newest_first(|_| true, 1).into_iter().next())
    }

    async fn find_history(
        &self,
        since: OffsetDateTime,
        limit: i64,
    ) -> anyhow::Result<Vec<SensorReading>> {
        Ok(self.newest_first(|r| r.created_at >= since, limit))
    }

    async fn find_by_sensor(
        &self,
        sensor_id: &str,
        limit: i64,
    ) -> anyhow::Result<Vec<SensorReading>> {
        Ok(self.newest_first(|r| r.sensor_id == sensor_id, limit))
    }

    async fn aggregate_stats(&self, since: OffsetDateTime) -> anyhow::Result<SensorStats> {
        let rows = self.newest_first(|r| r.created_at >= since, i64::MAX);
        if rows.is_empty() {
            return Ok(SensorStats::default());
        }
        let n = rows.len() as f64;
        let sum = |f: fn(&SensorReading) -> f64| rows.iter().map(f).sum::<f64>();
        Ok(SensorStats {
            avg_temperature: Some(sum(|r| r.temperature) / n),
            avg_humidity: Some(sum(|r| r.humidity) / n),
            avg_air_quality: Some(sum(|r| f64::from(r.air_quality)) / n),
            max_air_quality: rows.iter().map(|r| r.air_quality).max(),
            max_temperature: rows.iter().map(|r| r.temperature).reduce(f64::max),
            min_temperature: rows.iter().map(|r| r.temperature).reduce(f64::min),
            count: rows.len() as i64,
        })
    }

    async fn delete_older_than(&self, cutoff: OffsetDateTime) -> anyhow::Result<u64> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|r| r.created_at >= cutoff);
        Ok((before - rows.len()) as u64)
    }
}
