use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::config::AppConfig;
use crate::sensors::repo::{PgReadingStore, ReadingStore};
use crate::users::repo::{PgUserStore, UserStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserStore>,
    pub readings: Arc<dyn ReadingStore>,
}

impl AppState {
    /// Connects to Postgres, applies migrations and wires the stores.
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let config = Arc::new(config);

        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .context("run migrations")?;

        let users = Arc::new(PgUserStore::new(db.clone())) as Arc<dyn UserStore>;
        let readings = Arc::new(PgReadingStore::new(db)) as Arc<dyn ReadingStore>;

        Ok(Self::from_parts(config, users, readings))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserStore>,
        readings: Arc<dyn ReadingStore>,
    ) -> Self {
        Self {
            config,
            users,
            readings,
        }
    }
}
