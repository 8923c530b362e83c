use anyhow::Context;
use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::users::repo_types::{NewUser, ProfileUpdate, User};

const USER_COLUMNS: &str = "id, username, email, password_hash, first_name, last_name, \
                            phone, bio, settings, created_at, updated_at";

#[derive(Debug, Error)]
pub enum InsertUserError {
    #[error("Username already taken")]
    DuplicateUsername,
    #[error("Email already registered")]
    DuplicateEmail,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Persistence for user records. Lookups report absence as `None`.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, new_user: NewUser) -> Result<User, InsertUserError>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    /// Returns the refreshed record, or `None` if no row matched.
    async fn update_profile(&self, id: Uuid, update: ProfileUpdate)
        -> anyhow::Result<Option<User>>;
    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> anyhow::Result<bool>;
    /// Replaces the whole settings document.
    async fn update_settings(&self, id: Uuid, settings: &Map<String, Value>)
        -> anyhow::Result<bool>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn find_one(&self, column: &str, value: &str) -> anyhow::Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(value)
            .fetch_optional(&self.db)
            .await
            .with_context(|| format!("find user by {column}"))?;
        Ok(user)
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, new_user: NewUser) -> Result<User, InsertUserError> {
        let sql = format!(
            r#"
            INSERT INTO users (username, email, password_hash, first_name, last_name)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        );
        let res = sqlx::query_as::<_, User>(&sql)
            .bind(&new_user.username)
            .bind(&new_user.email)
            .bind(&new_user.password_hash)
            .bind(&new_user.first_name)
            .bind(&new_user.last_name)
            .fetch_one(&self.db)
            .await;

        match res {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                match db_err.constraint() {
                    Some(c) if c.contains("username") => Err(InsertUserError::DuplicateUsername),
                    _ => Err(InsertUserError::DuplicateEmail),
                }
            }
            Err(e) => Err(InsertUserError::Other(anyhow::Error::new(e).context("insert user"))),
        }
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .context("find user by id")?;
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        self.find_one("username", username).await
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        self.find_one("email", email).await
    }

    async fn update_profile(
        &self,
        id: Uuid,
        update: ProfileUpdate,
    ) -> anyhow::Result<Option<User>> {
        let sql = format!(
            r#"
            UPDATE users
               SET first_name = $2,
                   last_name  = $3,
                   phone      = COALESCE($4, phone),
                   bio        = COALESCE($5, bio),
                   updated_at = now()
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(&update.first_name)
            .bind(&update.last_name)
            .bind(&update.phone)
            .bind(&update.bio)
            .fetch_optional(&self.db)
            .await
            .context("update profile")?;
        Ok(user)
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1"#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.db)
        .await
        .context("update password hash")?;
        Ok(res.rows_affected() > 0)
    }

    async fn update_settings(
        &self,
        id: Uuid,
        settings: &Map<String, Value>,
    ) -> anyhow::Result<bool> {
        let raw = serde_json::to_string(settings).context("serialize settings")?;
        let res = sqlx::query(
            r#"UPDATE users SET settings = $2, updated_at = now() WHERE id = $1"#,
        )
        .bind(id)
        .bind(raw)
        .execute(&self.db)
        .await
        .context("update settings")?;
        Ok(res.rows_affected() > 0)
    }
}
