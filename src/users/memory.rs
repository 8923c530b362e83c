use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Map, Value};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::{
    repo::{InsertUserError, UserStore},
    repo_types::{NewUser, ProfileUpdate, User},
};

/// `UserStore` backed by a vector, with the same uniqueness rules as the table.
#[derive(Default)]
pub struct InMemoryUserStore {
    rows: Mutex<Vec<User>>,
}

impl InMemoryUserStore {
    /// Drops a user behind the handlers' back.
    pub fn remove(&self, id: Uuid) {
        self.rows.lock().unwrap().retain(|u| u.id != id);
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, new_user: NewUser) -> Result<User, InsertUserError> {
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|u| u.username == new_user.username) {
            return Err(InsertUserError::DuplicateUsername);
        }
        if rows.iter().any(|u| u.email == new_user.email) {
            return Err(InsertUserError::DuplicateEmail);
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            phone: None,
            bio: None,
            settings: None,
            created_at: now,
            updated_at: now,
        };
        rows.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.rows.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        Ok(self.rows.lock().unwrap().iter().find(|u| u.email == email).cloned())
    }

    async fn update_profile(
        &self,
        id: Uuid,
        update: ProfileUpdate,
    ) -> anyhow::Result<Option<User>> {
        let mut rows = self.rows.lock().unwrap();
        let Some(user) = rows.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        user.first_name = Some(update.first_name);
        user.last_name = Some(update.last_name);
        if update.phone.is_some() {
            user.phone = update.phone;
        }
        if update.bio.is_some() {
            user.bio = update.bio;
        }
        user.updated_at = OffsetDateTime::now_utc();
        Ok(Some(user.clone()))
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> anyhow::Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                user.updated_at = OffsetDateTime::now_utc();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_settings(
        &self,
        id: Uuid,
        settings: &Map<String, Value>,
    ) -> anyhow::Result<bool> {
        let raw = serde_json::to_string(settings)?;
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.settings = Some(raw);
                user.updated_at = OffsetDateTime::now_utc();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
