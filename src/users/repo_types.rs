use std::fmt;

use serde_json::{Map, Value};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String, // Argon2 PHC string, never exposed
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub settings: Option<String>, // serialized JSON object
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("phone", &self.phone)
            .field("bio", &self.bio)
            .field("settings", &self.settings)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

impl User {
    /// Materializes the stored settings text; unset means an empty document.
    pub fn settings_map(&self) -> anyhow::Result<Map<String, Value>> {
        match self.settings.as_deref() {
            None | Some("") => Ok(Map::new()),
            Some(raw) => match serde_json::from_str::<Value>(raw)? {
                Value::Object(map) => Ok(map),
                Value::Null => Ok(Map::new()),
                other => anyhow::bail!("stored settings is not an object: {other}"),
            },
        }
    }
}

/// Row to insert; the password is already hashed.
#[derive(Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .finish_non_exhaustive()
    }
}

/// Profile fields written by `POST /profile`. `None` keeps the stored value.
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub bio: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with_hash(hash: &str) -> User {
        let now = OffsetDateTime::now_utc();
        User {
            id: Uuid::new_v4(),
            username: "wes".into(),
            email: "wes@example.com".into(),
            password_hash: hash.into(),
            first_name: None,
            last_name: None,
            phone: None,
            bio: None,
            settings: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn debug_output_redacts_password_hash() {
        let hash = "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA";
        let printed = format!("{:?}", user_with_hash(hash));
        assert!(printed.contains("wes@example.com"));
        assert!(!printed.contains(hash));

        let new_user = NewUser {
            username: "wes".into(),
            email: "wes@example.com".into(),
            password_hash: hash.into(),
            first_name: None,
            last_name: None,
        };
        assert!(!format!("{new_user:?}").contains(hash));
    }

    #[test]
    fn settings_default_to_empty_document() {
        let mut user = user_with_hash("h");
        assert!(user.settings_map().unwrap().is_empty());
        user.settings = Some("null".into());
        assert!(user.settings_map().unwrap().is_empty());
        user.settings = Some("[1]".into());
        assert!(user.settings_map().is_err());
    }
}
