use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::users::{
    password::{hash_password_async, verify_password_async},
    repo::UserStore,
    repo_types::{NewUser, User},
};

pub const MIN_PASSWORD_LEN: usize = 6;

/// Length is counted in characters, not bytes.
pub fn password_long_enough(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Plaintext input for a new account.
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Validates, hashes and inserts a new user.
pub async fn create_user(store: &dyn UserStore, reg: Registration) -> Result<User, AppError> {
    let username = reg.username.trim().to_string();
    let email = reg.email.trim().to_lowercase();

    if username.is_empty() || username.len() > 50 {
        return Err(AppError::validation("Username must be 1-50 characters"));
    }
    if !is_valid_email(&email) {
        warn!(%email, "invalid email");
        return Err(AppError::validation("Invalid email"));
    }
    if !password_long_enough(&reg.password) {
        return Err(AppError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long"
        )));
    }

    let password_hash = hash_password_async(reg.password).await?;
    let user = store
        .insert(NewUser {
            username,
            email,
            password_hash,
            first_name: non_blank(reg.first_name),
            last_name: non_blank(reg.last_name),
        })
        .await?;

    info!(user_id = %user.id, username = %user.username, "user created");
    Ok(user)
}

/// True iff `candidate` matches the user's current password.
pub async fn verify_user_password(user: &User, candidate: &str) -> anyhow::Result<bool> {
    verify_password_async(candidate.to_string(), user.password_hash.clone()).await
}

/// Hashes and stores a new password. `false` if the user no longer exists.
pub async fn set_password(
    store: &dyn UserStore,
    user_id: Uuid,
    new_password: &str,
) -> anyhow::Result<bool> {
    let hash = hash_password_async(new_password.to_string()).await?;
    store.update_password_hash(user_id, &hash).await
}

/// Trims, mapping blank strings to `None`.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
