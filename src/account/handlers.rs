use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    routing::{delete, get, post},
    Json, Router,
};
use bytes::Bytes;
use serde_json::{Map, Value};
use time::{Duration, OffsetDateTime};
use tracing::{info, instrument, warn};

use crate::{
    account::dto::{
        ChangePasswordRequest, ClearOldDataRequest, ClearOldDataResponse, ExportBundle,
        ExportQuery, ExportResponse, MessageResponse, Profile, ProfileResponse, PublicUser,
        SettingsResponse, UpdateProfileRequest, UpdateProfileResponse,
    },
    auth::AuthUser,
    error::AppError,
    state::AppState,
    users::{
        repo_types::ProfileUpdate,
        services::{
            non_blank, password_long_enough, set_password, verify_user_password, MIN_PASSWORD_LEN,
        },
    },
};

/// Readings bundled by `/export-data`. Not tied to the caller; see DESIGN.md.
pub const EXPORT_SENSOR_ID: &str = "sensor_001";

const DEFAULT_RETENTION_DAYS: f64 = 90.0;

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile).post(update_profile))
        .route("/change-password", post(change_password))
        .route("/settings", get(get_settings).post(save_settings))
}

pub fn data_routes() -> Router<AppState> {
    Router::new()
        .route("/clear-old-data", delete(clear_old_data))
        .route("/export-data", get(export_data))
}

#[instrument(skip_all)]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<ProfileResponse>, AppError> {
    let user = state
        .users
        .find_by_id(user.id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    Ok(Json(ProfileResponse {
        success: true,
        profile: Profile::from(user),
    }))
}

#[instrument(skip_all)]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<Json<UpdateProfileResponse>, AppError> {
    let Json(payload) = payload?;

    let (Some(first_name), Some(last_name)) =
        (non_blank(payload.first_name), non_blank(payload.last_name))
    else {
        return Err(AppError::validation("First name and last name are required"));
    };

    let update = ProfileUpdate {
        first_name,
        last_name,
        phone: non_blank(payload.phone),
        bio: non_blank(payload.bio),
    };

    let updated = state
        .users
        .update_profile(user.id, update)
        .await?
        .ok_or_else(|| AppError::not_found("User not found or no changes made"))?;

    info!(user_id = %updated.id, "profile updated");
    Ok(Json(UpdateProfileResponse {
        success: true,
        message: "Profile updated successfully".into(),
        profile: PublicUser::try_from(updated)?,
    }))
}

#[instrument(skip_all)]
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Json(payload) = payload?;

    let (Some(current), Some(new)) = (
        payload.current_password.filter(|p| !p.is_empty()),
        payload.new_password.filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::validation(
            "Current password and new password are required",
        ));
    };

    if !password_long_enough(&new) {
        return Err(AppError::validation(format!(
            "New password must be at least {MIN_PASSWORD_LEN} characters long"
        )));
    }

    let user = state
        .users
        .find_by_id(user.id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    if !verify_user_password(&user, &current).await? {
        warn!(user_id = %user.id, "password change with wrong current password");
        return Err(AppError::validation("Current password is incorrect"));
    }

    // Verify and update are separate round trips; concurrent changes race.
    if !set_password(state.users.as_ref(), user.id, &new).await? {
        return Err(AppError::not_found("User not found"));
    }

    info!(user_id = %user.id, "password changed");
    Ok(Json(MessageResponse {
        success: true,
        message: "Password updated successfully".into(),
    }))
}

/// Replaces the whole settings document; nothing is merged.
#[instrument(skip_all)]
pub async fn save_settings(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    payload: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<Json<SettingsResponse>, AppError> {
    let Json(settings) = payload?;

    if !state.users.update_settings(user.id, &settings).await? {
        return Err(AppError::not_found("User not found"));
    }

    info!(user_id = %user.id, keys = settings.len(), "settings saved");
    Ok(Json(SettingsResponse {
        success: true,
        message: Some("Settings saved successfully".into()),
        settings,
    }))
}

#[instrument(skip_all)]
pub async fn get_settings(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<SettingsResponse>, AppError> {
    let user = state
        .users
        .find_by_id(user.id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    Ok(Json(SettingsResponse {
        success: true,
        message: None,
        settings: user.settings_map()?,
    }))
}

/// Retention pruning. The body is optional; `days` defaults to 90.
#[instrument(skip_all)]
pub async fn clear_old_data(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    body: Bytes,
) -> Result<Json<ClearOldDataResponse>, AppError> {
    let req: ClearOldDataRequest = if body.iter().all(u8::is_ascii_whitespace) {
        ClearOldDataRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::validation(format!("Invalid request body: {e}")))?
    };
    let days = req.days.unwrap_or(DEFAULT_RETENTION_DAYS);
    let cutoff = retention_cutoff(OffsetDateTime::now_utc(), days)?;

    let deleted = state.readings.delete_older_than(cutoff).await?;

    info!(user_id = %user.id, days, deleted, "old readings cleared");
    Ok(Json(ClearOldDataResponse {
        success: true,
        message: format!("Successfully cleared {deleted} records older than {days} days"),
        deleted,
    }))
}

#[instrument(skip_all)]
pub async fn export_data(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    query: Result<Query<ExportQuery>, QueryRejection>,
) -> Result<Json<ExportResponse>, AppError> {
    let Query(q) = query?;

    let sensor_data = state
        .readings
        .find_by_sensor(EXPORT_SENSOR_ID, i64::from(q.limit))
        .await?;

    let user = state
        .users
        .find_by_id(user.id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    let total_records = sensor_data.len();
    info!(user_id = %user.id, total_records, "data exported");
    Ok(Json(ExportResponse {
        success: true,
        data: ExportBundle {
            user: PublicUser::try_from(user)?,
            sensor_data,
            exported_at: OffsetDateTime::now_utc(),
            total_records,
        },
    }))
}

/// `now - days`; fractional days are honored. Negative ages are refused.
fn retention_cutoff(now: OffsetDateTime, days: f64) -> Result<OffsetDateTime, AppError> {
    if !days.is_finite() || days < 0.0 {
        return Err(AppError::validation("days must be a non-negative number"));
    }
    now.checked_sub(Duration::saturating_seconds_f64(days * 86_400.0))
        .ok_or_else(|| AppError::validation("days is out of range"))
}
