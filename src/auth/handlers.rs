use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    account::dto::PublicUser,
    auth::{
        dto::{AuthResponse, LoginRequest, RegisterRequest},
        jwt::JwtKeys,
    },
    error::AppError,
    state::AppState,
    users::services::{create_user, verify_user_password, Registration},
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let Json(payload) = payload?;

    let user = create_user(
        state.users.as_ref(),
        Registration {
            username: payload.username,
            email: payload.email,
            password: payload.password,
            first_name: payload.first_name,
            last_name: payload.last_name,
        },
    )
    .await?;

    let token = JwtKeys::from_ref(&state).sign(user.id)?;
    info!(user_id = %user.id, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            success: true,
            token,
            user: PublicUser::try_from(user)?,
        }),
    ))
}

#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let Json(payload) = payload?;

    let found = match (payload.username.as_deref(), payload.email.as_deref()) {
        (Some(username), _) if !username.trim().is_empty() => {
            state.users.find_by_username(username.trim()).await?
        }
        (_, Some(email)) if !email.trim().is_empty() => {
            state
                .users
                .find_by_email(&email.trim().to_lowercase())
                .await?
        }
        _ => return Err(AppError::validation("Username or email is required")),
    };

    let Some(user) = found else {
        warn!("login for unknown account");
        return Err(AppError::unauthorized("Invalid credentials"));
    };

    if !verify_user_password(&user, &payload.password).await? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::unauthorized("Invalid credentials"));
    }

    let token = JwtKeys::from_ref(&state).sign(user.id)?;
    info!(user_id = %user.id, "user logged in");
    Ok(Json(AuthResponse {
        success: true,
        token,
        user: PublicUser::try_from(user)?,
    }))
}
