use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::users::repo::InsertUserError;

#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or invalid bearer token / API key.
    #[error("{0}")]
    Unauthorized(String),

    /// Malformed input or a business-rule violation.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    /// Store or hashing failure; the detail is passed through to the caller.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl AppError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            AppError::Internal(e) => {
                tracing::error!(error = %format!("{e:#}"), "internal error");
                ErrorBody {
                    success: false,
                    message: "Internal server error".into(),
                    error: Some(format!("{e:#}")),
                }
            }
            AppError::Unauthorized(msg) => {
                tracing::warn!(%msg, "unauthorized");
                ErrorBody {
                    success: false,
                    message: msg.clone(),
                    error: None,
                }
            }
            AppError::Validation(msg) | AppError::NotFound(msg) => {
                tracing::debug!(%msg, %status, "client error");
                ErrorBody {
                    success: false,
                    message: msg.clone(),
                    error: None,
                }
            }
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<InsertUserError> for AppError {
    fn from(err: InsertUserError) -> Self {
        match err {
            InsertUserError::DuplicateUsername | InsertUserError::DuplicateEmail => {
                AppError::Validation(err.to_string())
            }
            InsertUserError::Other(e) => AppError::Internal(e),
        }
    }
}
