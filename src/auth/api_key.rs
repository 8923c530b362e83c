use axum::{
    body::Body,
    extract::{Query, Request, State},
    middleware::Next,
    response::Response,
};
use bytes::Bytes;
use serde::Deserialize;
use tracing::warn;

use crate::{error::AppError, state::AppState};

/// Ingestion payloads are small; anything bigger is not a reading.
const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Debug, Deserialize)]
struct ApiKeyParam {
    api_key: Option<String>,
}

/// API-key gate for device traffic.
///
/// The key is taken from the JSON body's `api_key` field or the `api_key`
/// query parameter. The body is buffered and handed on untouched.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|_| AppError::validation("Request body too large"))?;

    let presented = key_from_body(&bytes).or_else(|| {
        Query::<ApiKeyParam>::try_from_uri(&parts.uri)
            .ok()
            .and_then(|Query(p)| p.api_key)
            .filter(|k| !k.is_empty())
    });

    match presented {
        Some(key) if key == state.config.api_key => {
            let request = Request::from_parts(parts, Body::from(bytes));
            Ok(next.run(request).await)
        }
        _ => {
            warn!(path = %parts.uri.path(), "rejected ingestion: bad or missing api key");
            Err(AppError::unauthorized("Invalid API key"))
        }
    }
}

fn key_from_body(bytes: &Bytes) -> Option<String> {
    if bytes.is_empty() {
        return None;
    }
    serde_json::from_slice::<ApiKeyParam>(bytes)
        .ok()
        .and_then(|p| p.api_key)
        .filter(|k| !k.is_empty())
}
