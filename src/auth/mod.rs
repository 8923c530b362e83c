use crate::state::AppState;
use axum::Router;

pub mod api_key;
mod claims;
mod dto;
pub mod extractors;
pub mod handlers;
pub mod jwt;

pub use extractors::AuthUser;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::auth_routes())
}
