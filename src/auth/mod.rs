use crate::state::AppState;
use axum::Router;

mod claims;
mod dto;
pub(crate) mod extractors;
pub mod handlers;
pub mod jwt;
mod password;
pub mod repo;
pub mod repo_types;
mod services;

pub use extractors::AuthUser;
pub(crate) use services::is_valid_email;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
