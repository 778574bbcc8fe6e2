mod dto;
pub mod handlers;
pub mod provider;
pub mod repo;
pub mod repo_types;
mod services;
pub mod webhook;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::purchase_routes())
        .merge(handlers::webhook_routes())
}
