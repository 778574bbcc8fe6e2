use axum::{extract::State, routing::get, Json, Router};

use super::CoinPackage;
use crate::state::AppState;

pub fn package_routes() -> Router<AppState> {
    Router::new().route("/coin-packages", get(list_packages))
}

pub async fn list_packages(State(state): State<AppState>) -> Json<Vec<CoinPackage>> {
    Json(state.catalog.packages().to_vec())
}
