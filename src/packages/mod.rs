mod catalog;
pub mod handlers;

pub use catalog::{parse_amount, to_minor_units, Catalog, CoinPackage, Currency};

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::package_routes()
}
