use axum::{extract::State, routing::post, Json, Router};
use tracing::instrument;

use super::{
    dto::{ContactRequest, ContactResponse},
    services,
};
use crate::{
    error::{ApiJson, AppError},
    state::AppState,
};

pub fn contact_routes() -> Router<AppState> {
    Router::new().route("/contact", post(submit_contact))
}

#[instrument(skip(state, payload))]
pub async fn submit_contact(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ContactRequest>,
) -> Result<Json<ContactResponse>, AppError> {
    let submission = services::submit(&state, payload).await?;
    Ok(Json(ContactResponse {
        message: "Contact form submitted successfully",
        id: submission.id,
    }))
}
