use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{CreatePaymentIntentRequest, CreatePaymentIntentResponse, WebhookAck},
    repo_types::CoinPurchase,
    services,
};
use crate::{
    auth::AuthUser,
    error::{ApiJson, AppError},
    state::AppState,
};

pub const COINBASE_SIGNATURE_HEADER: &str = "x-cc-webhook-signature";
pub const STRIPE_SIGNATURE_HEADER: &str = "stripe-signature";

pub fn purchase_routes() -> Router<AppState> {
    Router::new()
        .route("/create-payment-intent", post(create_payment_intent))
        .route("/coin-purchases", get(list_purchases))
}

pub fn webhook_routes() -> Router<AppState> {
    Router::new()
        .route("/coinbase-webhook", post(coinbase_webhook))
        .route("/stripe-webhook", post(stripe_webhook))
}

#[instrument(skip_all)]
pub async fn create_payment_intent(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(payload): ApiJson<CreatePaymentIntentRequest>,
) -> Result<Json<CreatePaymentIntentResponse>, AppError> {
    Ok(Json(services::create_payment_intent(&state, &user, payload).await?))
}

#[instrument(skip_all)]
pub async fn list_purchases(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<CoinPurchase>>, AppError> {
    Ok(Json(services::list_purchases(&state, user.id).await?))
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

// Raw bytes: signatures cover the exact body.
#[instrument(skip_all)]
pub async fn coinbase_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, AppError> {
    services::handle_coinbase_event(&state, &body, header(&headers, COINBASE_SIGNATURE_HEADER)).await?;
    Ok(Json(WebhookAck { success: true }))
}

#[instrument(skip_all)]
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, AppError> {
    services::handle_stripe_event(&state, &body, header(&headers, STRIPE_SIGNATURE_HEADER)).await?;
    Ok(Json(WebhookAck { success: true }))
}
