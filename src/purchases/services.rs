use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::{CoinbaseWebhook, CreatePaymentIntentRequest, CreatePaymentIntentResponse, StripeEvent},
    provider::IntentRequest,
    repo_types::{CoinPurchase, NewCoinPurchase, PaymentMethod, PurchaseStatus},
    webhook,
};
use crate::{
    auth::repo_types::User,
    error::AppError,
    packages::{parse_amount, to_minor_units, Currency},
    state::AppState,
};

fn validation<E: std::fmt::Display>(e: E) -> AppError {
    AppError::Validation(e.to_string())
}

fn provider_failure<E: std::fmt::Display>(e: E) -> AppError {
    AppError::PaymentProvider(format!("Error creating payment intent: {e}"))
}

/// Returns the user's provider customer id, creating and storing one if needed.
/// When a concurrent request attached a customer first, that one is used.
async fn ensure_customer(state: &AppState, user: &User) -> Result<String, AppError> {
    if let Some(id) = &user.stripe_customer_id {
        return Ok(id.clone());
    }
    let created = state
        .payments
        .create_customer(&user.email, &user.id.to_string())
        .await
        .map_err(provider_failure)?;
    let stored = state
        .store
        .update_user_stripe_info(user.id, &created, None)
        .await?
        .stripe_customer_id
        .unwrap_or_else(|| created.clone());
    if stored != created {
        warn!(user_id = %user.id, orphaned = %created, kept = %stored, "customer already attached");
    }
    Ok(stored)
}

pub async fn create_payment_intent(
    state: &AppState,
    user: &User,
    req: CreatePaymentIntentRequest,
) -> Result<CreatePaymentIntentResponse, AppError> {
    let coins: u32 = req
        .coins
        .as_text()
        .parse()
        .map_err(|_| AppError::Validation("coins must be a positive integer".into()))?;
    let currency: Currency = req.currency.as_deref().unwrap_or("AED").parse().map_err(validation)?;
    let amount = parse_amount(&req.amount.as_text()).map_err(validation)?;

    if state.catalog.find_offer(coins, currency, amount).is_none() {
        warn!(user_id = %user.id, coins, %amount, currency = currency.as_str(), "no matching coin package");
        return Err(AppError::Validation(
            "Selected package does not match the catalog".into(),
        ));
    }
    let minor = to_minor_units(amount).map_err(validation)?;

    let customer = ensure_customer(state, user).await?;
    let intent = state
        .payments
        .create_payment_intent(IntentRequest {
            amount: minor,
            currency: currency.as_str().to_lowercase(),
            customer: Some(customer),
            metadata: vec![
                ("userId".into(), user.id.to_string()),
                ("coins".into(), coins.to_string()),
            ],
        })
        .await
        .map_err(provider_failure)?;

    let purchase = state
        .store
        .create_coin_purchase(NewCoinPurchase {
            user_id: user.id,
            coins: coins as i32,
            amount: amount.to_string(),
            currency,
            payment_method: PaymentMethod::Stripe,
            payment_intent_id: Some(intent.id.clone()),
            status: PurchaseStatus::Pending,
        })
        .await?;
    info!(purchase_id = %purchase.id, payment_intent_id = %intent.id, "pending purchase recorded");

    Ok(CreatePaymentIntentResponse {
        client_secret: intent.client_secret,
        payment_intent_id: intent.id,
    })
}

pub async fn list_purchases(state: &AppState, user_id: Uuid) -> Result<Vec<CoinPurchase>, AppError> {
    Ok(state.store.list_coin_purchases(user_id).await?)
}

fn metadata_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.trim().to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Verified ingress for Coinbase Commerce. Returns the new row, or `None` when
/// the event is ignored or was already recorded.
pub async fn handle_coinbase_event(
    state: &AppState,
    body: &[u8],
    signature: Option<&str>,
) -> Result<Option<CoinPurchase>, AppError> {
    let secret = state
        .config
        .coinbase
        .webhook_secret
        .as_deref()
        .ok_or_else(|| AppError::Unauthorized("Webhook secret not configured".into()))?;
    let verified = signature.is_some_and(|sig| webhook::verify_coinbase(body, sig, secret));
    if !verified {
        warn!("coinbase webhook signature rejected");
        return Err(AppError::Unauthorized("Invalid webhook signature".into()));
    }

    let payload: CoinbaseWebhook = serde_json::from_slice(body).map_err(validation)?;
    if payload.event.kind != "charge:confirmed" {
        info!(event = %payload.event.kind, "coinbase event ignored");
        return Ok(None);
    }
    let Some(charge) = payload.event.data else {
        return Ok(None);
    };
    let (Some(user_id), Some(coins)) = (
        charge.metadata.get("userId").and_then(metadata_text),
        charge.metadata.get("coins").and_then(metadata_text),
    ) else {
        info!(charge_id = %charge.id, "confirmed charge without purchase metadata");
        return Ok(None);
    };

    let user_id: Uuid = user_id.parse().map_err(|_| AppError::Validation("Invalid userId".into()))?;
    let coins: i32 = coins
        .parse()
        .ok()
        .filter(|c| *c > 0)
        .ok_or_else(|| AppError::Validation("Invalid coins".into()))?;
    let pricing = charge
        .pricing
        .ok_or_else(|| AppError::Validation("Missing pricing".into()))?;
    let currency: Currency = pricing.local.currency.parse().map_err(validation)?;
    let amount = parse_amount(&pricing.local.amount).map_err(validation)?;

    // Redelivery cannot fix a missing user, so acknowledge instead of failing.
    if state.store.get_user(user_id).await?.is_none() {
        warn!(%user_id, charge_id = %charge.id, "confirmed charge for unknown user");
        return Ok(None);
    }

    let inserted = state
        .store
        .insert_coin_purchase_if_absent(NewCoinPurchase {
            user_id,
            coins,
            amount: amount.to_string(),
            currency,
            payment_method: PaymentMethod::Coinbase,
            payment_intent_id: Some(charge.id.clone()),
            status: PurchaseStatus::Completed,
        })
        .await?;
    match &inserted {
        Some(p) => info!(purchase_id = %p.id, charge_id = %charge.id, "coinbase purchase completed"),
        None => info!(charge_id = %charge.id, "coinbase charge already recorded"),
    }
    Ok(inserted)
}

/// Verified ingress for Stripe. Settles the pending card purchase for the intent.
pub async fn handle_stripe_event(
    state: &AppState,
    body: &[u8],
    signature: Option<&str>,
) -> Result<Option<CoinPurchase>, AppError> {
    let secret = state
        .config
        .stripe
        .webhook_secret
        .as_deref()
        .ok_or_else(|| AppError::Unauthorized("Webhook secret not configured".into()))?;
    let now = OffsetDateTime::now_utc().unix_timestamp();
    let verified = signature.is_some_and(|sig| webhook::verify_stripe(body, sig, secret, now));
    if !verified {
        warn!("stripe webhook signature rejected");
        return Err(AppError::Unauthorized("Invalid webhook signature".into()));
    }

    let event: StripeEvent = serde_json::from_slice(body).map_err(validation)?;
    let status = match event.kind.as_str() {
        "payment_intent.succeeded" => PurchaseStatus::Completed,
        "payment_intent.payment_failed" => PurchaseStatus::Failed,
        other => {
            info!(event = %other, "stripe event ignored");
            return Ok(None);
        }
    };

    let Some(intent_id) = event.object_id().map(str::to_string) else {
        warn!(event = %event.kind, "stripe intent event without object id");
        return Ok(None);
    };
    let settled = state
        .store
        .settle_coin_purchase(PaymentMethod::Stripe, &intent_id, status)
        .await?;
    match &settled {
        Some(p) => info!(purchase_id = %p.id, payment_intent_id = %intent_id, status = status.as_str(), "card purchase settled"),
        None => info!(payment_intent_id = %intent_id, "no pending purchase for intent"),
    }
    Ok(settled)
}
