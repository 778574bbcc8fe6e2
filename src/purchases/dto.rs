use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Browsers send checkout params straight from the query string, so numbers
/// may arrive quoted.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NumberOrText {
    Int(i64),
    Float(f64),
    Text(String),
}

impl NumberOrText {
    pub fn as_text(&self) -> String {
        match self {
            NumberOrText::Int(v) => v.to_string(),
            NumberOrText::Float(v) => v.to_string(),
            NumberOrText::Text(v) => v.trim().to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreatePaymentIntentRequest {
    pub coins: NumberOrText,
    pub amount: NumberOrText,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentIntentResponse {
    pub client_secret: Option<String>,
    pub payment_intent_id: String,
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub success: bool,
}

// --- coinbase commerce ---

#[derive(Debug, Deserialize)]
pub struct CoinbaseWebhook {
    pub event: CoinbaseEvent,
}

#[derive(Debug, Deserialize)]
pub struct CoinbaseEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Option<CoinbaseCharge>,
}

#[derive(Debug, Deserialize)]
pub struct CoinbaseCharge {
    pub id: String,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    pub pricing: Option<CoinbasePricing>,
}

#[derive(Debug, Deserialize)]
pub struct CoinbasePricing {
    pub local: CoinbaseMoney,
}

#[derive(Debug, Deserialize)]
pub struct CoinbaseMoney {
    pub amount: String,
    pub currency: String,
}

// --- stripe ---

/// Only the envelope is typed; `data.object` varies by event type and may
/// carry no `id` at all (e.g. `balance.available`).
#[derive(Debug, Deserialize)]
pub struct StripeEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Option<StripeEventData>,
}

#[derive(Debug, Deserialize)]
pub struct StripeEventData {
    #[serde(default)]
    pub object: Option<StripeObject>,
}

#[derive(Debug, Deserialize)]
pub struct StripeObject {
    #[serde(default)]
    pub id: Option<String>,
}

impl StripeEvent {
    pub fn object_id(&self) -> Option<&str> {
        self.data.as_ref()?.object.as_ref()?.id.as_deref()
    }
}
