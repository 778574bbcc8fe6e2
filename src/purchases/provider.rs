use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info, instrument};

use crate::config::StripeConfig;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("payment provider is not configured")]
    NotConfigured,

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The provider answered with an error body.
    #[error("{0}")]
    Rejected(String),
}

/// What the card provider needs to open an intent.
#[derive(Debug, Clone, PartialEq)]
pub struct IntentRequest {
    /// Minor units, e.g. 2241 for 22.41.
    pub amount: i64,
    /// Lowercase ISO code.
    pub currency: String,
    pub customer: Option<String>,
    pub metadata: Vec<(String, String)>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: Option<String>,
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn create_customer(&self, email: &str, user_id: &str) -> Result<String, ProviderError>;
    async fn create_payment_intent(&self, req: IntentRequest) -> Result<PaymentIntent, ProviderError>;
}

/// Stripe REST client (form-encoded v1 API).
pub struct StripeClient {
    http: reqwest::Client,
    api_base: String,
    secret_key: Option<String>,
}

#[derive(Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

#[derive(Deserialize)]
struct StripeCustomer {
    id: String,
}

impl StripeClient {
    pub fn new(cfg: &StripeConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("pkmatchz/0.1")
            .build()
            .unwrap_or_default();
        Self {
            http,
            api_base: cfg.api_base.trim_end_matches('/').to_string(),
            secret_key: cfg.secret_key.clone(),
        }
    }

    async fn post_form<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        form: &[(String, String)],
    ) -> Result<T, ProviderError> {
        let key = self.secret_key.as_deref().ok_or(ProviderError::NotConfigured)?;
        let res = self
            .http
            .post(format!("{}{}", self.api_base, path))
            .bearer_auth(key)
            .form(form)
            .send()
            .await?;

        let status = res.status();
        if status.is_success() {
            return Ok(res.json::<T>().await?);
        }

        let text = res.text().await.unwrap_or_default();
        let message = serde_json::from_str::<StripeErrorBody>(&text)
            .ok()
            .and_then(|b| b.error.message)
            .unwrap_or_else(|| format!("stripe returned {status}"));
        error!(%status, path, message = %message, "stripe request failed");
        Err(ProviderError::Rejected(message))
    }
}

pub(crate) fn intent_form(req: &IntentRequest) -> Vec<(String, String)> {
    let mut form = vec![
        ("amount".to_string(), req.amount.to_string()),
        ("currency".to_string(), req.currency.clone()),
        ("automatic_payment_methods[enabled]".to_string(), "true".to_string()),
    ];
    if let Some(customer) = &req.customer {
        form.push(("customer".to_string(), customer.clone()));
    }
    for (k, v) in &req.metadata {
        form.push((format!("metadata[{k}]"), v.clone()));
    }
    form
}

#[async_trait]
impl PaymentProvider for StripeClient {
    #[instrument(skip(self, email))]
    async fn create_customer(&self, email: &str, user_id: &str) -> Result<String, ProviderError> {
        let form = vec![
            ("email".to_string(), email.to_string()),
            ("metadata[userId]".to_string(), user_id.to_string()),
        ];
        let customer: StripeCustomer = self.post_form("/customers", &form).await?;
        info!(customer_id = %customer.id, "stripe customer created");
        Ok(customer.id)
    }

    #[instrument(skip(self), fields(amount = req.amount, currency = %req.currency))]
    async fn create_payment_intent(&self, req: IntentRequest) -> Result<PaymentIntent, ProviderError> {
        let intent: PaymentIntent = self.post_form("/payment_intents", &intent_form(&req)).await?;
        info!(payment_intent_id = %intent.id, "stripe payment intent created");
        Ok(intent)
    }
}
