use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::packages::Currency;

/// Coin purchase row. `amount` keeps the decimal text exactly as charged.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CoinPurchase {
    pub id: Uuid,
    pub user_id: Uuid,
    pub coins: i32,
    pub amount: String,
    pub currency: String,
    pub payment_method: String,
    pub payment_intent_id: Option<String>,
    pub status: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewCoinPurchase {
    pub user_id: Uuid,
    pub coins: i32,
    pub amount: String,
    pub currency: Currency,
    pub payment_method: PaymentMethod,
    pub payment_intent_id: Option<String>,
    pub status: PurchaseStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Stripe,
    Coinbase,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Stripe => "stripe",
            PaymentMethod::Coinbase => "coinbase",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseStatus {
    Pending,
    Completed,
    Failed,
}

impl PurchaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseStatus::Pending => "pending",
            PurchaseStatus::Completed => "completed",
            PurchaseStatus::Failed => "failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_strings_match_column_check() {
        for status in [PurchaseStatus::Pending, PurchaseStatus::Completed, PurchaseStatus::Failed] {
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json, status.as_str());
        }
        assert_eq!(PaymentMethod::Coinbase.as_str(), "coinbase");
    }
}
