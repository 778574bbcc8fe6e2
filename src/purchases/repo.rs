use sqlx::PgPool;
use uuid::Uuid;

use crate::purchases::repo_types::{CoinPurchase, NewCoinPurchase, PaymentMethod, PurchaseStatus};

const PURCHASE_COLUMNS: &str =
    "id, user_id, coins, amount, currency, payment_method, payment_intent_id, status, created_at";

pub async fn insert(db: &PgPool, p: &NewCoinPurchase) -> Result<CoinPurchase, sqlx::Error> {
    sqlx::query_as::<_, CoinPurchase>(&format!(
        r#"
        INSERT INTO coin_purchases
            (user_id, coins, amount, currency, payment_method, payment_intent_id, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {PURCHASE_COLUMNS}
        "#
    ))
    .bind(p.user_id)
    .bind(p.coins)
    .bind(&p.amount)
    .bind(p.currency.as_str())
    .bind(p.payment_method.as_str())
    .bind(&p.payment_intent_id)
    .bind(p.status.as_str())
    .fetch_one(db)
    .await
}

/// Relies on the unique (payment_method, payment_intent_id) index.
pub async fn insert_if_absent(
    db: &PgPool,
    p: &NewCoinPurchase,
) -> Result<Option<CoinPurchase>, sqlx::Error> {
    sqlx::query_as::<_, CoinPurchase>(&format!(
        r#"
        INSERT INTO coin_purchases
            (user_id, coins, amount, currency, payment_method, payment_intent_id, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (payment_method, payment_intent_id) DO NOTHING
        RETURNING {PURCHASE_COLUMNS}
        "#
    ))
    .bind(p.user_id)
    .bind(p.coins)
    .bind(&p.amount)
    .bind(p.currency.as_str())
    .bind(p.payment_method.as_str())
    .bind(&p.payment_intent_id)
    .bind(p.status.as_str())
    .fetch_optional(db)
    .await
}

pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> Result<Vec<CoinPurchase>, sqlx::Error> {
    sqlx::query_as::<_, CoinPurchase>(&format!(
        r#"
        SELECT {PURCHASE_COLUMNS}
          FROM coin_purchases
         WHERE user_id = $1
         ORDER BY created_at ASC
        "#
    ))
    .bind(user_id)
    .fetch_all(db)
    .await
}

pub async fn settle_pending(
    db: &PgPool,
    method: PaymentMethod,
    payment_intent_id: &str,
    status: PurchaseStatus,
) -> Result<Option<CoinPurchase>, sqlx::Error> {
    sqlx::query_as::<_, CoinPurchase>(&format!(
        r#"
        UPDATE coin_purchases
           SET status = $3
         WHERE payment_method = $1
           AND payment_intent_id = $2
           AND status = 'pending'
        RETURNING {PURCHASE_COLUMNS}
        "#
    ))
    .bind(method.as_str())
    .bind(payment_intent_id)
    .bind(status.as_str())
    .fetch_optional(db)
    .await
}
