use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::auth::repo_types::{NewUser, User};
use crate::contact::repo_types::{ContactSubmission, NewContactSubmission};
use crate::purchases::repo_types::{CoinPurchase, NewCoinPurchase, PaymentMethod, PurchaseStatus};

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("unique constraint violated: {0}")]
    Conflict(String),

    #[error("row not found")]
    NotFound,

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for DbError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => DbError::NotFound,
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                DbError::Conflict(db.constraint().unwrap_or("unique").to_string())
            }
            other => DbError::Sqlx(other),
        }
    }
}

pub type DbResult<T> = Result<T, DbError>;

/// Persistence seam shared by every handler.
#[async_trait]
pub trait Store: Send + Sync {
    async fn get_user(&self, id: Uuid) -> DbResult<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> DbResult<Option<User>>;
    /// Fails with [`DbError::Conflict`] when the email is taken.
    async fn create_user(&self, user: NewUser) -> DbResult<User>;
    /// First writer wins for the customer id; the returned row holds whichever
    /// id is stored. A `None` subscription leaves the stored one in place.
    async fn update_user_stripe_info(
        &self,
        user_id: Uuid,
        stripe_customer_id: &str,
        stripe_subscription_id: Option<&str>,
    ) -> DbResult<User>;

    async fn create_coin_purchase(&self, purchase: NewCoinPurchase) -> DbResult<CoinPurchase>;
    /// Inserts unless a row with the same method and provider reference exists.
    /// Returns `None` when the row was already there.
    async fn insert_coin_purchase_if_absent(
        &self,
        purchase: NewCoinPurchase,
    ) -> DbResult<Option<CoinPurchase>>;
    async fn list_coin_purchases(&self, user_id: Uuid) -> DbResult<Vec<CoinPurchase>>;
    /// Moves a `pending` purchase to `status`. Rows in any other state are left alone.
    async fn settle_coin_purchase(
        &self,
        method: PaymentMethod,
        payment_intent_id: &str,
        status: PurchaseStatus,
    ) -> DbResult<Option<CoinPurchase>>;

    async fn create_contact_submission(
        &self,
        contact: NewContactSubmission,
    ) -> DbResult<ContactSubmission>;
}
