use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use super::{DbResult, Store};
use crate::auth::{
    repo as users,
    repo_types::{NewUser, User},
};
use crate::contact::{
    repo as contacts,
    repo_types::{ContactSubmission, NewContactSubmission},
};
use crate::purchases::{
    repo as purchases,
    repo_types::{CoinPurchase, NewCoinPurchase, PaymentMethod, PurchaseStatus},
};

/// [`Store`] backed by a Postgres pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("run migrations")?;
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn get_user(&self, id: Uuid) -> DbResult<Option<User>> {
        Ok(users::find_by_id(&self.pool, id).await?)
    }

    async fn get_user_by_email(&self, email: &str) -> DbResult<Option<User>> {
        Ok(users::find_by_email(&self.pool, email).await?)
    }

    async fn create_user(&self, user: NewUser) -> DbResult<User> {
        Ok(users::create(&self.pool, &user).await?)
    }

    async fn update_user_stripe_info(
        &self,
        user_id: Uuid,
        stripe_customer_id: &str,
        stripe_subscription_id: Option<&str>,
    ) -> DbResult<User> {
        Ok(
            users::update_stripe_info(&self.pool, user_id, stripe_customer_id, stripe_subscription_id)
                .await?,
        )
    }

    async fn create_coin_purchase(&self, purchase: NewCoinPurchase) -> DbResult<CoinPurchase> {
        Ok(purchases::insert(&self.pool, &purchase).await?)
    }

    async fn insert_coin_purchase_if_absent(
        &self,
        purchase: NewCoinPurchase,
    ) -> DbResult<Option<CoinPurchase>> {
        Ok(purchases::insert_if_absent(&self.pool, &purchase).await?)
    }

    async fn list_coin_purchases(&self, user_id: Uuid) -> DbResult<Vec<CoinPurchase>> {
        Ok(purchases::list_by_user(&self.pool, user_id).await?)
    }

    async fn settle_coin_purchase(
        &self,
        method: PaymentMethod,
        payment_intent_id: &str,
        status: PurchaseStatus,
    ) -> DbResult<Option<CoinPurchase>> {
        Ok(purchases::settle_pending(&self.pool, method, payment_intent_id, status).await?)
    }

    async fn create_contact_submission(
        &self,
        contact: NewContactSubmission,
    ) -> DbResult<ContactSubmission> {
        Ok(contacts::insert(&self.pool, &contact).await?)
    }
}
