//! In-memory [`Store`] for handler tests.

use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{DbError, DbResult, Store};
use crate::auth::repo_types::{NewUser, User};
use crate::contact::repo_types::{ContactSubmission, NewContactSubmission};
use crate::purchases::repo_types::{CoinPurchase, NewCoinPurchase, PaymentMethod, PurchaseStatus};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    purchases: Vec<CoinPurchase>,
    contacts: Vec<ContactSubmission>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn purchases(&self) -> Vec<CoinPurchase> {
        self.tables.lock().unwrap().purchases.clone()
    }

    pub fn contact(&self, id: Uuid) -> Option<ContactSubmission> {
        self.tables.lock().unwrap().contacts.iter().find(|c| c.id == id).cloned()
    }

    pub fn user_by_email(&self, email: &str) -> Option<User> {
        self.tables.lock().unwrap().users.iter().find(|u| u.email == email).cloned()
    }
}

fn to_row(p: NewCoinPurchase) -> CoinPurchase {
    CoinPurchase {
        id: Uuid::new_v4(),
        user_id: p.user_id,
        coins: p.coins,
        amount: p.amount,
        currency: p.currency.as_str().to_string(),
        payment_method: p.payment_method.as_str().to_string(),
        payment_intent_id: p.payment_intent_id,
        status: p.status.as_str().to_string(),
        created_at: OffsetDateTime::now_utc(),
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_user(&self, id: Uuid) -> DbResult<Option<User>> {
        Ok(self.tables.lock().unwrap().users.iter().find(|u| u.id == id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> DbResult<Option<User>> {
        Ok(self.user_by_email(email))
    }

    async fn create_user(&self, user: NewUser) -> DbResult<User> {
        let mut t = self.tables.lock().unwrap();
        if t.users.iter().any(|u| u.email == user.email) {
            return Err(DbError::Conflict("users_email_key".into()));
        }
        let now = OffsetDateTime::now_utc();
        let row = User {
            id: Uuid::new_v4(),
            email: user.email,
            password_hash: user.password_hash,
            first_name: user.first_name,
            last_name: user.last_name,
            profile_image_url: None,
            stripe_customer_id: None,
            stripe_subscription_id: None,
            created_at: now,
            updated_at: now,
        };
        t.users.push(row.clone());
        Ok(row)
    }

    async fn update_user_stripe_info(
        &self,
        user_id: Uuid,
        stripe_customer_id: &str,
        stripe_subscription_id: Option<&str>,
    ) -> DbResult<User> {
        let mut t = self.tables.lock().unwrap();
        let user = t.users.iter_mut().find(|u| u.id == user_id).ok_or(DbError::NotFound)?;
        if user.stripe_customer_id.is_none() {
            user.stripe_customer_id = Some(stripe_customer_id.to_string());
        }
        if let Some(sub) = stripe_subscription_id {
            user.stripe_subscription_id = Some(sub.to_string());
        }
        user.updated_at = OffsetDateTime::now_utc();
        Ok(user.clone())
    }

    async fn create_coin_purchase(&self, purchase: NewCoinPurchase) -> DbResult<CoinPurchase> {
        let row = to_row(purchase);
        self.tables.lock().unwrap().purchases.push(row.clone());
        Ok(row)
    }

    async fn insert_coin_purchase_if_absent(
        &self,
        purchase: NewCoinPurchase,
    ) -> DbResult<Option<CoinPurchase>> {
        let mut t = self.tables.lock().unwrap();
        let exists = purchase.payment_intent_id.is_some()
            && t.purchases.iter().any(|p| {
                p.payment_method == purchase.payment_method.as_str()
                    && p.payment_intent_id == purchase.payment_intent_id
            });
        if exists {
            return Ok(None);
        }
        let row = to_row(purchase);
        t.purchases.push(row.clone());
        Ok(Some(row))
    }

    async fn list_coin_purchases(&self, user_id: Uuid) -> DbResult<Vec<CoinPurchase>> {
        let t = self.tables.lock().unwrap();
        Ok(t.purchases.iter().filter(|p| p.user_id == user_id).cloned().collect())
    }

    async fn settle_coin_purchase(
        &self,
        method: PaymentMethod,
        payment_intent_id: &str,
        status: PurchaseStatus,
    ) -> DbResult<Option<CoinPurchase>> {
        let mut t = self.tables.lock().unwrap();
        let row = t.purchases.iter_mut().find(|p| {
            p.payment_method == method.as_str()
                && p.payment_intent_id.as_deref() == Some(payment_intent_id)
                && p.status == PurchaseStatus::Pending.as_str()
        });
        Ok(row.map(|p| {
            p.status = status.as_str().to_string();
            p.clone()
        }))
    }

    async fn create_contact_submission(
        &self,
        contact: NewContactSubmission,
    ) -> DbResult<ContactSubmission> {
        let row = ContactSubmission {
            id: Uuid::new_v4(),
            first_name: contact.first_name,
            last_name: contact.last_name,
            email: contact.email,
            subject: contact.subject,
            message: contact.message,
            created_at: OffsetDateTime::now_utc(),
        };
        self.tables.lock().unwrap().contacts.push(row.clone());
        Ok(row)
    }
}
