//! `SqliteDatabase` is a concrete implementation of a payment engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the
//! [`crate::traits`] module.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::db::{db_url, new_pool, subscribers, transactions};
use crate::{
    db_types::{NewPaymeTransaction, NewSubscriber, OrderRef, PaymeTransaction, Subscriber, SubscriptionTier, TxId},
    traits::{PaymentGatewayDatabase, PaymentGatewayError, SubscriberApiError, SubscriberManagement},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new connection pool against the database configured in `PMG_DATABASE_URL`
    /// (falling back to the default path).
    pub async fn new(max_connections: u32) -> Result<Self, PaymentGatewayError> {
        let url = db_url();
        Self::new_with_url(&url, max_connections).await
    }

    /// Creates a new connection pool for the given database URL.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, PaymentGatewayError> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl PaymentGatewayDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn fetch_transaction(&self, paycom_id: &TxId) -> Result<Option<PaymeTransaction>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let tx = transactions::fetch_transaction_by_paycom_id(paycom_id, &mut conn).await?;
        Ok(tx)
    }

    async fn active_transaction_for_order(
        &self,
        order_ref: &OrderRef,
    ) -> Result<Option<PaymeTransaction>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let tx = transactions::fetch_active_transaction_for_order(order_ref, &mut conn).await?;
        Ok(tx)
    }

    async fn insert_transaction(&self, tx: NewPaymeTransaction) -> Result<PaymeTransaction, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        transactions::insert_transaction(tx, &mut conn).await
    }

    async fn mark_completed(
        &self,
        paycom_id: &TxId,
        perform_time: i64,
    ) -> Result<Option<PaymeTransaction>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        transactions::mark_completed(paycom_id, perform_time, &mut conn).await
    }

    async fn mark_cancelled(
        &self,
        paycom_id: &TxId,
        reason: i64,
        cancel_time: i64,
    ) -> Result<Option<PaymeTransaction>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        transactions::mark_cancelled(paycom_id, reason, cancel_time, &mut conn).await
    }

    async fn mark_refunded(
        &self,
        paycom_id: &TxId,
        reason: i64,
        cancel_time: i64,
    ) -> Result<Option<PaymeTransaction>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        transactions::mark_refunded(paycom_id, reason, cancel_time, &mut conn).await
    }

    async fn expire_transaction(
        &self,
        paycom_id: &TxId,
        cancel_time: i64,
    ) -> Result<Option<PaymeTransaction>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        transactions::expire_transaction(paycom_id, cancel_time, &mut conn).await
    }

    async fn expire_stale_transactions(&self, now_ms: i64) -> Result<Vec<PaymeTransaction>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        transactions::expire_stale_transactions(now_ms, &mut conn).await
    }

    async fn fetch_transactions_in_range(
        &self,
        from_ms: i64,
        to_ms: i64,
    ) -> Result<Vec<PaymeTransaction>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let rows = transactions::fetch_transactions_in_range(from_ms, to_ms, &mut conn).await?;
        Ok(rows)
    }

    async fn close(&mut self) -> Result<(), PaymentGatewayError> {
        self.pool.close().await;
        Ok(())
    }
}

impl SubscriberManagement for SqliteDatabase {
    async fn fetch_subscriber(&self, order_ref: &OrderRef) -> Result<Option<Subscriber>, SubscriberApiError> {
        let mut conn = self.pool.acquire().await.map_err(|e| SubscriberApiError::DatabaseError(e.to_string()))?;
        let subscriber = subscribers::fetch_subscriber(order_ref, &mut conn).await?;
        Ok(subscriber)
    }

    async fn update_subscription(
        &self,
        subscriber_id: &str,
        tier: SubscriptionTier,
        expires_at: DateTime<Utc>,
    ) -> Result<Subscriber, SubscriberApiError> {
        let mut conn = self.pool.acquire().await.map_err(|e| SubscriberApiError::DatabaseError(e.to_string()))?;
        subscribers::update_subscription(subscriber_id, tier, expires_at, &mut conn).await
    }

    async fn insert_subscriber(&self, subscriber: NewSubscriber) -> Result<Subscriber, SubscriberApiError> {
        let mut conn = self.pool.acquire().await.map_err(|e| SubscriberApiError::DatabaseError(e.to_string()))?;
        subscribers::idempotent_insert(subscriber, &mut conn).await
    }
}
