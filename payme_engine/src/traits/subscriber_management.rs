use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::db_types::{NewSubscriber, OrderRef, Subscriber, SubscriptionTier};

/// Resolution and entitlement mutation for the beneficiary records order references point at.
///
/// The subscriber table is owned by the surrounding service (registration, bot flows, admin
/// tooling all live there); the engine only resolves references during validation and extends
/// the subscription window after a payment has been captured.
#[allow(async_fn_in_trait)]
pub trait SubscriberManagement: Clone {
    /// Resolves an order reference to the subscriber being paid for. Returns `None` when no
    /// record matches; the caller decides whether that is a protocol error or a
    /// post-payment reconciliation problem.
    async fn fetch_subscriber(&self, order_ref: &OrderRef) -> Result<Option<Subscriber>, SubscriberApiError>;

    /// Sets the subscriber's tier and subscription expiry. Commits in its own transaction,
    /// deliberately separate from any payment state commit.
    async fn update_subscription(
        &self,
        subscriber_id: &str,
        tier: SubscriptionTier,
        expires_at: DateTime<Utc>,
    ) -> Result<Subscriber, SubscriberApiError>;

    /// Stores a new subscriber record, or returns the existing one with the same id. Used by the
    /// surrounding service at registration time and by test setups.
    async fn insert_subscriber(&self, subscriber: NewSubscriber) -> Result<Subscriber, SubscriberApiError>;
}

#[derive(Debug, Clone, Error)]
pub enum SubscriberApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Subscriber {0} does not exist")]
    SubscriberNotFound(String),
}

impl From<sqlx::Error> for SubscriberApiError {
    fn from(e: sqlx::Error) -> Self {
        SubscriberApiError::DatabaseError(e.to_string())
    }
}
