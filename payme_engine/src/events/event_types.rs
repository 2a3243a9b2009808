use chrono::{DateTime, Utc};

use crate::db_types::{PaymeTransaction, SubscriptionTier};

/// Emitted after a captured payment has extended a subscriber's access window. Notification
/// delivery (chat messages etc.) subscribes here; the payment flow never waits on it.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionGrantedEvent {
    pub subscriber_id: String,
    pub tier: SubscriptionTier,
    pub months: u32,
    pub expires_at: DateTime<Utc>,
}

/// Emitted when a transaction is finalized negatively: cancelled, expired or refunded. The
/// stored row carries the reason code.
#[derive(Debug, Clone)]
pub struct TransactionAnnulledEvent {
    pub transaction: PaymeTransaction,
}

impl TransactionAnnulledEvent {
    pub fn new(transaction: PaymeTransaction) -> Self {
        Self { transaction }
    }
}
