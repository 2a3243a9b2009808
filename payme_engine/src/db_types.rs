use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use pmg_common::Tiyin;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

/// How long a pending transaction stays valid, measured from `create_time`. Fixed by the
/// provider's certification suite at 12 hours; not configurable per request.
pub const TRANSACTION_TIMEOUT_MS: i64 = 43_200_000;

/// The reason code recorded when a pending transaction is finalized as cancelled by expiry.
pub const REASON_EXPIRED: i64 = 4;

//--------------------------------------  TransactionState  ----------------------------------------------------------
/// The lifecycle state of a merchant transaction, using the integer values the Payme protocol
/// puts on the wire.
///
/// Transitions are monotone: `Created → Completed → Refunded` or `Created → Cancelled`. Nothing
/// ever returns to `Created`, and the only move out of a terminal state is
/// `Completed → Refunded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
#[repr(i32)]
pub enum TransactionState {
    /// The transaction has been created and is awaiting perform or cancel.
    Created = 1,
    /// The payment has been captured.
    Completed = 2,
    /// The pending transaction was cancelled before completion (or expired).
    Cancelled = -1,
    /// The completed transaction was reversed.
    Refunded = -2,
}

impl TransactionState {
    pub fn as_int(self) -> i64 {
        self as i64
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, TransactionState::Created)
    }

    pub fn can_transition_to(self, next: TransactionState) -> bool {
        use TransactionState::*;
        matches!((self, next), (Created, Completed) | (Created, Cancelled) | (Completed, Refunded))
    }
}

impl Display for TransactionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionState::Created => write!(f, "Created"),
            TransactionState::Completed => write!(f, "Completed"),
            TransactionState::Cancelled => write!(f, "Cancelled"),
            TransactionState::Refunded => write!(f, "Refunded"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid transaction state: {0}")]
pub struct StateConversionError(i64);

impl TryFrom<i64> for TransactionState {
    type Error = StateConversionError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(TransactionState::Created),
            2 => Ok(TransactionState::Completed),
            -1 => Ok(TransactionState::Cancelled),
            -2 => Ok(TransactionState::Refunded),
            v => Err(StateConversionError(v)),
        }
    }
}

impl From<TransactionState> for i64 {
    fn from(state: TransactionState) -> Self {
        state.as_int()
    }
}

//--------------------------------------       TxId        -----------------------------------------------------------
/// The transaction identifier issued by the payment provider. It is the idempotency key for
/// Create/Perform/Cancel: at most one stored transaction exists per `TxId`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct TxId(pub String);

impl FromStr for TxId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for TxId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TxId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for TxId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TxId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------     OrderRef      -----------------------------------------------------------
/// An opaque string the counterparty uses to name the beneficiary account being paid into.
///
/// It is not a foreign key at the storage layer; it is resolved lazily against the subscriber
/// records, because the provider reuses references across sandbox scenarios.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderRef(pub String);

impl From<String> for OrderRef {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderRef {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl OrderRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------  PaymeTransaction  ----------------------------------------------------------
/// A merchant transaction row. One row per provider-issued transaction id; rows are mutated in
/// place by state transitions and never deleted.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PaymeTransaction {
    /// System-generated identity; the public handle returned to the provider.
    pub id: i64,
    /// The provider-issued transaction id.
    pub paycom_id: TxId,
    /// The timestamp the provider attached to the create call, in ms. Stored verbatim for
    /// statement queries; distinct from `create_time`.
    pub paycom_time: i64,
    pub order_ref: OrderRef,
    /// The amount in tiyin, as supplied by the provider. Immutable after creation.
    pub amount: Tiyin,
    pub state: TransactionState,
    /// Cancellation/refund reason code; only set for negative states.
    pub reason: Option<i64>,
    /// Set on rows created through the certification sandbox bypass. Sandbox rows are exempt
    /// from the single-pending-transaction-per-order rule.
    pub sandbox: bool,
    /// When the row was created, in ms. The basis for timeout computation.
    pub create_time: i64,
    pub perform_time: Option<i64>,
    pub cancel_time: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymeTransaction {
    /// A transaction expires when it has stayed `Created` for longer than
    /// [`TRANSACTION_TIMEOUT_MS`].
    pub fn is_expired(&self, now_ms: i64) -> bool {
        self.state == TransactionState::Created && now_ms - self.create_time > TRANSACTION_TIMEOUT_MS
    }
}

//-------------------------------------- NewPaymeTransaction ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewPaymeTransaction {
    pub paycom_id: TxId,
    pub paycom_time: i64,
    pub order_ref: OrderRef,
    pub amount: Tiyin,
    pub create_time: i64,
    pub sandbox: bool,
}

impl NewPaymeTransaction {
    pub fn new(paycom_id: TxId, paycom_time: i64, order_ref: OrderRef, amount: Tiyin, create_time: i64) -> Self {
        Self { paycom_id, paycom_time, order_ref, amount, create_time, sandbox: false }
    }

    pub fn for_sandbox(mut self) -> Self {
        self.sandbox = true;
        self
    }
}

//--------------------------------------  SubscriptionTier  ----------------------------------------------------------
/// The paid tiers a subscriber can hold, ordered from lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    Plus,
    Pro,
    Premium,
}

impl Display for SubscriptionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubscriptionTier::Plus => write!(f, "plus"),
            SubscriptionTier::Pro => write!(f, "pro"),
            SubscriptionTier::Premium => write!(f, "premium"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid subscription tier: {0}")]
pub struct TierConversionError(String);

impl FromStr for SubscriptionTier {
    type Err = TierConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plus" => Ok(Self::Plus),
            "pro" => Ok(Self::Pro),
            "premium" => Ok(Self::Premium),
            s => Err(TierConversionError(s.to_string())),
        }
    }
}

//--------------------------------------     Subscriber     ----------------------------------------------------------
/// The beneficiary record an order reference resolves to. Owned by the surrounding service;
/// the engine reads it during validation and mutates only the subscription window, after a
/// payment has been captured.
#[derive(Debug, Clone, FromRow)]
pub struct Subscriber {
    pub id: String,
    pub telegram_id: Option<i64>,
    pub language: Option<String>,
    pub subscription_tier: Option<SubscriptionTier>,
    pub subscription_ends_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------   NewSubscriber    ----------------------------------------------------------
#[derive(Debug, Clone, Default)]
pub struct NewSubscriber {
    pub id: String,
    pub telegram_id: Option<i64>,
    pub language: Option<String>,
}

impl NewSubscriber {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self { id: id.into(), telegram_id: None, language: None }
    }

    pub fn with_telegram_id(mut self, telegram_id: i64) -> Self {
        self.telegram_id = Some(telegram_id);
        self
    }
}
