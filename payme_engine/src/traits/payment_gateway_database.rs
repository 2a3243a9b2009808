use thiserror::Error;

use crate::db_types::{NewPaymeTransaction, OrderRef, PaymeTransaction, TxId};

/// This trait defines the storage behaviour for backends supporting the payment engine.
///
/// This behaviour includes:
/// * Fetching and creating transaction rows keyed by the provider-issued transaction id.
/// * Atomic, state-guarded transitions between transaction states.
/// * Statement queries for reconciliation.
///
/// The `mark_*` transition methods are compare-and-swap operations: each one succeeds only if
/// the row is still in the expected source state, and returns `None` when another caller got
/// there first. Callers re-read the row and dispatch on what they find; since transitions are
/// monotone, that settles after at most a couple of attempts.
#[allow(async_fn_in_trait)]
pub trait PaymentGatewayDatabase: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Fetches the transaction with the given provider transaction id, if any.
    async fn fetch_transaction(&self, paycom_id: &TxId) -> Result<Option<PaymeTransaction>, PaymentGatewayError>;

    /// Returns the pending (`Created`) transaction for the given order, if one exists.
    ///
    /// Sandbox rows are excluded: the certification sandbox replays create calls against a
    /// single synthetic order reference and is allowed concurrent pending rows.
    async fn active_transaction_for_order(
        &self,
        order_ref: &OrderRef,
    ) -> Result<Option<PaymeTransaction>, PaymentGatewayError>;

    /// Inserts a new pending transaction row and returns it.
    ///
    /// Fails with [`PaymentGatewayError::TransactionAlreadyExists`] if a row with the same
    /// provider id exists, and with [`PaymentGatewayError::OrderBusy`] if another non-sandbox
    /// pending row for the same order sneaks in between the caller's single-shot check and the
    /// insert (the partial unique index closes that window).
    async fn insert_transaction(&self, tx: NewPaymeTransaction) -> Result<PaymeTransaction, PaymentGatewayError>;

    /// `Created → Completed`, stamping `perform_time`. Returns `None` if the row is no longer
    /// `Created`.
    async fn mark_completed(
        &self,
        paycom_id: &TxId,
        perform_time: i64,
    ) -> Result<Option<PaymeTransaction>, PaymentGatewayError>;

    /// `Created → Cancelled`, stamping the reason and `cancel_time`. Returns `None` if the row
    /// is no longer `Created`.
    async fn mark_cancelled(
        &self,
        paycom_id: &TxId,
        reason: i64,
        cancel_time: i64,
    ) -> Result<Option<PaymeTransaction>, PaymentGatewayError>;

    /// `Completed → Refunded`, stamping the reason and `cancel_time`. Returns `None` if the row
    /// is no longer `Completed`.
    async fn mark_refunded(
        &self,
        paycom_id: &TxId,
        reason: i64,
        cancel_time: i64,
    ) -> Result<Option<PaymeTransaction>, PaymentGatewayError>;

    /// `Created → Cancelled` with the fixed expiry reason code. Returns `None` if the row is no
    /// longer `Created`.
    async fn expire_transaction(
        &self,
        paycom_id: &TxId,
        cancel_time: i64,
    ) -> Result<Option<PaymeTransaction>, PaymentGatewayError>;

    /// Finalizes every pending transaction older than the 12-hour validity window as cancelled
    /// with the expiry reason, in a single statement.
    ///
    /// The per-row lazy expiry in Create/Perform remains authoritative; this sweep exists so
    /// abandoned rows are not left pending until the provider happens to retry them.
    ///
    /// The result is the list of transactions that were expired.
    async fn expire_stale_transactions(&self, now_ms: i64) -> Result<Vec<PaymeTransaction>, PaymentGatewayError>;

    /// Fetches transactions whose provider timestamp lies in `[from_ms, to_ms]` (inclusive),
    /// ordered by that timestamp.
    async fn fetch_transactions_in_range(
        &self,
        from_ms: i64,
        to_ms: i64,
    ) -> Result<Vec<PaymeTransaction>, PaymentGatewayError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), PaymentGatewayError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum PaymentGatewayError {
    #[error("We have an internal database engine error (configuration/uptime etc.): {0}")]
    DatabaseError(String),
    #[error("Cannot insert transaction, since it already exists with provider id {0}")]
    TransactionAlreadyExists(TxId),
    #[error("Order {0} already has a pending transaction")]
    OrderBusy(OrderRef),
    #[error("The requested transaction {0} does not exist")]
    TransactionNotFound(TxId),
}

impl From<sqlx::Error> for PaymentGatewayError {
    fn from(e: sqlx::Error) -> Self {
        PaymentGatewayError::DatabaseError(e.to_string())
    }
}
