use log::{debug, trace, warn};
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewPaymeTransaction, OrderRef, PaymeTransaction, TxId, REASON_EXPIRED, TRANSACTION_TIMEOUT_MS},
    traits::PaymentGatewayError,
};

/// Returns the transaction row for the corresponding provider `paycom_id`, if any.
pub async fn fetch_transaction_by_paycom_id(
    paycom_id: &TxId,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymeTransaction>, sqlx::Error> {
    let tx = sqlx::query_as("SELECT * FROM payme_transactions WHERE paycom_id = $1")
        .bind(paycom_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(tx)
}

/// Returns a pending (`Created`) transaction for the given order, excluding sandbox rows.
///
/// `LIMIT 1` keeps the query robust against pre-hardening databases that already hold several
/// pending rows for one order.
pub async fn fetch_active_transaction_for_order(
    order_ref: &OrderRef,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymeTransaction>, sqlx::Error> {
    let tx = sqlx::query_as(
        "SELECT * FROM payme_transactions WHERE order_ref = $1 AND state = 1 AND sandbox = 0 ORDER BY id LIMIT 1",
    )
    .bind(order_ref.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(tx)
}

/// Inserts a new pending transaction row.
///
/// Unique violations are mapped onto business errors: a duplicate `paycom_id` means a concurrent
/// retry of the same webhook won the insert race, and a hit on the partial active-order index
/// means the order picked up another pending transaction since the caller's single-shot check.
pub async fn insert_transaction(
    tx: NewPaymeTransaction,
    conn: &mut SqliteConnection,
) -> Result<PaymeTransaction, PaymentGatewayError> {
    let inserted = sqlx::query_as(
        r#"
            INSERT INTO payme_transactions (
                paycom_id,
                paycom_time,
                order_ref,
                amount,
                state,
                sandbox,
                create_time
            ) VALUES ($1, $2, $3, $4, 1, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(tx.paycom_id.as_str())
    .bind(tx.paycom_time)
    .bind(tx.order_ref.as_str())
    .bind(tx.amount)
    .bind(tx.sandbox)
    .bind(tx.create_time)
    .fetch_one(conn)
    .await;
    match inserted {
        Ok(row) => {
            let row: PaymeTransaction = row;
            debug!("📝️ Transaction [{}] inserted with id {}", row.paycom_id, row.id);
            Ok(row)
        },
        Err(e) => {
            let unique = e.as_database_error().map(|de| de.is_unique_violation()).unwrap_or(false);
            if unique {
                let msg = e.as_database_error().map(|de| de.message().to_string()).unwrap_or_default();
                if msg.contains("paycom_id") {
                    warn!("📝️ Transaction [{}] lost an insert race to a concurrent retry", tx.paycom_id);
                    Err(PaymentGatewayError::TransactionAlreadyExists(tx.paycom_id))
                } else {
                    warn!("📝️ Order {} picked up a pending transaction during insert", tx.order_ref);
                    Err(PaymentGatewayError::OrderBusy(tx.order_ref))
                }
            } else {
                Err(e.into())
            }
        },
    }
}

/// `Created → Completed`. Returns `None` if the row is not in `Created` any more, so two
/// concurrent perform calls cannot both transition.
pub async fn mark_completed(
    paycom_id: &TxId,
    perform_time: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymeTransaction>, PaymentGatewayError> {
    let result = sqlx::query_as(
        "UPDATE payme_transactions SET state = 2, perform_time = $2, updated_at = CURRENT_TIMESTAMP WHERE paycom_id \
         = $1 AND state = 1 RETURNING *",
    )
    .bind(paycom_id.as_str())
    .bind(perform_time)
    .fetch_optional(conn)
    .await?;
    trace!("🗃️ mark_completed({paycom_id}) matched: {}", result.is_some());
    Ok(result)
}

/// `Created → Cancelled`. Returns `None` if the row is not in `Created` any more.
pub async fn mark_cancelled(
    paycom_id: &TxId,
    reason: i64,
    cancel_time: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymeTransaction>, PaymentGatewayError> {
    let result = sqlx::query_as(
        "UPDATE payme_transactions SET state = -1, reason = $2, cancel_time = $3, updated_at = CURRENT_TIMESTAMP \
         WHERE paycom_id = $1 AND state = 1 RETURNING *",
    )
    .bind(paycom_id.as_str())
    .bind(reason)
    .bind(cancel_time)
    .fetch_optional(conn)
    .await?;
    trace!("🗃️ mark_cancelled({paycom_id}) matched: {}", result.is_some());
    Ok(result)
}

/// `Completed → Refunded`. Returns `None` if the row is not in `Completed` any more.
pub async fn mark_refunded(
    paycom_id: &TxId,
    reason: i64,
    cancel_time: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymeTransaction>, PaymentGatewayError> {
    let result = sqlx::query_as(
        "UPDATE payme_transactions SET state = -2, reason = $2, cancel_time = $3, updated_at = CURRENT_TIMESTAMP \
         WHERE paycom_id = $1 AND state = 2 RETURNING *",
    )
    .bind(paycom_id.as_str())
    .bind(reason)
    .bind(cancel_time)
    .fetch_optional(conn)
    .await?;
    trace!("🗃️ mark_refunded({paycom_id}) matched: {}", result.is_some());
    Ok(result)
}

/// Finalizes a single expired pending transaction as cancelled with the fixed expiry reason.
pub async fn expire_transaction(
    paycom_id: &TxId,
    cancel_time: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymeTransaction>, PaymentGatewayError> {
    mark_cancelled(paycom_id, REASON_EXPIRED, cancel_time, conn).await
}

/// Finalizes every pending transaction older than the validity window in one statement.
pub async fn expire_stale_transactions(
    now_ms: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<PaymeTransaction>, PaymentGatewayError> {
    let rows = sqlx::query_as(
        "UPDATE payme_transactions SET state = -1, reason = $1, cancel_time = $2, updated_at = CURRENT_TIMESTAMP \
         WHERE state = 1 AND $2 - create_time > $3 RETURNING *",
    )
    .bind(REASON_EXPIRED)
    .bind(now_ms)
    .bind(TRANSACTION_TIMEOUT_MS)
    .fetch_all(conn)
    .await?;
    Ok(rows)
}

/// Fetches transactions with a provider timestamp in `[from_ms, to_ms]`, both ends inclusive,
/// ordered by that timestamp. Used for the provider's statement reconciliation.
pub async fn fetch_transactions_in_range(
    from_ms: i64,
    to_ms: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<PaymeTransaction>, sqlx::Error> {
    let rows = sqlx::query_as(
        "SELECT * FROM payme_transactions WHERE paycom_time >= $1 AND paycom_time <= $2 ORDER BY paycom_time ASC",
    )
    .bind(from_ms)
    .bind(to_ms)
    .fetch_all(conn)
    .await?;
    Ok(rows)
}
