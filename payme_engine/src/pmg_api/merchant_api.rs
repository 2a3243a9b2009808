use std::fmt::Debug;

use log::*;
use pmg_common::Tiyin;
use serde::Serialize;
use serde_json::Value;

use crate::{
    db_types::{NewPaymeTransaction, OrderRef, PaymeTransaction, TransactionState},
    events::{EventProducers, TransactionAnnulledEvent},
    helpers::{extract_order_ref, now_ms},
    pmg_api::{
        errors::MerchantApiError,
        rpc_objects::{
            CancelParams,
            CancelResult,
            CheckParams,
            CheckPerformParams,
            CheckPerformResult,
            CheckTransactionResult,
            CreateParams,
            CreateResult,
            PerformParams,
            PerformResult,
            StatementEntry,
            StatementParams,
            StatementResult,
        },
        EntitlementApi,
    },
    sandbox,
    traits::{PaymentGatewayDatabase, PaymentGatewayError, SubscriberManagement},
};

/// `MerchantApi` is the primary API for handling the Payme merchant RPC calls: check, create,
/// perform, cancel, audit.
///
/// Every operation is idempotent under retry with the same provider transaction id, enforces
/// the single-pending-transaction-per-order rule, and finalizes expired pending rows lazily as
/// it encounters them. The surrounding web layer authenticates the webhook and then dispatches
/// into [`Self::dispatch`] (or the typed methods directly).
pub struct MerchantApi<B> {
    db: B,
    granter: EntitlementApi<B>,
    producers: EventProducers,
}

impl<B> Debug for MerchantApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MerchantApi")
    }
}

impl<B: Clone> MerchantApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        let granter = EntitlementApi::new(db.clone(), producers.clone());
        Self { db, granter, producers }
    }
}

impl<B> MerchantApi<B>
where B: PaymentGatewayDatabase + SubscriberManagement
{
    /// Dispatches an RPC call by its protocol method name. Unknown methods fail with the
    /// protocol's method-not-found code; malformed parameter objects fail validation.
    pub async fn dispatch(&self, method: &str, params: Value) -> Result<Value, MerchantApiError> {
        match method {
            "CheckPerformTransaction" => to_wire(self.check_perform_transaction(parse(params)?).await?),
            "CreateTransaction" => to_wire(self.create_transaction(parse(params)?).await?),
            "PerformTransaction" => to_wire(self.perform_transaction(parse(params)?).await?),
            "CancelTransaction" => to_wire(self.cancel_transaction(parse(params)?).await?),
            "CheckTransaction" => to_wire(self.check_transaction(parse(params)?).await?),
            "GetStatement" => to_wire(self.get_statement(parse(params)?).await?),
            other => {
                warn!("🔄️ Unknown method called: {other}");
                Err(MerchantApiError::UnknownMethod(other.to_string()))
            },
        }
    }

    /// Validates that a payment of `amount` against the given account could be performed.
    /// Pure validation: no row is created or mutated.
    pub async fn check_perform_transaction(
        &self,
        params: CheckPerformParams,
    ) -> Result<CheckPerformResult, MerchantApiError> {
        let order_ref = extract_order_ref(&params.account).ok_or(MerchantApiError::OrderFieldMissing)?;
        self.validate(&order_ref, params.amount).await?;
        Ok(CheckPerformResult::allowed())
    }

    /// Creates a new pending transaction, or replays the stored result for a retried create.
    pub async fn create_transaction(&self, params: CreateParams) -> Result<CreateResult, MerchantApiError> {
        let CreateParams { id: paycom_id, time: paycom_time, amount, account } = params;
        let order_ref = extract_order_ref(&account).ok_or(MerchantApiError::OrderFieldMissing)?;
        let now = now_ms();

        if let Some(tx) = self.db.fetch_transaction(&paycom_id).await? {
            return self.replay_create(tx, now).await;
        }

        let is_sandbox = sandbox::is_sandbox_order(&order_ref);
        if !is_sandbox {
            if let Some(active) = self.db.active_transaction_for_order(&order_ref).await? {
                info!("⛔️ Order {order_ref} is busy with transaction {}", active.paycom_id);
                return Err(MerchantApiError::OrderBusy(order_ref.to_string()));
            }
        }
        self.validate(&order_ref, amount).await?;

        let mut new_tx = NewPaymeTransaction::new(paycom_id.clone(), paycom_time, order_ref.clone(), amount, now);
        if is_sandbox {
            new_tx = new_tx.for_sandbox();
        }
        match self.db.insert_transaction(new_tx).await {
            Ok(tx) => {
                info!("📝️ Transaction {} created for order {order_ref} with id {}", tx.paycom_id, tx.id);
                Ok(CreateResult::from(&tx))
            },
            Err(PaymentGatewayError::OrderBusy(order_ref)) => {
                // the partial unique index caught a create racing this one on a different id
                info!("⛔️ Order {order_ref} became busy during create");
                Err(MerchantApiError::OrderBusy(order_ref.to_string()))
            },
            Err(PaymentGatewayError::TransactionAlreadyExists(_)) => {
                // a concurrent retry of this same webhook won the insert; answer from its row
                let tx = self
                    .db
                    .fetch_transaction(&paycom_id)
                    .await?
                    .ok_or_else(|| MerchantApiError::TransactionNotFound(paycom_id.to_string()))?;
                self.replay_create(tx, now).await
            },
            Err(e) => Err(e.into()),
        }
    }

    /// Completes a pending transaction and triggers the entitlement grant.
    pub async fn perform_transaction(&self, params: PerformParams) -> Result<PerformResult, MerchantApiError> {
        let paycom_id = params.id;
        let now = now_ms();
        let tx = self
            .db
            .fetch_transaction(&paycom_id)
            .await?
            .ok_or_else(|| MerchantApiError::TransactionNotFound(paycom_id.to_string()))?;
        match tx.state {
            TransactionState::Created if tx.is_expired(now) => {
                self.finalize_expired(&tx, now).await?;
                Err(MerchantApiError::TransactionExpired(paycom_id.to_string()))
            },
            TransactionState::Created => match self.db.mark_completed(&paycom_id, now).await? {
                Some(tx) => {
                    info!("✅️ Transaction {} performed for order {}", tx.paycom_id, tx.order_ref);
                    if tx.sandbox {
                        info!("🧪️ Sandbox bypass: skipping entitlement grant for order {}", tx.order_ref);
                    } else {
                        // best-effort follow-up; must never undo the committed completion
                        self.granter.grant(&tx.order_ref, tx.amount).await;
                    }
                    Ok(PerformResult::from(&tx))
                },
                None => {
                    // another worker transitioned the row between our read and the swap
                    let tx = self
                        .db
                        .fetch_transaction(&paycom_id)
                        .await?
                        .ok_or_else(|| MerchantApiError::TransactionNotFound(paycom_id.to_string()))?;
                    match tx.state {
                        TransactionState::Completed => Ok(PerformResult::from(&tx)),
                        _ => Err(MerchantApiError::TransactionInInvalidState(paycom_id.to_string())),
                    }
                },
            },
            // idempotent replay
            TransactionState::Completed => Ok(PerformResult::from(&tx)),
            state => {
                warn!("🔄️ Perform called on transaction {paycom_id} in state {state}");
                Err(MerchantApiError::TransactionInInvalidState(paycom_id.to_string()))
            },
        }
    }

    /// Cancels a pending transaction, or refunds a completed one. Once a transaction has
    /// reached a negative state, further cancels replay the stored result.
    ///
    /// Entitlement revocation on refund is deliberately not performed; refunds are reconciled
    /// manually.
    pub async fn cancel_transaction(&self, params: CancelParams) -> Result<CancelResult, MerchantApiError> {
        let CancelParams { id: paycom_id, reason } = params;
        let now = now_ms();
        // A missed swap means another worker moved the state between our read and the update;
        // transitions are monotone, so re-reading settles this within a bounded number of laps.
        loop {
            let tx = self
                .db
                .fetch_transaction(&paycom_id)
                .await?
                .ok_or_else(|| MerchantApiError::TransactionNotFound(paycom_id.to_string()))?;
            let updated = match tx.state {
                TransactionState::Created => self.db.mark_cancelled(&paycom_id, reason, now).await?,
                TransactionState::Completed => self.db.mark_refunded(&paycom_id, reason, now).await?,
                // already finalized negatively: idempotent replay
                _ => return Ok(CancelResult::from(&tx)),
            };
            if let Some(tx) = updated {
                match tx.state {
                    TransactionState::Refunded => {
                        info!("❌️ Transaction {} refunded (reason {reason})", tx.paycom_id)
                    },
                    _ => info!("❌️ Transaction {} cancelled (reason {reason})", tx.paycom_id),
                }
                self.publish_annulled(&tx).await;
                return Ok(CancelResult::from(&tx));
            }
        }
    }

    /// Returns the full stored record for a transaction. Pure read.
    pub async fn check_transaction(&self, params: CheckParams) -> Result<CheckTransactionResult, MerchantApiError> {
        let tx = self
            .db
            .fetch_transaction(&params.id)
            .await?
            .ok_or_else(|| MerchantApiError::TransactionNotFound(params.id.to_string()))?;
        Ok(CheckTransactionResult::from(&tx))
    }

    /// Returns every transaction whose provider timestamp falls in the inclusive range. Pure
    /// read; used by the provider for reconciliation.
    pub async fn get_statement(&self, params: StatementParams) -> Result<StatementResult, MerchantApiError> {
        let rows = self.db.fetch_transactions_in_range(params.from, params.to).await?;
        let transactions = rows.iter().map(StatementEntry::from).collect();
        Ok(StatementResult { transactions })
    }

    /// Finalizes every pending transaction older than the validity window. The per-call lazy
    /// expiry already keeps the protocol honest; this sweep stops abandoned rows from lingering
    /// until the provider happens to retry them.
    pub async fn expire_stale_transactions(&self) -> Result<Vec<PaymeTransaction>, MerchantApiError> {
        let now = now_ms();
        let expired = self.db.expire_stale_transactions(now).await?;
        if !expired.is_empty() {
            info!("⌛️ {} stale pending transaction(s) finalized as cancelled", expired.len());
        }
        for tx in &expired {
            self.publish_annulled(tx).await;
        }
        Ok(expired)
    }

    /// The shared validation used by check and create. Sandbox orders skip subscriber
    /// resolution entirely; for real orders the subscriber must resolve and the amount must be
    /// positive. The amount is *not* checked against the price table: the provider generates it
    /// from the plan the user picked, and the certification suite sends amounts the table has
    /// never heard of.
    async fn validate(&self, order_ref: &OrderRef, amount: Tiyin) -> Result<(), MerchantApiError> {
        if sandbox::is_sandbox_order(order_ref) {
            info!("🧪️ Sandbox bypass triggered for order {order_ref}");
            if sandbox::is_invalid_amount_probe(amount) {
                info!("🧪️ Sandbox negative test: invalid amount");
                return Err(MerchantApiError::InvalidAmount);
            }
            return Ok(());
        }
        if self.db.fetch_subscriber(order_ref).await?.is_none() {
            warn!("🔄️ No subscriber matches order reference {order_ref}");
            return Err(MerchantApiError::OrderNotFound(order_ref.to_string()));
        }
        if amount <= Tiyin::from(0) {
            warn!("🔄️ Invalid amount {amount} for order {order_ref}");
            return Err(MerchantApiError::InvalidAmount);
        }
        Ok(())
    }

    /// Replays a create call against its stored row: unchanged result while the row is still
    /// pending and valid, expiry if it aged out, and a hard error once it is finalized.
    async fn replay_create(&self, tx: PaymeTransaction, now: i64) -> Result<CreateResult, MerchantApiError> {
        match tx.state {
            TransactionState::Created if tx.is_expired(now) => {
                self.finalize_expired(&tx, now).await?;
                Err(MerchantApiError::TransactionExpired(tx.paycom_id.to_string()))
            },
            TransactionState::Created => Ok(CreateResult::from(&tx)),
            state => {
                warn!("🔄️ Transaction {} already processed (state {state})", tx.paycom_id);
                Err(MerchantApiError::TransactionAlreadyFinalized(tx.paycom_id.to_string()))
            },
        }
    }

    /// Persists the lazy expiry of a pending row. Losing the swap is fine: it means another
    /// worker finalized the row first, and the caller's expiry error stands either way.
    async fn finalize_expired(&self, tx: &PaymeTransaction, now: i64) -> Result<(), MerchantApiError> {
        warn!("⌛️ Transaction {} timed out; finalizing as cancelled", tx.paycom_id);
        if let Some(expired) = self.db.expire_transaction(&tx.paycom_id, now).await? {
            self.publish_annulled(&expired).await;
        }
        Ok(())
    }

    async fn publish_annulled(&self, tx: &PaymeTransaction) {
        for emitter in &self.producers.transaction_annulled_producer {
            emitter.publish_event(TransactionAnnulledEvent::new(tx.clone())).await;
        }
    }
}

fn parse<T: serde::de::DeserializeOwned>(params: Value) -> Result<T, MerchantApiError> {
    serde_json::from_value(params).map_err(|e| MerchantApiError::ValidationFailed(e.to_string()))
}

fn to_wire<T: Serialize>(result: T) -> Result<Value, MerchantApiError> {
    serde_json::to_value(result).map_err(|e| MerchantApiError::DatabaseError(e.to_string()))
}
