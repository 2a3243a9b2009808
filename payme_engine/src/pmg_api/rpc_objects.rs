//! Request and response objects for the merchant RPC surface.
//!
//! Field names follow the wire protocol, not this codebase's conventions: the provider sends
//! `id` for the transaction id and `time` for its own timestamp, and expects the stored
//! internal id back under `transaction`, stringified. Unset timestamps and reasons serialize as
//! null.
use serde::{Deserialize, Serialize};
use serde_json::Value;

use pmg_common::Tiyin;

use crate::db_types::{OrderRef, PaymeTransaction, TransactionState, TxId};

//--------------------------------------   Request params   ----------------------------------------------------------
#[derive(Debug, Clone, Deserialize)]
pub struct CheckPerformParams {
    pub amount: Tiyin,
    pub account: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateParams {
    pub id: TxId,
    /// The provider's own timestamp for the transaction, in ms.
    pub time: i64,
    pub amount: Tiyin,
    pub account: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PerformParams {
    pub id: TxId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CancelParams {
    pub id: TxId,
    pub reason: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckParams {
    pub id: TxId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatementParams {
    pub from: i64,
    pub to: i64,
}

//--------------------------------------      Results       ----------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckPerformResult {
    pub allow: bool,
}

impl CheckPerformResult {
    pub fn allowed() -> Self {
        Self { allow: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateResult {
    pub create_time: i64,
    pub transaction: String,
    pub state: TransactionState,
}

impl From<&PaymeTransaction> for CreateResult {
    fn from(tx: &PaymeTransaction) -> Self {
        Self { create_time: tx.create_time, transaction: tx.id.to_string(), state: tx.state }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PerformResult {
    pub perform_time: Option<i64>,
    pub transaction: String,
    pub state: TransactionState,
}

impl From<&PaymeTransaction> for PerformResult {
    fn from(tx: &PaymeTransaction) -> Self {
        Self { perform_time: tx.perform_time, transaction: tx.id.to_string(), state: tx.state }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CancelResult {
    pub cancel_time: Option<i64>,
    pub transaction: String,
    pub state: TransactionState,
}

impl From<&PaymeTransaction> for CancelResult {
    fn from(tx: &PaymeTransaction) -> Self {
        Self { cancel_time: tx.cancel_time, transaction: tx.id.to_string(), state: tx.state }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckTransactionResult {
    pub create_time: i64,
    pub perform_time: Option<i64>,
    pub cancel_time: Option<i64>,
    pub transaction: String,
    pub state: TransactionState,
    pub reason: Option<i64>,
}

impl From<&PaymeTransaction> for CheckTransactionResult {
    fn from(tx: &PaymeTransaction) -> Self {
        Self {
            create_time: tx.create_time,
            perform_time: tx.perform_time,
            cancel_time: tx.cancel_time,
            transaction: tx.id.to_string(),
            state: tx.state,
            reason: tx.reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatementResult {
    pub transactions: Vec<StatementEntry>,
}

/// One statement line: the stored transaction in the shape the provider's reconciliation
/// expects, with the provider's own id and timestamp leading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatementEntry {
    pub id: TxId,
    pub time: i64,
    pub amount: Tiyin,
    pub account: StatementAccount,
    pub create_time: i64,
    pub perform_time: Option<i64>,
    pub cancel_time: Option<i64>,
    pub transaction: String,
    pub state: TransactionState,
    pub reason: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatementAccount {
    pub order_id: OrderRef,
}

impl From<&PaymeTransaction> for StatementEntry {
    fn from(tx: &PaymeTransaction) -> Self {
        Self {
            id: tx.paycom_id.clone(),
            time: tx.paycom_time,
            amount: tx.amount,
            account: StatementAccount { order_id: tx.order_ref.clone() },
            create_time: tx.create_time,
            perform_time: tx.perform_time,
            cancel_time: tx.cancel_time,
            transaction: tx.id.to_string(),
            state: tx.state,
            reason: tx.reason,
        }
    }
}

#[cfg(test)]
mod test {
    use chrono::Utc;
    use serde_json::json;

    use super::*;

    fn sample_tx() -> PaymeTransaction {
        PaymeTransaction {
            id: 7,
            paycom_id: TxId::from("5e5e7bd8d8f3ac697b5f9f5e"),
            paycom_time: 1_700_000_000_123,
            order_ref: OrderRef::from("user-42"),
            amount: Tiyin::from(3_499_900),
            state: TransactionState::Created,
            reason: None,
            sandbox: false,
            create_time: 1_700_000_000_200,
            perform_time: None,
            cancel_time: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn create_result_wire_shape() {
        let result = CreateResult::from(&sample_tx());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json, json!({"create_time": 1_700_000_000_200i64, "transaction": "7", "state": 1}));
    }

    #[test]
    fn check_result_serializes_unset_times_as_null() {
        let result = CheckTransactionResult::from(&sample_tx());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["perform_time"], Value::Null);
        assert_eq!(json["cancel_time"], Value::Null);
        assert_eq!(json["reason"], Value::Null);
        assert_eq!(json["state"], 1);
    }

    #[test]
    fn statement_entry_nests_the_account() {
        let entry = StatementEntry::from(&sample_tx());
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["account"]["order_id"], "user-42");
        assert_eq!(json["id"], "5e5e7bd8d8f3ac697b5f9f5e");
        assert_eq!(json["time"], 1_700_000_000_123i64);
    }

    #[test]
    fn params_deserialize_from_wire_json() {
        let params: CreateParams = serde_json::from_value(json!({
            "id": "abc", "time": 1_700_000_000_000i64, "amount": 4_999_900, "account": {"order_id": "user-42"}
        }))
        .unwrap();
        assert_eq!(params.id.as_str(), "abc");
        assert_eq!(params.amount, Tiyin::from(4_999_900));
    }
}
