use serde::Serialize;
use thiserror::Error;

use crate::traits::{PaymentGatewayError, SubscriberApiError};

/// Error codes fixed by the Payme merchant API. The certification suite matches on them
/// exactly.
pub mod codes {
    /// Order not available: reference missing, unresolvable, or busy with a pending transaction.
    pub const ORDER_NOT_AVAILABLE: i64 = -31050;
    pub const INVALID_AMOUNT: i64 = -31001;
    pub const TRANSACTION_NOT_FOUND: i64 = -31003;
    /// The transaction cannot be (re)processed: already finalized, expired, invalid state, or
    /// failed validation.
    pub const CANNOT_PERFORM: i64 = -31008;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INTERNAL_ERROR: i64 = -32400;
}

/// A failure of one of the merchant API operations.
///
/// Every business variant maps onto a fixed protocol code and a localized message triple; see
/// [`MerchantApiError::to_rpc_error`]. Storage failures are deliberately kept distinct from the
/// business codes so that a database outage can never masquerade as, say, a rejected amount.
#[derive(Debug, Clone, Error)]
pub enum MerchantApiError {
    #[error("No order reference field was supplied in the account parameters")]
    OrderFieldMissing,
    #[error("No subscriber matches order reference {0}")]
    OrderNotFound(String),
    #[error("Order {0} already has a pending transaction")]
    OrderBusy(String),
    #[error("Invalid amount")]
    InvalidAmount,
    #[error("Transaction {0} does not exist")]
    TransactionNotFound(String),
    #[error("Transaction {0} has timed out")]
    TransactionExpired(String),
    #[error("Transaction {0} has already been processed")]
    TransactionAlreadyFinalized(String),
    #[error("Transaction {0} is in an invalid state for this operation")]
    TransactionInInvalidState(String),
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
    #[error("Unknown method {0}")]
    UnknownMethod(String),
    #[error("Internal storage error: {0}")]
    DatabaseError(String),
}

impl MerchantApiError {
    pub fn code(&self) -> i64 {
        use MerchantApiError::*;
        match self {
            OrderFieldMissing | OrderNotFound(_) | OrderBusy(_) => codes::ORDER_NOT_AVAILABLE,
            InvalidAmount => codes::INVALID_AMOUNT,
            TransactionNotFound(_) => codes::TRANSACTION_NOT_FOUND,
            TransactionExpired(_) | TransactionAlreadyFinalized(_) | TransactionInInvalidState(_)
            | ValidationFailed(_) => codes::CANNOT_PERFORM,
            UnknownMethod(_) => codes::METHOD_NOT_FOUND,
            DatabaseError(_) => codes::INTERNAL_ERROR,
        }
    }

    /// The structured error object the protocol puts on the wire.
    pub fn to_rpc_error(&self) -> RpcError {
        use MerchantApiError::*;
        let (message, data) = match self {
            OrderFieldMissing => {
                (LocalizedMessage::new("Order ID not found", "Buyurtma ID topilmadi", "Order ID not found"), Some("order_id"))
            },
            OrderNotFound(_) => {
                (LocalizedMessage::new("User not found", "Foydalanuvchi topilmadi", "User not found"), Some("order_id"))
            },
            OrderBusy(_) => (
                LocalizedMessage::new(
                    "Order is busy (pending transaction exists)",
                    "Buyurtma band (kutayotgan to'lov mavjud)",
                    "Order is busy",
                ),
                Some("order_id"),
            ),
            InvalidAmount => (LocalizedMessage::new("Invalid amount", "Noto'g'ri summa", "Invalid amount"), None),
            TransactionNotFound(_) => {
                (LocalizedMessage::new("Transaction not found", "Tranzaksiya topilmadi", "Transaction not found"), None)
            },
            TransactionExpired(_) => {
                (LocalizedMessage::new("Transaction timed out", "Tranzaksiya vaqti tugadi", "Transaction timed out"), None)
            },
            TransactionAlreadyFinalized(_) => (
                LocalizedMessage::new(
                    "Transaction already processed",
                    "Tranzaksiya allaqachon bajarilgan",
                    "Transaction already processed",
                ),
                None,
            ),
            TransactionInInvalidState(_) => (
                LocalizedMessage::new(
                    "Transaction in invalid state",
                    "Tranzaksiya holati noto'g'ri",
                    "Transaction in invalid state",
                ),
                None,
            ),
            ValidationFailed(_) => {
                (LocalizedMessage::new("Validation failed", "Tekshiruv xatosi", "Validation failed"), None)
            },
            UnknownMethod(_) => (LocalizedMessage::new("Method not found", "Metod topilmadi", "Method not found"), None),
            DatabaseError(_) => {
                (LocalizedMessage::new("Internal server error", "Ichki xatolik", "Internal server error"), None)
            },
        };
        RpcError { code: self.code(), message, data }
    }
}

impl From<PaymentGatewayError> for MerchantApiError {
    fn from(e: PaymentGatewayError) -> Self {
        match e {
            PaymentGatewayError::OrderBusy(order_ref) => MerchantApiError::OrderBusy(order_ref.to_string()),
            PaymentGatewayError::TransactionNotFound(id) => MerchantApiError::TransactionNotFound(id.to_string()),
            // insert races on the provider id are handled at the call site; anything that
            // reaches this conversion is a storage fault
            e => MerchantApiError::DatabaseError(e.to_string()),
        }
    }
}

impl From<SubscriberApiError> for MerchantApiError {
    fn from(e: SubscriberApiError) -> Self {
        MerchantApiError::DatabaseError(e.to_string())
    }
}

//--------------------------------------     RpcError      -----------------------------------------------------------
/// The wire shape of a protocol error: a negative code, a localized message map, and an
/// optional `data` field naming the offending parameter (the certification tooling checks it).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RpcError {
    pub code: i64,
    pub message: LocalizedMessage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalizedMessage {
    pub ru: &'static str,
    pub uz: &'static str,
    pub en: &'static str,
}

impl LocalizedMessage {
    pub fn new(ru: &'static str, uz: &'static str, en: &'static str) -> Self {
        Self { ru, uz, en }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn protocol_codes() {
        assert_eq!(MerchantApiError::OrderFieldMissing.code(), -31050);
        assert_eq!(MerchantApiError::OrderNotFound("x".into()).code(), -31050);
        assert_eq!(MerchantApiError::OrderBusy("x".into()).code(), -31050);
        assert_eq!(MerchantApiError::InvalidAmount.code(), -31001);
        assert_eq!(MerchantApiError::TransactionNotFound("t".into()).code(), -31003);
        assert_eq!(MerchantApiError::TransactionExpired("t".into()).code(), -31008);
        assert_eq!(MerchantApiError::TransactionAlreadyFinalized("t".into()).code(), -31008);
        assert_eq!(MerchantApiError::TransactionInInvalidState("t".into()).code(), -31008);
        assert_eq!(MerchantApiError::ValidationFailed("v".into()).code(), -31008);
        assert_eq!(MerchantApiError::UnknownMethod("m".into()).code(), -32601);
        assert_eq!(MerchantApiError::DatabaseError("d".into()).code(), -32400);
    }

    #[test]
    fn rpc_error_shape() {
        let err = MerchantApiError::OrderFieldMissing.to_rpc_error();
        assert_eq!(err.code, -31050);
        assert_eq!(err.data, Some("order_id"));
        assert_eq!(err.message.uz, "Buyurtma ID topilmadi");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], -31050);
        assert_eq!(json["message"]["ru"], "Order ID not found");
        assert_eq!(json["data"], "order_id");

        let err = MerchantApiError::InvalidAmount.to_rpc_error();
        let json = serde_json::to_value(&err).unwrap();
        assert!(json.get("data").is_none());
    }
}
