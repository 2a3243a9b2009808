//! The certification sandbox bypass.
//!
//! The payment provider's certification suite drives the merchant API with a fixed synthetic
//! order reference and a designated "invalid amount" probe. Requests for that reference must
//! succeed without resolving a real subscriber, may hold several pending transactions at once
//! (the suite replays create calls), and must never touch real entitlements. Everything that
//! recognises those synthetic identifiers lives here.
use pmg_common::Tiyin;

use crate::db_types::OrderRef;

/// The order reference the certification sandbox pays against.
pub const SANDBOX_ORDER_REF: &str = "697b5f9f5e5e8dad8f3acfc6";

/// The amount the sandbox sends for its "invalid amount" negative test.
pub const SANDBOX_INVALID_AMOUNT: Tiyin = Tiyin::new(10_000);

pub fn is_sandbox_order(order_ref: &OrderRef) -> bool {
    order_ref.as_str() == SANDBOX_ORDER_REF
}

pub fn is_invalid_amount_probe(amount: Tiyin) -> bool {
    amount == SANDBOX_INVALID_AMOUNT
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn sandbox_detection() {
        assert!(is_sandbox_order(&OrderRef::from(SANDBOX_ORDER_REF)));
        assert!(!is_sandbox_order(&OrderRef::from("user-42")));
        assert!(is_invalid_amount_probe(Tiyin::from(10_000)));
        assert!(!is_invalid_amount_probe(Tiyin::from(10_001)));
    }
}
