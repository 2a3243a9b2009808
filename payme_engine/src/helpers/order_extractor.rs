use serde_json::Value;

use crate::db_types::OrderRef;

/// The account-object fields probed for the order reference, in priority order. `order_id` is
/// the standard field; the others are aliases the provider's certification sandbox sends.
pub const ORDER_REF_FIELDS: [&str; 3] = ["order_id", "Baraka_ai", "account_id"];

/// Extracts the order reference from the `account` parameter object.
///
/// The first present, non-empty field wins. Numeric values are accepted and stringified, since
/// the sandbox is not consistent about quoting.
pub fn extract_order_ref(account: &Value) -> Option<OrderRef> {
    let obj = account.as_object()?;
    ORDER_REF_FIELDS.iter().find_map(|field| match obj.get(*field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(OrderRef::from(s.as_str())),
        Some(Value::Number(n)) => Some(OrderRef::from(n.to_string())),
        _ => None,
    })
}
