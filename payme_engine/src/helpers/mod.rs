mod order_extractor;

pub use order_extractor::{extract_order_ref, ORDER_REF_FIELDS};

/// The current wall-clock time in milliseconds since the epoch, the unit every protocol
/// timestamp uses.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
