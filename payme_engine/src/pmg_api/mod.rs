//! The engine public API.
//!
//! [`MerchantApi`] carries the six RPC operations of the Payme merchant protocol and the
//! method-name dispatcher the web layer calls into. [`EntitlementApi`] is the post-payment
//! granter; it is owned by the merchant API but can also be driven directly, e.g. by
//! reconciliation tooling re-applying a missed grant.
pub mod errors;
pub mod rpc_objects;

mod entitlement;
mod merchant_api;

pub use entitlement::EntitlementApi;
pub use merchant_api::MerchantApi;
