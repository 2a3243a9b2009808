//! Payme Merchant Payment Engine
//!
//! The engine is the merchant-side processor for the Payme merchant API: the payment provider's
//! server calls into it to check, create, perform, cancel and audit payment transactions against
//! orders in this system. This library contains the core logic only; the HTTP transport and
//! request signature verification live in the surrounding web layer, which simply dispatches
//! decoded RPC calls into [`MerchantApi`].
//!
//! The library is divided into two main sections:
//! 1. Database management and control ([`mod@sqlite`]). SQLite is the supported backend. You
//!    should never need to access the database directly; use the public API instead. The
//!    exception is the data types used in the database, defined in the `db_types` module.
//! 2. The engine public API ([`mod@pmg_api`]). This provides the transaction state machine, the
//!    entitlement granter and the statement queries. A backend acts as storage for the engine by
//!    implementing the traits in the [`mod@traits`] module.
//!
//! The engine also provides a set of events that can be subscribed to. These events are emitted
//! after state changes commit, for example when a subscription has been granted following a
//! successful payment. A simple actor framework is used so that you can hook into these events
//! and deliver notifications without ever affecting the payment flow itself.
pub mod db_types;
pub mod events;
pub mod helpers;
pub mod pricing;
pub mod sandbox;

mod pmg_api;
mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use pmg_api::{
    errors::{LocalizedMessage, MerchantApiError, RpcError},
    rpc_objects,
    EntitlementApi,
    MerchantApi,
};
pub use traits::{PaymentGatewayDatabase, PaymentGatewayError, SubscriberApiError, SubscriberManagement};
