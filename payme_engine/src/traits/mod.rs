//! # Database management and control.
//!
//! This module defines the interface contracts of the engine's storage *backends*.
//!
//! ## Transactions
//! A transaction row tracks one provider-issued payment attempt against an order. The
//! [`PaymentGatewayDatabase`] trait provides the row store and the atomic state transitions the
//! RPC handlers are built on. Every mutating call is an atomic read-modify-write keyed by the
//! provider transaction id, so concurrent webhook retries can never double-apply a transition.
//!
//! ## Subscribers
//! The [`SubscriberManagement`] trait covers the beneficiary side: resolving an order reference
//! to a subscriber record, and extending the subscription window after a captured payment.
mod payment_gateway_database;
mod subscriber_management;

pub use payment_gateway_database::{PaymentGatewayDatabase, PaymentGatewayError};
pub use subscriber_management::{SubscriberApiError, SubscriberManagement};
