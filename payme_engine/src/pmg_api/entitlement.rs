use std::fmt::Debug;

use chrono::{Months, Utc};
use log::*;
use pmg_common::Tiyin;

use crate::{
    db_types::OrderRef,
    events::{EventProducers, SubscriptionGrantedEvent},
    pricing,
    traits::SubscriberManagement,
};

/// The entitlement granter: maps a captured amount onto a subscription plan and extends the
/// beneficiary's access window.
///
/// Granting runs *after* the payment transition has committed, and must never fail the
/// enclosing perform call: by the time it runs the money has been captured, so every failure
/// here is a reconciliation concern, not a protocol error. Accordingly [`Self::grant`] is
/// infallible and reports problems through the log only.
pub struct EntitlementApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for EntitlementApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EntitlementApi")
    }
}

impl<B> EntitlementApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> EntitlementApi<B>
where B: SubscriberManagement
{
    /// Extends the subscription paid for by `amount` on the order `order_ref`.
    ///
    /// The new window slides: it starts from the current expiry if that is still in the
    /// future, from now otherwise. A `SubscriptionGrantedEvent` is published afterwards so the
    /// surrounding service can notify the subscriber; publishing is best-effort.
    pub async fn grant(&self, order_ref: &OrderRef, amount: Tiyin) {
        let subscriber = match self.db.fetch_subscriber(order_ref).await {
            Ok(Some(subscriber)) => subscriber,
            Ok(None) => {
                error!(
                    "💳️ Cannot grant entitlement: no subscriber matches order {order_ref} after payment. The money \
                     was captured; this needs manual reconciliation."
                );
                return;
            },
            Err(e) => {
                error!("💳️ Entitlement grant failed while resolving order {order_ref}: {e}");
                return;
            },
        };
        let plan = match pricing::plan_for_amount(amount) {
            Some(plan) => plan,
            None => {
                let fallback = pricing::fallback_plan();
                warn!(
                    "💳️ No plan matches the captured amount {amount} for subscriber {}. Falling back to {} for {} \
                     month(s).",
                    subscriber.id, fallback.tier, fallback.months
                );
                fallback
            },
        };
        let now = Utc::now();
        let base = subscriber.subscription_ends_at.filter(|expiry| *expiry > now).unwrap_or(now);
        let expires_at = match base.checked_add_months(Months::new(plan.months)) {
            Some(t) => t,
            None => {
                error!("💳️ Subscription expiry for {} overflowed the calendar. Skipping the grant.", subscriber.id);
                return;
            },
        };
        match self.db.update_subscription(&subscriber.id, plan.tier, expires_at).await {
            Ok(updated) => {
                info!(
                    "💳️ Granted {} ({} month(s)) to subscriber {}. Access until {expires_at}.",
                    plan.tier, plan.months, updated.id
                );
                let event = SubscriptionGrantedEvent {
                    subscriber_id: updated.id,
                    tier: plan.tier,
                    months: plan.months,
                    expires_at,
                };
                for emitter in &self.producers.subscription_granted_producer {
                    emitter.publish_event(event.clone()).await;
                }
            },
            Err(e) => {
                error!(
                    "💳️ Failed to extend the subscription for {}: {e}. The money was captured; this needs manual \
                     reconciliation.",
                    subscriber.id
                );
            },
        }
    }
}
