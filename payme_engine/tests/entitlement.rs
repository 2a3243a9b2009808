//! The entitlement granter: amount → plan mapping, the sliding extension window, the
//! notification hook, and its strict isolation from the payment state machine.
mod support;

use std::{
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use chrono::{Duration, Utc};
use payme_engine::{
    db_types::{NewPaymeTransaction, SubscriptionTier, TransactionState},
    events::{EventHandlers, EventHooks},
    helpers::now_ms,
    MerchantApiError,
    PaymentGatewayDatabase,
    SubscriberManagement,
};
use pmg_common::Tiyin;
use support::*;

#[tokio::test]
async fn paying_the_pro_price_grants_one_month_from_now() {
    let (api, db) = new_api().await;
    seed_subscriber(&db, "user-g1").await;

    let before = Utc::now();
    api.create_transaction(create_params("g1", 1_700_000_000_000, 4_999_900, "user-g1")).await.unwrap();
    api.perform_transaction(perform_params("g1")).await.unwrap();

    let subscriber = db.fetch_subscriber(&"user-g1".into()).await.unwrap().unwrap();
    assert_eq!(subscriber.subscription_tier, Some(SubscriptionTier::Pro));
    let ends_at = subscriber.subscription_ends_at.unwrap();
    assert!(ends_at > before + Duration::days(27), "window too short: {ends_at}");
    assert!(ends_at < before + Duration::days(32), "window too long: {ends_at}");
}

#[tokio::test]
async fn an_active_subscription_is_extended_not_reset() {
    let (api, db) = new_api().await;
    seed_subscriber(&db, "user-g2").await;
    let current_expiry = Utc::now() + Duration::days(40);
    db.update_subscription("user-g2", SubscriptionTier::Plus, current_expiry).await.unwrap();

    api.create_transaction(create_params("g2", 1_700_000_000_000, 4_999_900, "user-g2")).await.unwrap();
    api.perform_transaction(perform_params("g2")).await.unwrap();

    let subscriber = db.fetch_subscriber(&"user-g2".into()).await.unwrap().unwrap();
    assert_eq!(subscriber.subscription_tier, Some(SubscriptionTier::Pro));
    let ends_at = subscriber.subscription_ends_at.unwrap();
    // the new month rides on top of the remaining 40 days
    assert!(ends_at > current_expiry + Duration::days(27), "extension did not slide: {ends_at}");
}

#[tokio::test]
async fn a_lapsed_subscription_restarts_from_now() {
    let (api, db) = new_api().await;
    seed_subscriber(&db, "user-g3").await;
    let lapsed = Utc::now() - Duration::days(90);
    db.update_subscription("user-g3", SubscriptionTier::Premium, lapsed).await.unwrap();

    let before = Utc::now();
    api.create_transaction(create_params("g3", 1_700_000_000_000, 8_999_900, "user-g3")).await.unwrap();
    api.perform_transaction(perform_params("g3")).await.unwrap();

    let subscriber = db.fetch_subscriber(&"user-g3".into()).await.unwrap().unwrap();
    assert_eq!(subscriber.subscription_tier, Some(SubscriptionTier::Premium));
    let ends_at = subscriber.subscription_ends_at.unwrap();
    assert!(ends_at > before, "lapsed window must restart from now");
    assert!(ends_at < before + Duration::days(32));
}

#[tokio::test]
async fn unknown_amounts_fall_back_to_the_cheapest_plan() {
    let (api, db) = new_api().await;
    seed_subscriber(&db, "user-g4").await;

    // 77 777 UZS matches nothing in the table
    api.create_transaction(create_params("g4", 1_700_000_000_000, 7_777_700, "user-g4")).await.unwrap();
    api.perform_transaction(perform_params("g4")).await.unwrap();

    let subscriber = db.fetch_subscriber(&"user-g4".into()).await.unwrap().unwrap();
    assert_eq!(subscriber.subscription_tier, Some(SubscriptionTier::Plus));
    assert!(subscriber.subscription_ends_at.is_some());
}

#[tokio::test]
async fn a_refund_does_not_revoke_the_entitlement() {
    let (api, db) = new_api().await;
    seed_subscriber(&db, "user-g5").await;

    api.create_transaction(create_params("g5", 1_700_000_000_000, 4_999_900, "user-g5")).await.unwrap();
    api.perform_transaction(perform_params("g5")).await.unwrap();
    let granted = db.fetch_subscriber(&"user-g5".into()).await.unwrap().unwrap();

    let refunded = api.cancel_transaction(cancel_params("g5", 5)).await.unwrap();
    assert_eq!(refunded.state, TransactionState::Refunded);

    let after = db.fetch_subscriber(&"user-g5".into()).await.unwrap().unwrap();
    assert_eq!(after.subscription_tier, granted.subscription_tier);
    assert_eq!(after.subscription_ends_at, granted.subscription_ends_at);
}

#[tokio::test]
async fn a_missing_subscriber_never_fails_the_perform() {
    let (api, db) = new_api().await;

    // seed the pending row directly: the subscriber vanished between create and perform
    let tx = NewPaymeTransaction::new(
        "g6".into(),
        1_700_000_000_000,
        "ghost-user".into(),
        Tiyin::from(4_999_900),
        now_ms(),
    );
    db.insert_transaction(tx).await.unwrap();

    let performed = api.perform_transaction(perform_params("g6")).await.unwrap();
    assert_eq!(performed.state, TransactionState::Completed);

    // the replay still works; the grant failure was swallowed
    let replayed = api.perform_transaction(perform_params("g6")).await.unwrap();
    assert_eq!(replayed, performed);
}

#[tokio::test]
async fn granting_fires_the_notification_hook() {
    let notified = Arc::new(AtomicU64::new(0));
    let counter = notified.clone();
    let mut hooks = EventHooks::default();
    hooks.on_subscription_granted(move |ev| {
        let counter = counter.clone();
        Box::pin(async move {
            assert_eq!(ev.subscriber_id, "user-g7");
            assert_eq!(ev.tier, SubscriptionTier::Pro);
            assert_eq!(ev.months, 1);
            counter.fetch_add(1, Ordering::SeqCst);
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    let handlers = EventHandlers::new(10, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;

    let (api, db) = new_api_with_producers(producers).await;
    seed_subscriber(&db, "user-g7").await;
    api.create_transaction(create_params("g7", 1_700_000_000_000, 4_999_900, "user-g7")).await.unwrap();
    api.perform_transaction(perform_params("g7")).await.unwrap();

    tokio::time::sleep(tokio::time::Duration::from_millis(250)).await;
    assert_eq!(notified.load(Ordering::SeqCst), 1);

    // the replayed perform grants nothing further
    api.perform_transaction(perform_params("g7")).await.unwrap();
    tokio::time::sleep(tokio::time::Duration::from_millis(250)).await;
    assert_eq!(notified.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn the_sandbox_never_reaches_the_granter() {
    let notified = Arc::new(AtomicU64::new(0));
    let counter = notified.clone();
    let mut hooks = EventHooks::default();
    hooks.on_subscription_granted(move |_ev| {
        let counter = counter.clone();
        Box::pin(async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    let handlers = EventHandlers::new(10, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;

    let (api, _db) = new_api_with_producers(producers).await;
    api.create_transaction(create_params(
        "sbx-g",
        1_700_000_000_000,
        4_999_900,
        payme_engine::sandbox::SANDBOX_ORDER_REF,
    ))
    .await
    .unwrap();
    api.perform_transaction(perform_params("sbx-g")).await.unwrap();

    tokio::time::sleep(tokio::time::Duration::from_millis(250)).await;
    assert_eq!(notified.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn an_unpriced_amount_is_rejected_nowhere() {
    let (api, db) = new_api().await;
    seed_subscriber(&db, "user-g8").await;

    // the engine deliberately trusts the provider-supplied amount; only positivity is checked
    let err = api.check_perform_transaction(check_params(-500, "user-g8")).await.unwrap_err();
    assert!(matches!(err, MerchantApiError::InvalidAmount), "got {err:?}");
    let allowed = api.check_perform_transaction(check_params(123_456_789, "user-g8")).await.unwrap();
    assert!(allowed.allow);
}
