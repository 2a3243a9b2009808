//! The certification sandbox bypass: synthetic order reference, the invalid-amount probe,
//! replayed pending rows, and isolation from real subscriber data.
mod support;

use payme_engine::{
    db_types::TransactionState,
    sandbox::{SANDBOX_INVALID_AMOUNT, SANDBOX_ORDER_REF},
    MerchantApiError,
    PaymentGatewayDatabase,
    SubscriberManagement,
};
use support::*;

#[tokio::test]
async fn sandbox_check_needs_no_subscriber() {
    let (api, _db) = new_api().await;

    // nothing has been seeded; a real order would fail resolution here
    let allowed = api.check_perform_transaction(check_params(4_999_900, SANDBOX_ORDER_REF)).await.unwrap();
    assert!(allowed.allow);
}

#[tokio::test]
async fn the_invalid_amount_probe_always_fails() {
    let (api, _db) = new_api().await;

    let err =
        api.check_perform_transaction(check_params(SANDBOX_INVALID_AMOUNT.value(), SANDBOX_ORDER_REF)).await.unwrap_err();
    assert!(matches!(err, MerchantApiError::InvalidAmount), "got {err:?}");
    assert_eq!(err.code(), -31001);

    let err = api
        .create_transaction(create_params("sbx-bad", 1_700_000_000_000, SANDBOX_INVALID_AMOUNT.value(), SANDBOX_ORDER_REF))
        .await
        .unwrap_err();
    assert!(matches!(err, MerchantApiError::InvalidAmount), "got {err:?}");
}

#[tokio::test]
async fn sandbox_orders_may_hold_concurrent_pending_transactions() {
    let (api, _db) = new_api().await;

    // the certification suite replays creates against the one synthetic order; the single-shot
    // rule must not get in its way
    for (txid, time) in [("sbx-1", 1_000), ("sbx-2", 2_000), ("sbx-3", 3_000)] {
        let created =
            api.create_transaction(create_params(txid, time, 4_999_900, SANDBOX_ORDER_REF)).await.unwrap();
        assert_eq!(created.state, TransactionState::Created);
    }
}

#[tokio::test]
async fn sandbox_perform_skips_the_entitlement_grant() {
    let (api, db) = new_api().await;

    api.create_transaction(create_params("sbx-p", 1_700_000_000_000, 4_999_900, SANDBOX_ORDER_REF)).await.unwrap();
    let performed = api.perform_transaction(perform_params("sbx-p")).await.unwrap();
    assert_eq!(performed.state, TransactionState::Completed);

    // the row is flagged, and no subscriber record was conjured up for the synthetic order
    let row = db.fetch_transaction(&"sbx-p".into()).await.unwrap().unwrap();
    assert!(row.sandbox);
    let subscriber = db.fetch_subscriber(&SANDBOX_ORDER_REF.into()).await.unwrap();
    assert!(subscriber.is_none());
}

#[tokio::test]
async fn real_orders_still_obey_the_single_shot_rule_alongside_sandbox_rows() {
    let (api, db) = new_api().await;
    seed_subscriber(&db, "user-real").await;

    api.create_transaction(create_params("sbx-x", 1_000, 4_999_900, SANDBOX_ORDER_REF)).await.unwrap();
    api.create_transaction(create_params("real-1", 2_000, 4_999_900, "user-real")).await.unwrap();
    let err = api.create_transaction(create_params("real-2", 3_000, 4_999_900, "user-real")).await.unwrap_err();
    assert!(matches!(err, MerchantApiError::OrderBusy(_)), "got {err:?}");
}
