//! The single-shot rule: at most one pending transaction per order, regardless of which
//! provider transaction ids are in flight.
mod support;

use payme_engine::{db_types::TransactionState, MerchantApiError};
use support::*;

#[tokio::test]
async fn second_create_for_same_order_is_busy() {
    let (api, db) = new_api().await;
    seed_subscriber(&db, "user-a").await;

    api.create_transaction(create_params("first", 1_700_000_000_000, 3_499_900, "user-a")).await.unwrap();
    let err = api.create_transaction(create_params("second", 1_700_000_001_000, 3_499_900, "user-a")).await.unwrap_err();
    assert!(matches!(err, MerchantApiError::OrderBusy(_)), "got {err:?}");
    assert_eq!(err.code(), -31050);

    // the rejected id was never stored
    let err = api.check_transaction(check_tx_params("second")).await.unwrap_err();
    assert!(matches!(err, MerchantApiError::TransactionNotFound(_)), "got {err:?}");
}

#[tokio::test]
async fn other_orders_are_unaffected() {
    let (api, db) = new_api().await;
    seed_subscriber(&db, "user-a").await;
    seed_subscriber(&db, "user-b").await;

    api.create_transaction(create_params("t-a", 1_700_000_000_000, 3_499_900, "user-a")).await.unwrap();
    let other = api.create_transaction(create_params("t-b", 1_700_000_000_000, 4_999_900, "user-b")).await.unwrap();
    assert_eq!(other.state, TransactionState::Created);
}

#[tokio::test]
async fn cancelling_the_pending_transaction_frees_the_order() {
    let (api, db) = new_api().await;
    seed_subscriber(&db, "user-c").await;

    api.create_transaction(create_params("c1", 1_700_000_000_000, 3_499_900, "user-c")).await.unwrap();
    let err = api.create_transaction(create_params("c2", 1_700_000_001_000, 3_499_900, "user-c")).await.unwrap_err();
    assert!(matches!(err, MerchantApiError::OrderBusy(_)), "got {err:?}");

    api.cancel_transaction(cancel_params("c1", 3)).await.unwrap();
    let freed = api.create_transaction(create_params("c2", 1_700_000_002_000, 3_499_900, "user-c")).await.unwrap();
    assert_eq!(freed.state, TransactionState::Created);
}

#[tokio::test]
async fn completing_the_pending_transaction_frees_the_order() {
    let (api, db) = new_api().await;
    seed_subscriber(&db, "user-d").await;

    api.create_transaction(create_params("d1", 1_700_000_000_000, 3_499_900, "user-d")).await.unwrap();
    api.perform_transaction(perform_params("d1")).await.unwrap();

    // only pending transactions block the order; a completed one does not
    let next = api.create_transaction(create_params("d2", 1_700_000_003_000, 3_499_900, "user-d")).await.unwrap();
    assert_eq!(next.state, TransactionState::Created);
}

#[tokio::test]
async fn replaying_the_pending_create_is_not_busy() {
    let (api, db) = new_api().await;
    seed_subscriber(&db, "user-e").await;

    let first = api.create_transaction(create_params("e1", 1_700_000_000_000, 3_499_900, "user-e")).await.unwrap();
    // the same id replays; only *different* ids for the same order are busy
    let replay = api.create_transaction(create_params("e1", 1_700_000_000_000, 3_499_900, "user-e")).await.unwrap();
    assert_eq!(first, replay);
}
