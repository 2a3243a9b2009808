#![allow(dead_code)]
use payme_engine::{
    db_types::NewSubscriber,
    events::EventProducers,
    rpc_objects::{CancelParams, CheckParams, CheckPerformParams, CreateParams, PerformParams},
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    MerchantApi,
    SqliteDatabase,
    SubscriberManagement,
};
use pmg_common::Tiyin;
use serde_json::json;

pub async fn new_api() -> (MerchantApi<SqliteDatabase>, SqliteDatabase) {
    new_api_with_producers(EventProducers::default()).await
}

pub async fn new_api_with_producers(producers: EventProducers) -> (MerchantApi<SqliteDatabase>, SqliteDatabase) {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    (MerchantApi::new(db.clone(), producers), db)
}

pub async fn seed_subscriber(db: &SqliteDatabase, id: &str) {
    db.insert_subscriber(NewSubscriber::new(id).with_telegram_id(1_000_001)).await.expect("Error seeding subscriber");
}

pub fn check_params(amount: i64, order_ref: &str) -> CheckPerformParams {
    CheckPerformParams { amount: Tiyin::from(amount), account: json!({ "order_id": order_ref }) }
}

pub fn create_params(id: &str, time: i64, amount: i64, order_ref: &str) -> CreateParams {
    CreateParams {
        id: id.into(),
        time,
        amount: Tiyin::from(amount),
        account: json!({ "order_id": order_ref }),
    }
}

pub fn perform_params(id: &str) -> PerformParams {
    PerformParams { id: id.into() }
}

pub fn cancel_params(id: &str, reason: i64) -> CancelParams {
    CancelParams { id: id.into(), reason }
}

pub fn check_tx_params(id: &str) -> CheckParams {
    CheckParams { id: id.into() }
}
