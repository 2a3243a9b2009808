use chrono::{DateTime, Utc};
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewSubscriber, OrderRef, Subscriber, SubscriptionTier},
    traits::SubscriberApiError,
};

/// Resolves an order reference to a subscriber row. The reference is the subscriber id itself;
/// an unknown reference simply returns `None`.
pub async fn fetch_subscriber(
    order_ref: &OrderRef,
    conn: &mut SqliteConnection,
) -> Result<Option<Subscriber>, sqlx::Error> {
    let subscriber = sqlx::query_as("SELECT * FROM subscribers WHERE id = $1")
        .bind(order_ref.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(subscriber)
}

/// Inserts the subscriber, returning the existing row instead if the id is already taken.
pub async fn idempotent_insert(
    subscriber: NewSubscriber,
    conn: &mut SqliteConnection,
) -> Result<Subscriber, SubscriberApiError> {
    if let Some(existing) = fetch_subscriber(&OrderRef::from(subscriber.id.clone()), conn).await? {
        return Ok(existing);
    }
    let row = sqlx::query_as(
        r#"
            INSERT INTO subscribers (id, telegram_id, language)
            VALUES ($1, $2, $3)
            RETURNING *;
        "#,
    )
    .bind(subscriber.id)
    .bind(subscriber.telegram_id)
    .bind(subscriber.language)
    .fetch_one(conn)
    .await?;
    let row: Subscriber = row;
    debug!("🗃️ Subscriber {} inserted", row.id);
    Ok(row)
}

/// Sets the tier and subscription expiry for the given subscriber.
pub async fn update_subscription(
    subscriber_id: &str,
    tier: SubscriptionTier,
    expires_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Subscriber, SubscriberApiError> {
    let result: Option<Subscriber> = sqlx::query_as(
        "UPDATE subscribers SET subscription_tier = $2, subscription_ends_at = $3, updated_at = CURRENT_TIMESTAMP \
         WHERE id = $1 RETURNING *",
    )
    .bind(subscriber_id)
    .bind(tier)
    .bind(expires_at)
    .fetch_optional(conn)
    .await?;
    result.ok_or_else(|| SubscriberApiError::SubscriberNotFound(subscriber_id.to_string()))
}
