use chrono::{DateTime, Utc};
use common::{
    error::{AppError, Res},
    status::SubscriptionStatus,
};
use sqlx::{Executor, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    dtos::subscription::{HistoryQuery, SubscriptionCreateRequest, SubscriptionFilter},
    models::subscription::{Subscription, SubscriptionView},
};

const VIEW_SELECT: &str = r#"
    SELECT s.*,
           p.sku AS pack_sku,
           p.name AS pack_name,
           p.price AS pack_price,
           p.validity_months AS pack_validity_months,
           c.name AS customer_name
    FROM subscriptions s
    JOIN subscription_packs p ON p.id = s.pack_id
    JOIN customers c ON c.id = s.customer_id
"#;

pub async fn insert_subscription<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    data: SubscriptionCreateRequest,
    requested_at: DateTime<Utc>,
) -> Res<Subscription> {
    sqlx::query_as::<_, Subscription>(
        r#"
        INSERT INTO subscriptions (customer_id, pack_id, status, requested_at)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(data.customer_id)
    .bind(data.pack_id)
    .bind(SubscriptionStatus::Requested)
    .bind(requested_at)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

pub async fn get_subscription_by_id<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    subscription_id: Uuid,
) -> Res<Subscription> {
    sqlx::query_as::<_, Subscription>("SELECT * FROM subscriptions WHERE id = $1")
        .bind(subscription_id)
        .fetch_one(executor)
        .await
        .map_err(AppError::from)
}

/// Same as [`get_subscription_by_id`] but holds a row lock until the transaction ends.
pub async fn lock_subscription<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    subscription_id: Uuid,
) -> Res<Subscription> {
    sqlx::query_as::<_, Subscription>("SELECT * FROM subscriptions WHERE id = $1 FOR UPDATE")
        .bind(subscription_id)
        .fetch_one(executor)
        .await
        .map_err(AppError::from)
}

pub async fn get_subscription_view<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    subscription_id: Uuid,
) -> Res<SubscriptionView> {
    sqlx::query_as::<_, SubscriptionView>(&format!("{VIEW_SELECT} WHERE s.id = $1"))
        .bind(subscription_id)
        .fetch_one(executor)
        .await
        .map_err(AppError::from)
}

/// The customer's active subscription whose expiry is still ahead, if any.
pub async fn get_current_subscription_view<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    customer_id: Uuid,
) -> Res<Option<SubscriptionView>> {
    sqlx::query_as::<_, SubscriptionView>(&format!(
        "{VIEW_SELECT} WHERE s.customer_id = $1 AND s.status = $2 AND s.expires_at > NOW()"
    ))
    .bind(customer_id)
    .bind(SubscriptionStatus::Active)
    .fetch_optional(executor)
    .await
    .map_err(AppError::from)
}

/// Locks the customer's unexpired `active` row, if any.
pub async fn lock_current_subscription<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    customer_id: Uuid,
) -> Res<Option<Subscription>> {
    sqlx::query_as::<_, Subscription>(
        r#"
        SELECT * FROM subscriptions
        WHERE customer_id = $1 AND status = $2 AND expires_at > NOW()
        FOR UPDATE
        "#,
    )
    .bind(customer_id)
    .bind(SubscriptionStatus::Active)
    .fetch_optional(executor)
    .await
    .map_err(AppError::from)
}

/// Whether the customer holds an `active` row other than `exclude`.
pub async fn has_active_subscription<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    customer_id: Uuid,
    exclude: Option<Uuid>,
) -> Res<bool> {
    sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM subscriptions
            WHERE customer_id = $1 AND status = $2 AND ($3::uuid IS NULL OR id <> $3)
        )
        "#,
    )
    .bind(customer_id)
    .bind(SubscriptionStatus::Active)
    .bind(exclude)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

/// Writes the lifecycle columns of `subscription` back to its row.
pub async fn save_subscription<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    subscription: &Subscription,
) -> Res<Subscription> {
    sqlx::query_as::<_, Subscription>(
        r#"
        UPDATE subscriptions
        SET status = $2,
            requested_at = $3,
            approved_at = $4,
            assigned_at = $5,
            expires_at = $6,
            deactivated_at = $7,
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(subscription.id)
    .bind(subscription.status)
    .bind(subscription.requested_at)
    .bind(subscription.approved_at)
    .bind(subscription.assigned_at)
    .bind(subscription.expires_at)
    .bind(subscription.deactivated_at)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

/// Hard delete. Returns the number of removed rows.
pub async fn delete_subscription<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    subscription_id: Uuid,
) -> Res<u64> {
    sqlx::query("DELETE FROM subscriptions WHERE id = $1")
        .bind(subscription_id)
        .execute(executor)
        .await
        .map(|res| res.rows_affected())
        .map_err(AppError::from)
}

/// Moves every `active` row whose expiry has passed to `expired`.
pub async fn expire_due_subscriptions<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
) -> Res<u64> {
    sqlx::query(
        r#"
        UPDATE subscriptions SET status = $1, updated_at = NOW()
        WHERE status = $2 AND expires_at <= NOW()
        "#,
    )
    .bind(SubscriptionStatus::Expired)
    .bind(SubscriptionStatus::Active)
    .execute(executor)
    .await
    .map(|res| res.rows_affected())
    .map_err(AppError::from)
}

/// [`expire_due_subscriptions`] restricted to one customer.
pub async fn expire_due_for_customer<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    customer_id: Uuid,
) -> Res<u64> {
    sqlx::query(
        r#"
        UPDATE subscriptions SET status = $1, updated_at = NOW()
        WHERE customer_id = $3 AND status = $2 AND expires_at <= NOW()
        "#,
    )
    .bind(SubscriptionStatus::Expired)
    .bind(SubscriptionStatus::Active)
    .bind(customer_id)
    .execute(executor)
    .await
    .map(|res| res.rows_affected())
    .map_err(AppError::from)
}

fn push_filter_conditions(qb: &mut QueryBuilder<'_, Postgres>, filter: &SubscriptionFilter) {
    qb.push(" WHERE TRUE");
    if let Some(status) = filter.status {
        qb.push(" AND s.status = ").push_bind(status);
    }
    if let Some(customer_id) = filter.customer_id {
        qb.push(" AND s.customer_id = ").push_bind(customer_id);
    }
}

pub async fn list_subscriptions<'e, E>(
    executor: E,
    filter: &SubscriptionFilter,
) -> Res<Vec<SubscriptionView>>
where
    E: Executor<'e, Database = Postgres>,
{
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(VIEW_SELECT);
    push_filter_conditions(&mut qb, filter);
    qb.push(" ORDER BY s.created_at DESC LIMIT ")
        .push_bind(filter.limit)
        .push(" OFFSET ")
        .push_bind(filter.offset);

    qb.build_query_as::<SubscriptionView>()
        .fetch_all(executor)
        .await
        .map_err(AppError::from)
}

pub async fn count_subscriptions<'e, E>(executor: E, filter: &SubscriptionFilter) -> Res<i64>
where
    E: Executor<'e, Database = Postgres>,
{
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM subscriptions s");
    push_filter_conditions(&mut qb, filter);

    qb.build_query_scalar::<i64>()
        .fetch_one(executor)
        .await
        .map_err(AppError::from)
}

pub async fn get_subscription_history<'e, E>(
    executor: E,
    query: &HistoryQuery,
) -> Res<Vec<SubscriptionView>>
where
    E: Executor<'e, Database = Postgres>,
{
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(VIEW_SELECT);
    qb.push(" WHERE s.customer_id = ").push_bind(query.customer_id);
    // column and keyword come from closed enums, never from raw input
    qb.push(format!(
        " ORDER BY {} {}, s.id LIMIT ",
        query.sort.column(),
        query.order.keyword()
    ))
    .push_bind(query.limit)
    .push(" OFFSET ")
    .push_bind(query.offset);

    qb.build_query_as::<SubscriptionView>()
        .fetch_all(executor)
        .await
        .map_err(AppError::from)
}

pub async fn count_customer_subscriptions<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    customer_id: Uuid,
) -> Res<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM subscriptions WHERE customer_id = $1")
        .bind(customer_id)
        .fetch_one(executor)
        .await
        .map_err(AppError::from)
}
