//! Lifecycle operations against a real database.
//!
//! Run with `DATABASE_URL` pointing at a Postgres server the tests may create
//! databases on: `cargo test -p api_subs -- --ignored`.

use std::str::FromStr;

use api_subs::services::sub;
use bigdecimal::BigDecimal;
use common::{error::AppError, identity::Role, status::SubscriptionStatus};
use db::dtos::{
    customer::CustomerCreateRequest, pack::PackCreateRequest, user::UserCreateRequest,
};
use sqlx::PgPool;
use uuid::Uuid;

async fn create_customer(pool: &PgPool, email: &str) -> Uuid {
    let user = db::user::insert_user(
        pool,
        UserCreateRequest {
            email: email.to_string(),
            password_hash: "not-a-real-hash".to_string(),
            role: Role::Customer,
        },
    )
    .await
    .unwrap();
    db::customer::insert_customer(
        pool,
        CustomerCreateRequest {
            user_id: user.id,
            name: "Test Customer".to_string(),
            phone: String::new(),
        },
    )
    .await
    .unwrap()
    .id
}

async fn create_pack(pool: &PgPool, sku: &str, validity_months: i32) {
    db::pack::insert_pack(
        pool,
        PackCreateRequest {
            name: format!("Pack {sku}"),
            description: String::new(),
            sku: sku.to_string(),
            price: BigDecimal::from_str("19.90").unwrap(),
            validity_months,
        },
    )
    .await
    .unwrap();
}

async fn approved(pool: &PgPool, customer_id: Uuid, sku: &str) -> Uuid {
    let requested = sub::request_subscription(pool, customer_id, sku).await.unwrap();
    sub::approve_subscription(pool, requested.subscription.subscription.id)
        .await
        .unwrap();
    requested.subscription.subscription.id
}

async fn active_count(pool: &PgPool, customer_id: Uuid) -> i64 {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM subscriptions WHERE customer_id = $1 AND status = 'active'",
    )
    .bind(customer_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

#[sqlx::test(migrations = "../db/migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn request_approve_assign_deactivate(pool: PgPool) {
    let customer_id = create_customer(&pool, "flow@example.com").await;
    create_pack(&pool, "BASIC-1M", 1).await;

    let id = approved(&pool, customer_id, "BASIC-1M").await;
    let assigned = sub::assign_subscription(&pool, id).await.unwrap();
    assert!(assigned.is_active);
    assert_eq!(assigned.subscription.subscription.status, SubscriptionStatus::Active);

    let current = sub::get_current_subscription(&pool, customer_id).await.unwrap();
    assert_eq!(current.subscription.subscription.id, id);
    assert_eq!(current.subscription.pack_sku, "BASIC-1M");

    let deactivated = sub::deactivate_current(&pool, customer_id).await.unwrap();
    let row = deactivated.subscription.subscription;
    assert_eq!(row.status, SubscriptionStatus::Inactive);
    assert!(row.deactivated_at.is_some());
    assert!(row.approved_at.is_some());
    assert!(row.assigned_at.is_some());

    let err = sub::get_current_subscription(&pool, customer_id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[sqlx::test(migrations = "../db/migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn concurrent_assigns_leave_one_active(pool: PgPool) {
    let customer_id = create_customer(&pool, "race@example.com").await;
    create_pack(&pool, "PRO-1M", 1).await;
    create_pack(&pool, "PRO-12M", 12).await;

    let first = approved(&pool, customer_id, "PRO-1M").await;
    let second = approved(&pool, customer_id, "PRO-12M").await;

    let (a, b) = tokio::join!(
        sub::assign_subscription(&pool, first),
        sub::assign_subscription(&pool, second)
    );

    let outcomes = [a, b];
    let successes = outcomes.iter().filter(|r| r.is_ok()).count();
    let conflicts = outcomes
        .iter()
        .filter(|r| matches!(r, Err(AppError::Conflict(_))))
        .count();
    assert_eq!(successes, 1);
    assert_eq!(conflicts, 1);
    assert_eq!(active_count(&pool, customer_id).await, 1);
}

#[sqlx::test(migrations = "../db/migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn request_conflicts_while_active(pool: PgPool) {
    let customer_id = create_customer(&pool, "busy@example.com").await;
    create_pack(&pool, "BASIC-1M", 1).await;

    let id = approved(&pool, customer_id, "BASIC-1M").await;
    sub::assign_subscription(&pool, id).await.unwrap();

    let err = sub::request_subscription(&pool, customer_id, "BASIC-1M")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[sqlx::test(migrations = "../db/migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn unknown_sku_is_not_found(pool: PgPool) {
    let customer_id = create_customer(&pool, "lost@example.com").await;
    let err = sub::request_subscription(&pool, customer_id, "NOPE")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[sqlx::test(migrations = "../db/migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn lapsed_subscription_expires_and_renews(pool: PgPool) {
    let customer_id = create_customer(&pool, "lapsed@example.com").await;
    create_pack(&pool, "BASIC-1M", 1).await;

    let id = approved(&pool, customer_id, "BASIC-1M").await;
    sub::assign_subscription(&pool, id).await.unwrap();
    sqlx::query("UPDATE subscriptions SET expires_at = NOW() - INTERVAL '1 day' WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .unwrap();

    let stale = sub::get_subscription(&pool, id).await.unwrap();
    assert!(stale.is_expired);
    assert!(!stale.is_active);

    assert_eq!(db::subscription::expire_due_subscriptions(&pool).await.unwrap(), 1);
    // idempotent
    assert_eq!(db::subscription::expire_due_subscriptions(&pool).await.unwrap(), 0);

    let other = create_customer(&pool, "other@example.com").await;
    let err = sub::renew_subscription(&pool, id, Some(other)).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let renewed = sub::renew_subscription(&pool, id, Some(customer_id)).await.unwrap();
    let row = renewed.subscription.subscription;
    assert_eq!(row.status, SubscriptionStatus::Requested);
    assert_eq!(row.expires_at, None);
    assert_eq!(row.approved_at, None);
}

#[sqlx::test(migrations = "../db/migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn stale_active_row_does_not_block_a_new_request(pool: PgPool) {
    let customer_id = create_customer(&pool, "stale@example.com").await;
    create_pack(&pool, "BASIC-1M", 1).await;

    let id = approved(&pool, customer_id, "BASIC-1M").await;
    sub::assign_subscription(&pool, id).await.unwrap();
    sqlx::query("UPDATE subscriptions SET expires_at = NOW() - INTERVAL '1 minute' WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .unwrap();

    let requested = sub::request_subscription(&pool, customer_id, "BASIC-1M")
        .await
        .unwrap();
    assert_eq!(
        requested.subscription.subscription.status,
        SubscriptionStatus::Requested
    );
    let old = db::subscription::get_subscription_by_id(&pool, id).await.unwrap();
    assert_eq!(old.status, SubscriptionStatus::Expired);
}

#[sqlx::test(migrations = "../db/migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn renew_waits_for_concurrent_expiry_pass(pool: PgPool) {
    let customer_id = create_customer(&pool, "race@example.com").await;
    create_pack(&pool, "BASIC-1M", 1).await;

    let id = approved(&pool, customer_id, "BASIC-1M").await;
    sub::assign_subscription(&pool, id).await.unwrap();
    sqlx::query("UPDATE subscriptions SET expires_at = NOW() - INTERVAL '1 minute' WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .unwrap();

    // same opening steps as a request for this customer
    let mut tx = pool.begin().await.unwrap();
    db::customer::lock_customer(&mut *tx, customer_id).await.unwrap();

    let renew_pool = pool.clone();
    let renew = tokio::spawn(async move {
        sub::renew_subscription(&renew_pool, id, Some(customer_id)).await
    });
    tokio::time::sleep(std::time::Duration::from_millis(300)).await;

    let expired = db::subscription::expire_due_for_customer(&mut *tx, customer_id)
        .await
        .unwrap();
    assert_eq!(expired, 1);
    tx.commit().await.unwrap();

    let renewed = renew.await.unwrap().unwrap();
    assert_eq!(
        renewed.subscription.subscription.status,
        SubscriptionStatus::Requested
    );
}

#[sqlx::test(migrations = "../db/migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn history_is_paginated_and_sorted(pool: PgPool) {
    let customer_id = create_customer(&pool, "history@example.com").await;
    create_pack(&pool, "BASIC-1M", 1).await;

    let mut ids = Vec::new();
    for _ in 0..3 {
        let requested = sub::request_subscription(&pool, customer_id, "BASIC-1M")
            .await
            .unwrap();
        ids.push(requested.subscription.subscription.id);
    }

    let params = api_subs::dtos::sub::HistoryParams {
        page: Some(1),
        limit: Some(2),
        sort: Some(db::dtos::subscription::SortField::RequestedAt),
        order: Some(db::dtos::subscription::SortOrder::Asc),
    };
    let page = sub::get_history(&pool, customer_id, &params).await.unwrap();
    assert_eq!(page.pagination.total, 3);
    assert_eq!(page.data.len(), 2);
    assert_eq!(page.data[0].subscription.subscription.id, ids[0]);
    assert_eq!(page.data[1].subscription.subscription.id, ids[1]);
}

#[sqlx::test(migrations = "../db/migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn delete_missing_subscription_is_not_found(pool: PgPool) {
    let err = sub::delete_subscription(&pool, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
