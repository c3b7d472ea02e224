//! Run with `DATABASE_URL` set: `cargo test -p checker -- --ignored`.

use bigdecimal::BigDecimal;
use common::identity::Role;
use db::dtos::{
    customer::CustomerCreateRequest, pack::PackCreateRequest, user::UserCreateRequest,
};
use sqlx::PgPool;
use uuid::Uuid;

async fn seed(pool: &PgPool, email: &str) -> (Uuid, Uuid) {
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
    let customer = db::customer::insert_customer(
        pool,
        CustomerCreateRequest {
            user_id: user.id,
            name: "Sweep".to_string(),
            phone: String::new(),
        },
    )
    .await
    .unwrap();
    let pack = db::pack::insert_pack(
        pool,
        PackCreateRequest {
            name: "Monthly".to_string(),
            description: String::new(),
            sku: format!("SWEEP-{}", Uuid::new_v4()),
            price: BigDecimal::from(10),
            validity_months: 1,
        },
    )
    .await
    .unwrap();
    (customer.id, pack.id)
}

async fn insert_active(
    pool: &PgPool,
    customer_id: Uuid,
    pack_id: Uuid,
    expires_in: &str,
) -> Uuid {
    sqlx::query_scalar(
        r#"
        INSERT INTO subscriptions
            (customer_id, pack_id, status, approved_at, assigned_at, expires_at)
        VALUES
            ($1, $2, 'active', NOW() - INTERVAL '40 days', NOW() - INTERVAL '40 days',
             NOW() + $3::interval)
        RETURNING id
        "#,
    )
    .bind(customer_id)
    .bind(pack_id)
    .bind(expires_in)
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn status_of(pool: &PgPool, id: Uuid) -> String {
    sqlx::query_scalar("SELECT status::text FROM subscriptions WHERE id = $1")
        .bind(id)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[sqlx::test(migrations = "../db/migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn sweep_expires_only_lapsed_rows(pool: PgPool) {
    let (lapsed_customer, pack_id) = seed(&pool, "lapsed@example.com").await;
    let (current_customer, _) = seed(&pool, "current@example.com").await;

    let lapsed = insert_active(&pool, lapsed_customer, pack_id, "-1 day").await;
    let current = insert_active(&pool, current_customer, pack_id, "10 days").await;

    assert_eq!(checker::run_sweep(&pool).await.unwrap(), 1);
    assert_eq!(status_of(&pool, lapsed).await, "expired");
    assert_eq!(status_of(&pool, current).await, "active");

    assert_eq!(checker::run_sweep(&pool).await.unwrap(), 0);
}
