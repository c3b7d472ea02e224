//! API key issuance against a real database (`cargo test -p api_keys -- --ignored`).

use api_keys::service::key::{issue_api_key, resolve_api_key};
use common::{error::AppError, identity::Role, key::ApiKey};
use db::{dtos::user::UserCreateRequest, models::user::User};
use sqlx::PgPool;

async fn customer_user(pool: &PgPool) -> User {
    db::user::insert_user(
        pool,
        UserCreateRequest {
            email: "sdk@example.com".to_string(),
            password_hash: "not-a-real-hash".to_string(),
            role: Role::Customer,
        },
    )
    .await
    .unwrap()
}

#[sqlx::test(migrations = "../db/migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn repeated_issuance_returns_the_same_key(pool: PgPool) {
    let user = customer_user(&pool).await;

    let first = issue_api_key(&pool, &user).await.unwrap();
    let second = issue_api_key(&pool, &user).await.unwrap();
    assert_eq!(first, second);
    assert!(first.starts_with("sk-sdk-"));

    let reloaded = db::user::get_user_by_id(&pool, user.id).await.unwrap();
    assert_eq!(reloaded.api_key.as_deref(), Some(first.as_str()));
}

#[sqlx::test(migrations = "../db/migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn concurrent_first_logins_converge(pool: PgPool) {
    let user = customer_user(&pool).await;

    let (a, b) = tokio::join!(issue_api_key(&pool, &user), issue_api_key(&pool, &user));
    assert_eq!(a.unwrap(), b.unwrap());
}

#[sqlx::test(migrations = "../db/migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn issued_key_resolves_to_its_owner(pool: PgPool) {
    let user = customer_user(&pool).await;
    let key = issue_api_key(&pool, &user).await.unwrap();

    let identity = resolve_api_key(&pool, &ApiKey::parse(&key).unwrap())
        .await
        .unwrap();
    assert_eq!(identity.user_id, user.id);
    assert_eq!(identity.role, Role::Customer);

    let err = resolve_api_key(&pool, &ApiKey::generate()).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
}
