use common::{
    error::{AppError, Res},
    identity::Role,
};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    dtos::user::UserCreateRequest,
    models::user::{AuthCredentials, User},
};

const USER_COLUMNS: &str = "id, email, role, api_key, created_at, updated_at";

pub async fn exists_user_by_email<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    email: &str,
) -> Res<bool> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
        .bind(email)
        .fetch_one(executor)
        .await
        .map_err(AppError::from)
}

pub async fn exists_user_by_role<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    role: Role,
) -> Res<bool> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE role = $1)")
        .bind(role)
        .fetch_one(executor)
        .await
        .map_err(AppError::from)
}

pub async fn get_user_by_id<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: Uuid,
) -> Res<User> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(user_id)
        .fetch_one(executor)
        .await
        .map_err(AppError::from)
}

pub async fn get_user_by_api_key<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    api_key: &str,
) -> Res<User> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE api_key = $1"
    ))
    .bind(api_key)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

pub async fn insert_user<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    data: UserCreateRequest,
) -> Res<User> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (email, password_hash, role)
        VALUES ($1, $2, $3)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(data.email)
    .bind(data.password_hash)
    .bind(data.role)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

/// Stores `api_key` only if the user has none yet and returns the key now on record.
/// Concurrent callers therefore all observe the same key.
pub async fn set_api_key_if_absent<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: Uuid,
    api_key: &str,
) -> Res<String> {
    sqlx::query_scalar(
        r#"
        WITH updated AS (
            UPDATE users SET api_key = $2, updated_at = NOW()
            WHERE id = $1 AND api_key IS NULL
            RETURNING api_key
        )
        SELECT api_key FROM updated
        UNION ALL
        SELECT api_key FROM users WHERE id = $1 AND api_key IS NOT NULL
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .bind(api_key)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

#[derive(sqlx::FromRow)]
struct UserWithHash {
    #[sqlx(flatten)]
    user: User,
    password_hash: String,
}

/// Looks up a user of the given role together with the stored password hash.
pub async fn get_user_with_password_hash<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    email: &str,
    role: Role,
) -> Res<Option<(User, AuthCredentials)>> {
    let record = sqlx::query_as::<_, UserWithHash>(&format!(
        "SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = $1 AND role = $2"
    ))
    .bind(email)
    .bind(role)
    .fetch_optional(executor)
    .await
    .map_err(AppError::from)?;

    Ok(record.map(|record| {
        let credentials = AuthCredentials {
            user_id: record.user.id,
            password_hash: record.password_hash,
        };
        (record.user, credentials)
    }))
}
