use common::{
    error::{AppError, Res},
    identity::{Identity, Role},
    key::ApiKey,
};
use db::models::user::User;
use sqlx::PgPool;

use crate::dtos::key::SdkLoginResponse;

/// Returns the user's API key, generating and storing one on first use.
///
/// The store only accepts a key while the user has none, so concurrent first
/// logins all end up with whichever key was written first.
pub async fn issue_api_key(pool: &PgPool, user: &User) -> Res<String> {
    if let Some(existing) = user.api_key.as_ref().filter(|key| !key.is_empty()) {
        return Ok(existing.clone());
    }

    let candidate = ApiKey::generate();
    match db::user::set_api_key_if_absent(pool, user.id, candidate.as_str()).await {
        Ok(key) => {
            if key == candidate.as_str() {
                log::info!("Issued API key for user {}", user.id);
            }
            Ok(key)
        }
        // the row was updated by a concurrent login between our two reads
        Err(AppError::Database(sqlx::Error::RowNotFound)) => {
            db::user::get_user_by_id(pool, user.id)
                .await?
                .api_key
                .ok_or_else(|| AppError::Internal("API key was not stored".to_string()))
        }
        Err(e) => Err(e),
    }
}

/// Authenticates a customer for the SDK and hands out their API key.
pub async fn sdk_login(pool: &PgPool, email: &str, password: &str) -> Res<SdkLoginResponse> {
    let user = api_auth::services::auth::authenticate(pool, email, password, Role::Customer).await?;

    // a soft-deleted profile closes the account
    db::customer::get_customer_by_user_id(pool, user.id)
        .await
        .map_err(|e| match e {
            AppError::Database(sqlx::Error::RowNotFound) => {
                AppError::Unauthorized("Invalid credentials".to_string())
            }
            other => other,
        })?;

    let api_key = issue_api_key(pool, &user).await?;
    Ok(SdkLoginResponse { api_key, user })
}

/// Maps a presented API key to the identity of its owner.
pub async fn resolve_api_key(pool: &PgPool, key: &ApiKey) -> Res<Identity> {
    let user = db::user::get_user_by_api_key(pool, key.as_str())
        .await
        .map_err(|e| match e {
            AppError::Database(sqlx::Error::RowNotFound) => {
                AppError::Unauthorized("Invalid API key".to_string())
            }
            other => other,
        })?;
    Ok(user.identity())
}
