use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordVerifier},
};
use common::{
    error::{AppError, Res},
    identity::Role,
};
use db::models::user::{AuthCredentials, User};
use sqlx::PgPool;

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid credentials".to_string())
}

/// Checks a password against the stored record.
///
/// A missing user, a user of another role (filtered out by the lookup) and
/// a wrong password all produce the same error.
pub fn verify_credentials(record: Option<(User, AuthCredentials)>, password: &str) -> Res<User> {
    let (user, credentials) = record.ok_or_else(invalid_credentials)?;

    let parsed_hash = PasswordHash::new(&credentials.password_hash).map_err(|e| {
        log::error!("Stored password hash for user {} is unreadable: {}", user.id, e);
        invalid_credentials()
    })?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| invalid_credentials())?;
    Ok(user)
}

/// Authenticates a user of the expected role by email and password.
pub async fn authenticate(pool: &PgPool, email: &str, password: &str, role: Role) -> Res<User> {
    let record = db::user::get_user_with_password_hash(pool, email.trim(), role).await?;
    let user = verify_credentials(record, password);
    if user.is_err() {
        log::info!("Failed {} login for {}", role.as_str(), email.trim());
    }
    user
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::user::hash_password;
    use chrono::Utc;
    use uuid::Uuid;

    fn record(password: &str) -> Option<(User, AuthCredentials)> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        Some((
            User {
                id,
                email: "ada@example.com".to_string(),
                role: Role::Customer,
                api_key: None,
                created_at: now,
                updated_at: now,
            },
            AuthCredentials {
                user_id: id,
                password_hash: hash_password(password).unwrap(),
            },
        ))
    }

    #[test]
    fn correct_password_returns_user() {
        let user = verify_credentials(record("secret1"), "secret1").unwrap();
        assert_eq!(user.email, "ada@example.com");
    }

    #[test]
    fn unknown_user_and_wrong_password_are_indistinguishable() {
        let unknown = verify_credentials(None, "secret1").unwrap_err();
        let wrong = verify_credentials(record("secret1"), "secret2").unwrap_err();

        assert_eq!(unknown.to_string(), wrong.to_string());
        assert_eq!(unknown.status_code(), wrong.status_code());
        assert!(matches!(unknown, AppError::Unauthorized(_)));
    }

    #[test]
    fn corrupt_hash_is_rejected_not_panicking() {
        let mut record = record("secret1");
        if let Some((_, credentials)) = record.as_mut() {
            credentials.password_hash = "not-a-phc-string".to_string();
        }
        assert!(matches!(
            verify_credentials(record, "secret1"),
            Err(AppError::Unauthorized(_))
        ));
    }
}
