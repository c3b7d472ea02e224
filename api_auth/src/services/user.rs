use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, password_hash::PasswordHasher};
use common::{
    env_config::AdminConfig,
    error::{AppError, Res},
    identity::Role,
};
use db::dtos::{customer::CustomerCreateRequest, user::UserCreateRequest};
use db::models::{customer::Customer, user::User};
use sqlx::PgPool;

pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Everything needed to open a customer account.
#[derive(Debug)]
pub struct NewCustomerAccount {
    pub email: String,
    pub password: String,
    pub name: String,
    pub phone: String,
}

/// Hashes a password with Argon2 and a fresh random salt.
pub fn hash_password(password: &str) -> Res<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// Trims the address and checks it has the `local@domain.tld` shape.
pub fn normalize_email(email: &str) -> Res<String> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(email.to_string())
    } else {
        Err(AppError::BadRequest("Invalid email address".to_string()))
    }
}

pub fn validate_password(password: &str) -> Res<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

/// Creates the user and its customer profile in one transaction.
///
/// Used by self-service signup and by admins creating customers.
pub async fn create_customer_account(
    pool: &PgPool,
    account: NewCustomerAccount,
) -> Res<(User, Customer)> {
    let email = normalize_email(&account.email)?;
    validate_password(&account.password)?;
    let name = account.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("Name is required".to_string()));
    }

    let mut tx = pool.begin().await?;

    // the unique constraint still backs this up for concurrent signups
    if db::user::exists_user_by_email(&mut *tx, &email).await? {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let user = db::user::insert_user(
        &mut *tx,
        UserCreateRequest {
            email,
            password_hash: hash_password(&account.password)?,
            role: Role::Customer,
        },
    )
    .await?;

    let customer = db::customer::insert_customer(
        &mut *tx,
        CustomerCreateRequest {
            user_id: user.id,
            name,
            phone: account.phone.trim().to_string(),
        },
    )
    .await?;

    tx.commit().await?;
    log::info!("Created customer account {} ({})", customer.id, user.email);
    Ok((user, customer))
}

/// Creates the configured admin account when the store has no admin yet.
/// Returns `true` when an account was created.
pub async fn bootstrap_admin(pool: &PgPool, admin: &AdminConfig) -> Res<bool> {
    if db::user::exists_user_by_role(pool, Role::Admin).await? {
        return Ok(false);
    }
    let Some(password) = admin.password.as_deref() else {
        log::warn!("No admin account exists and ADMIN_PASSWORD is not set, skipping bootstrap");
        return Ok(false);
    };

    let email = normalize_email(&admin.email)?;
    validate_password(password)?;
    let user = db::user::insert_user(
        pool,
        UserCreateRequest {
            email,
            password_hash: hash_password(password)?,
            role: Role::Admin,
        },
    )
    .await?;

    log::info!("Bootstrapped admin account {}", user.email);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::{PasswordHash, PasswordVerifier};

    #[test]
    fn hashes_are_salted_and_verifiable() {
        let a = hash_password("hunter22").unwrap();
        let b = hash_password("hunter22").unwrap();
        assert_ne!(a, b);

        let parsed = PasswordHash::new(&a).unwrap();
        assert!(
            Argon2::default()
                .verify_password(b"hunter22", &parsed)
                .is_ok()
        );
        assert!(Argon2::default().verify_password(b"hunter23", &parsed).is_err());
    }

    #[test]
    fn email_shape_is_checked() {
        assert_eq!(
            normalize_email("  ada@example.com ").unwrap(),
            "ada@example.com"
        );
        for bad in [
            "",
            "ada",
            "@example.com",
            "ada@",
            "ada@example",
            "a da@example.com",
            "a@b@c.io",
            "ada@example.",
        ] {
            assert!(normalize_email(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn short_passwords_are_rejected() {
        assert!(matches!(
            validate_password("12345"),
            Err(AppError::BadRequest(_))
        ));
        assert!(validate_password("123456").is_ok());
    }
}
