use std::sync::Arc;

use actix_web::{Responder, post, web};
use common::{
    env_config::Config,
    error::{AppError, Res},
    http::Success,
    identity::Role,
    jwt::{self, ClaimsSpec},
};
use db::models::user::User;
use sqlx::PgPool;

use crate::{
    dtos::auth::{AuthResponse, LoginRequest, SignupRequest},
    services::{self, user::NewCustomerAccount},
};

fn issue_token(user: &User, config: &Config) -> Res<String> {
    jwt::generate_jwt(
        ClaimsSpec {
            user_id: user.id,
            email: user.email.clone(),
            role: user.role,
        },
        &config.jwt_config,
    )
}

/// Authenticates an admin with email and password.
///
/// # Input
/// - `login_data`: JSON payload containing email and password
///
/// # Output
/// - Success: `{ token, user }` where `token` is a bearer token for `/api/v1`
/// - Error: 401 `Invalid credentials` for unknown emails, non-admin accounts
///   and wrong passwords alike
///
/// # Frontend Example
/// ```javascript
/// const response = await fetch('/api/admin/login', {
///   method: 'POST',
///   headers: { 'Content-Type': 'application/json' },
///   body: JSON.stringify({ email: 'admin@example.com', password: 'changeme' })
/// });
///
/// if (response.ok) {
///   const { token } = await response.json();
///   localStorage.setItem('authToken', token);
/// }
/// ```
#[post("/login")]
pub async fn post_admin_login(
    login_data: web::Json<LoginRequest>,
    config: web::Data<Arc<Config>>,
    pool: web::Data<Arc<PgPool>>,
) -> Res<impl Responder> {
    let user =
        services::auth::authenticate(&pool, &login_data.email, &login_data.password, Role::Admin)
            .await?;
    let token = issue_token(&user, &config)?;
    Success::ok(AuthResponse {
        token,
        user,
        customer: None,
    })
}

/// Authenticates a customer with email and password.
///
/// # Output
/// - Success: `{ token, user, customer }`
/// - Error: 401 `Invalid credentials`
#[post("/login")]
pub async fn post_customer_login(
    login_data: web::Json<LoginRequest>,
    config: web::Data<Arc<Config>>,
    pool: web::Data<Arc<PgPool>>,
) -> Res<impl Responder> {
    let user = services::auth::authenticate(
        &pool,
        &login_data.email,
        &login_data.password,
        Role::Customer,
    )
    .await?;
    // a soft-deleted profile closes the account
    let customer = db::customer::get_customer_by_user_id(pool.get_ref().as_ref(), user.id)
        .await
        .map_err(|e| match e {
            AppError::Database(sqlx::Error::RowNotFound) => {
                AppError::Unauthorized("Invalid credentials".to_string())
            }
            other => other,
        })?;
    let token = issue_token(&user, &config)?;
    Success::ok(AuthResponse {
        token,
        user,
        customer: Some(customer),
    })
}

/// Registers a new customer and signs them in.
///
/// # Input
/// - `req`: `{ email, password, name, phone? }`, password of at least 6 characters
///
/// # Output
/// - Success: 201 with `{ token, user, customer }`
/// - Error: 400 for an invalid email, short password or empty name, 409 if the email is taken
///
/// # Frontend Example
/// ```javascript
/// const response = await fetch('/api/customer/signup', {
///   method: 'POST',
///   headers: { 'Content-Type': 'application/json' },
///   body: JSON.stringify({
///     email: 'ada@example.com',
///     password: 'secret1',
///     name: 'Ada Lovelace',
///     phone: '+44 20 7946 0000'
///   })
/// });
/// ```
#[post("/signup")]
pub async fn post_signup(
    req: web::Json<SignupRequest>,
    config: web::Data<Arc<Config>>,
    pool: web::Data<Arc<PgPool>>,
) -> Res<impl Responder> {
    let req = req.into_inner();
    let (user, customer) = services::user::create_customer_account(
        &pool,
        NewCustomerAccount {
            email: req.email,
            password: req.password,
            name: req.name,
            phone: req.phone,
        },
    )
    .await?;
    let token = issue_token(&user, &config)?;
    Success::created(AuthResponse {
        token,
        user,
        customer: Some(customer),
    })
}
