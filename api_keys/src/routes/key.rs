use std::sync::Arc;

use actix_web::{Responder, post, web};
use common::{error::Res, http::Success};
use sqlx::PgPool;

use crate::{dtos::key::SdkLoginRequest, service};

/// Logs a customer in for SDK use.
///
/// # Arguments
///
/// * `pool` - The database connection pool.
/// * `req` - Email and password of a customer account.
///
/// # Returns
///
/// `{ api_key, user }`. The key is created on the first login and returned
/// unchanged afterwards; send it as the `X-API-Key` header on `/sdk/v1` routes.
#[post("/login")]
pub async fn post_sdk_login(
    pool: web::Data<Arc<PgPool>>,
    req: web::Json<SdkLoginRequest>,
) -> Res<impl Responder> {
    let response = service::key::sdk_login(&pool, &req.email, &req.password).await?;
    Success::ok(response)
}
