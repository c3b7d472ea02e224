//! Self-service subscription routes. Mounted under both the session and the
//! API key surfaces; the middleware in front decides how the caller is identified.

use std::sync::Arc;

use actix_web::{Responder, get, post, put, web};
use common::{
    error::Res,
    http::Success,
    identity::{Identity, Role, require_role},
};
use db::models::customer::Customer;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    dtos::sub::{HistoryParams, RequestSubscriptionRequest},
    services,
};

async fn customer_of(pool: &PgPool, identity: &Identity) -> Res<Customer> {
    require_role(identity, Role::Customer)?;
    services::sub::current_customer(pool, identity).await
}

/// Returns the caller's running subscription with pack details.
///
/// # Output
/// - Success: the subscription, `is_active` is always `true`
/// - Error: 404 when there is no active, unexpired subscription
#[get("")]
pub async fn get_current(
    identity: web::ReqData<Identity>,
    pool: web::Data<Arc<PgPool>>,
) -> Res<impl Responder> {
    let customer = customer_of(&pool, &identity).await?;
    let subscription = services::sub::get_current_subscription(&pool, customer.id).await?;
    Success::ok(subscription)
}

/// Requests a subscription on the pack identified by `pack_sku`.
///
/// # Input
/// - `req`: `{ "pack_sku": "PRO-1M" }`
///
/// # Output
/// - Success: 201 with the `requested` subscription
/// - Error: 404 for an unknown SKU, 409 while another subscription is active
#[post("/request")]
pub async fn post_request(
    identity: web::ReqData<Identity>,
    pool: web::Data<Arc<PgPool>>,
    req: web::Json<RequestSubscriptionRequest>,
) -> Res<impl Responder> {
    let customer = customer_of(&pool, &identity).await?;
    let subscription =
        services::sub::request_subscription(&pool, customer.id, &req.pack_sku).await?;
    Success::created(subscription)
}

#[put("/deactivate")]
pub async fn put_deactivate(
    identity: web::ReqData<Identity>,
    pool: web::Data<Arc<PgPool>>,
) -> Res<impl Responder> {
    let customer = customer_of(&pool, &identity).await?;
    let subscription = services::sub::deactivate_current(&pool, customer.id).await?;
    Success::ok(subscription)
}

/// Re-requests one of the caller's expired subscriptions.
#[put("/{id}/renew")]
pub async fn put_renew(
    identity: web::ReqData<Identity>,
    pool: web::Data<Arc<PgPool>>,
    path: web::Path<Uuid>,
) -> Res<impl Responder> {
    let customer = customer_of(&pool, &identity).await?;
    let subscription =
        services::sub::renew_subscription(&pool, path.into_inner(), Some(customer.id)).await?;
    Success::ok(subscription)
}

/// Pages through the caller's subscriptions.
///
/// # Input
/// - `params`: `page`, `limit`, `sort` (one of `created_at`, `requested_at`,
///   `approved_at`, `assigned_at`, `expires_at`, `status`) and `order` (`asc` | `desc`)
#[get("/history")]
pub async fn get_history(
    identity: web::ReqData<Identity>,
    pool: web::Data<Arc<PgPool>>,
    params: web::Query<HistoryParams>,
) -> Res<impl Responder> {
    let customer = customer_of(&pool, &identity).await?;
    let page = services::sub::get_history(&pool, customer.id, &params).await?;
    Success::ok(page)
}
