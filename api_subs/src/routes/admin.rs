use std::sync::Arc;

use actix_web::{HttpResponse, Responder, delete, get, post, put, web};
use common::{
    error::Res,
    http::Success,
    identity::{Identity, Role, require_role},
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    dtos::sub::{AdminCreateSubscriptionRequest, ListQuery},
    services,
};

/// Lists subscriptions across all customers.
///
/// # Input
/// - `query`: `page`, `limit`, and the optional `status` and `customer_id` filters
///
/// # Output
/// - Success: `{ data, pagination }` ordered by creation, newest first
/// - Error: 403 for non-admin callers
#[get("")]
pub async fn get_subscriptions(
    identity: web::ReqData<Identity>,
    pool: web::Data<Arc<PgPool>>,
    query: web::Query<ListQuery>,
) -> Res<impl Responder> {
    require_role(&identity, Role::Admin)?;
    let page = services::sub::list_subscriptions(&pool, &query).await?;
    Success::ok(page)
}

/// Requests a subscription on behalf of a customer.
///
/// # Output
/// - Success: 201 with the new `requested` subscription
/// - Error: 404 for an unknown customer or SKU, 409 if the customer already has an active one
#[post("")]
pub async fn post_subscription(
    identity: web::ReqData<Identity>,
    pool: web::Data<Arc<PgPool>>,
    req: web::Json<AdminCreateSubscriptionRequest>,
) -> Res<impl Responder> {
    require_role(&identity, Role::Admin)?;
    let req = req.into_inner();
    let subscription =
        services::sub::request_subscription(&pool, req.customer_id, &req.pack_sku).await?;
    Success::created(subscription)
}

#[get("/{id}")]
pub async fn get_subscription(
    identity: web::ReqData<Identity>,
    pool: web::Data<Arc<PgPool>>,
    path: web::Path<Uuid>,
) -> Res<impl Responder> {
    require_role(&identity, Role::Admin)?;
    let subscription = services::sub::get_subscription(&pool, path.into_inner()).await?;
    Success::ok(subscription)
}

#[delete("/{id}")]
pub async fn delete_subscription(
    identity: web::ReqData<Identity>,
    pool: web::Data<Arc<PgPool>>,
    path: web::Path<Uuid>,
) -> Res<impl Responder> {
    require_role(&identity, Role::Admin)?;
    services::sub::delete_subscription(&pool, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// `requested -> approved`
#[put("/{id}/approve")]
pub async fn put_approve(
    identity: web::ReqData<Identity>,
    pool: web::Data<Arc<PgPool>>,
    path: web::Path<Uuid>,
) -> Res<impl Responder> {
    require_role(&identity, Role::Admin)?;
    let subscription = services::sub::approve_subscription(&pool, path.into_inner()).await?;
    Success::ok(subscription)
}

/// Activates the subscription and computes its expiry from the pack validity.
/// 409 when the customer already holds a different active subscription.
#[put("/{id}/assign")]
pub async fn put_assign(
    identity: web::ReqData<Identity>,
    pool: web::Data<Arc<PgPool>>,
    path: web::Path<Uuid>,
) -> Res<impl Responder> {
    require_role(&identity, Role::Admin)?;
    let subscription = services::sub::assign_subscription(&pool, path.into_inner()).await?;
    Success::ok(subscription)
}

#[put("/{id}/unassign")]
pub async fn put_unassign(
    identity: web::ReqData<Identity>,
    pool: web::Data<Arc<PgPool>>,
    path: web::Path<Uuid>,
) -> Res<impl Responder> {
    require_role(&identity, Role::Admin)?;
    let subscription = services::sub::unassign_subscription(&pool, path.into_inner()).await?;
    Success::ok(subscription)
}

#[put("/{id}/reject")]
pub async fn put_reject(
    identity: web::ReqData<Identity>,
    pool: web::Data<Arc<PgPool>>,
    path: web::Path<Uuid>,
) -> Res<impl Responder> {
    require_role(&identity, Role::Admin)?;
    let subscription = services::sub::reject_subscription(&pool, path.into_inner()).await?;
    Success::ok(subscription)
}

#[put("/{id}/renew")]
pub async fn put_renew(
    identity: web::ReqData<Identity>,
    pool: web::Data<Arc<PgPool>>,
    path: web::Path<Uuid>,
) -> Res<impl Responder> {
    require_role(&identity, Role::Admin)?;
    let subscription = services::sub::renew_subscription(&pool, path.into_inner(), None).await?;
    Success::ok(subscription)
}
