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
    dtos::customer::{CreateCustomerRequest, CustomerListQuery, UpdateCustomerRequest},
    services,
};

/// Lists customers.
///
/// # Input
/// - `query`: `page`, `limit` and an optional `search` matched against name and email
///
/// # Output
/// - Success: `{ data, pagination }`
#[get("")]
pub async fn get_customers(
    identity: web::ReqData<Identity>,
    pool: web::Data<Arc<PgPool>>,
    query: web::Query<CustomerListQuery>,
) -> Res<impl Responder> {
    require_role(&identity, Role::Admin)?;
    let page = services::customer::list_customers(&pool, query.into_inner()).await?;
    Success::ok(page)
}

/// Creates a customer account (user and profile) on the customer's behalf.
///
/// # Output
/// - Success: 201 with the customer and its email
/// - Error: 400 on invalid input, 409 when the email is already registered
#[post("")]
pub async fn post_customer(
    identity: web::ReqData<Identity>,
    pool: web::Data<Arc<PgPool>>,
    req: web::Json<CreateCustomerRequest>,
) -> Res<impl Responder> {
    require_role(&identity, Role::Admin)?;
    let customer = services::customer::create_customer(&pool, req.into_inner()).await?;
    Success::created(customer)
}

#[get("/{id}")]
pub async fn get_customer(
    identity: web::ReqData<Identity>,
    pool: web::Data<Arc<PgPool>>,
    path: web::Path<Uuid>,
) -> Res<impl Responder> {
    require_role(&identity, Role::Admin)?;
    let detail = services::customer::get_customer_detail(&pool, path.into_inner()).await?;
    Success::ok(detail)
}

#[put("/{id}")]
pub async fn put_customer(
    identity: web::ReqData<Identity>,
    pool: web::Data<Arc<PgPool>>,
    path: web::Path<Uuid>,
    req: web::Json<UpdateCustomerRequest>,
) -> Res<impl Responder> {
    require_role(&identity, Role::Admin)?;
    let customer =
        services::customer::update_customer(&pool, path.into_inner(), req.into_inner()).await?;
    Success::ok(customer)
}

/// Soft delete. Subscriptions are kept for history.
#[delete("/{id}")]
pub async fn delete_customer(
    identity: web::ReqData<Identity>,
    pool: web::Data<Arc<PgPool>>,
    path: web::Path<Uuid>,
) -> Res<impl Responder> {
    require_role(&identity, Role::Admin)?;
    services::customer::delete_customer(&pool, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
