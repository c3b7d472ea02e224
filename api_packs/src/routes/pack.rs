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
    dtos::pack::{CreatePackRequest, PackListQuery, UpdatePackRequest},
    services,
};

/// Lists packs that are not deleted.
///
/// # Input
/// - `query`: `page`, `limit` and an optional `search`, matched case-insensitively
///   against name, description and SKU
///
/// # Output
/// - Success: `{ data, pagination }`
#[get("")]
pub async fn get_packs(
    identity: web::ReqData<Identity>,
    pool: web::Data<Arc<PgPool>>,
    query: web::Query<PackListQuery>,
) -> Res<impl Responder> {
    require_role(&identity, Role::Admin)?;
    let page = services::pack::list_packs(&pool, query.into_inner()).await?;
    Success::ok(page)
}

/// Creates a pack.
///
/// # Input
/// - `req`: `{ name, description?, sku, price, validity_months }`
///
/// # Output
/// - Success: 201 with the stored pack
/// - Error: 400 on invalid fields, 409 when the SKU is taken
///
/// # Frontend Example
/// ```javascript
/// await fetch('/api/v1/admin/packs', {
///   method: 'POST',
///   headers: {
///     'Content-Type': 'application/json',
///     'Authorization': `Bearer ${localStorage.getItem('authToken')}`
///   },
///   body: JSON.stringify({
///     name: 'Pro',
///     description: 'Every feature, one seat',
///     sku: 'PRO-1M',
///     price: '19.90',
///     validity_months: 1
///   })
/// });
/// ```
#[post("")]
pub async fn post_pack(
    identity: web::ReqData<Identity>,
    pool: web::Data<Arc<PgPool>>,
    req: web::Json<CreatePackRequest>,
) -> Res<impl Responder> {
    require_role(&identity, Role::Admin)?;
    let pack = services::pack::create_pack(&pool, req.into_inner()).await?;
    Success::created(pack)
}

#[get("/{id}")]
pub async fn get_pack(
    identity: web::ReqData<Identity>,
    pool: web::Data<Arc<PgPool>>,
    path: web::Path<Uuid>,
) -> Res<impl Responder> {
    require_role(&identity, Role::Admin)?;
    let pack = services::pack::get_pack(&pool, path.into_inner()).await?;
    Success::ok(pack)
}

#[put("/{id}")]
pub async fn put_pack(
    identity: web::ReqData<Identity>,
    pool: web::Data<Arc<PgPool>>,
    path: web::Path<Uuid>,
    req: web::Json<UpdatePackRequest>,
) -> Res<impl Responder> {
    require_role(&identity, Role::Admin)?;
    let pack = services::pack::update_pack(&pool, path.into_inner(), req.into_inner()).await?;
    Success::ok(pack)
}

#[delete("/{id}")]
pub async fn delete_pack(
    identity: web::ReqData<Identity>,
    pool: web::Data<Arc<PgPool>>,
    path: web::Path<Uuid>,
) -> Res<impl Responder> {
    require_role(&identity, Role::Admin)?;
    services::pack::delete_pack(&pool, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
