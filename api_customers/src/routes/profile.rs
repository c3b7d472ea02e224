use std::sync::Arc;

use actix_web::{Responder, get, put, web};
use common::{
    error::Res,
    http::Success,
    identity::{Identity, Role, require_role},
};
use sqlx::PgPool;

use crate::{dtos::customer::UpdateCustomerRequest, services};

#[get("")]
pub async fn get_profile(
    identity: web::ReqData<Identity>,
    pool: web::Data<Arc<PgPool>>,
) -> Res<impl Responder> {
    require_role(&identity, Role::Customer)?;
    let customer = api_subs::services::sub::current_customer(&pool, &identity).await?;
    let profile = services::customer::get_customer(&pool, customer.id).await?;
    Success::ok(profile)
}

/// Updates the caller's own name and phone. Absent fields are kept.
#[put("")]
pub async fn put_profile(
    identity: web::ReqData<Identity>,
    pool: web::Data<Arc<PgPool>>,
    req: web::Json<UpdateCustomerRequest>,
) -> Res<impl Responder> {
    require_role(&identity, Role::Customer)?;
    let customer = api_subs::services::sub::current_customer(&pool, &identity).await?;
    let profile =
        services::customer::update_customer(&pool, customer.id, req.into_inner()).await?;
    Success::ok(profile)
}
