use api_auth::services::user::{NewCustomerAccount, create_customer_account};
use api_subs::dtos::sub::HistoryParams;
use common::{
    error::Res,
    http::{MAX_PAGE_LIMIT, PageQuery, Paginated},
};
use db::{dtos::customer::CustomerFilter, models::customer::CustomerWithUser};
use sqlx::PgPool;
use uuid::Uuid;

use crate::dtos::customer::{
    CreateCustomerRequest, CustomerDetail, CustomerListQuery, UpdateCustomerRequest,
};

const CUSTOMER_NOT_FOUND: &str = "Customer not found";

pub async fn create_customer(pool: &PgPool, req: CreateCustomerRequest) -> Res<CustomerWithUser> {
    let (user, customer) = create_customer_account(
        pool,
        NewCustomerAccount {
            email: req.email,
            password: req.password,
            name: req.name,
            phone: req.phone,
        },
    )
    .await?;
    Ok(CustomerWithUser {
        customer,
        email: user.email,
    })
}

pub async fn get_customer(pool: &PgPool, customer_id: Uuid) -> Res<CustomerWithUser> {
    db::customer::get_customer_with_user(pool, customer_id)
        .await
        .map_err(|e| e.or_not_found(CUSTOMER_NOT_FOUND))
}

/// Customer with up to a full page of subscriptions, newest first.
pub async fn get_customer_detail(pool: &PgPool, customer_id: Uuid) -> Res<CustomerDetail> {
    let customer = get_customer(pool, customer_id).await?;
    let history = api_subs::services::sub::get_history(
        pool,
        customer_id,
        &HistoryParams {
            limit: Some(MAX_PAGE_LIMIT),
            ..Default::default()
        },
    )
    .await?;
    Ok(CustomerDetail {
        customer,
        subscriptions: history.data,
    })
}

pub async fn update_customer(
    pool: &PgPool,
    customer_id: Uuid,
    req: UpdateCustomerRequest,
) -> Res<CustomerWithUser> {
    let update = req.validate()?;
    db::customer::update_customer(pool, customer_id, update)
        .await
        .map_err(|e| e.or_not_found(CUSTOMER_NOT_FOUND))?;
    get_customer(pool, customer_id).await
}

pub async fn delete_customer(pool: &PgPool, customer_id: Uuid) -> Res<()> {
    db::customer::soft_delete_customer(pool, customer_id)
        .await
        .map_err(|e| e.or_not_found(CUSTOMER_NOT_FOUND))?;
    log::info!("Customer {} soft-deleted", customer_id);
    Ok(())
}

pub async fn list_customers(
    pool: &PgPool,
    query: CustomerListQuery,
) -> Res<Paginated<CustomerWithUser>> {
    let page = PageQuery {
        page: query.page,
        limit: query.limit,
    };
    let filter = CustomerFilter {
        search: query.search.map(|s| s.trim().to_string()),
        limit: page.limit(),
        offset: page.offset(),
    };

    let customers = db::customer::list_customers(pool, &filter).await?;
    let total = db::customer::count_customers(pool, &filter).await?;
    Ok(Paginated::new(customers, total, &page))
}
