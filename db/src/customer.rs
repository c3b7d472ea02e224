use common::error::{AppError, Res};
use sqlx::{Executor, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    dtos::customer::{CustomerCreateRequest, CustomerFilter, CustomerUpdateRequest},
    like_pattern,
    models::customer::{Customer, CustomerWithUser},
};

pub async fn insert_customer<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    data: CustomerCreateRequest,
) -> Res<Customer> {
    sqlx::query_as::<_, Customer>(
        r#"
        INSERT INTO customers (user_id, name, phone)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(data.user_id)
    .bind(data.name)
    .bind(data.phone)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

pub async fn get_customer_with_user<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    customer_id: Uuid,
) -> Res<CustomerWithUser> {
    sqlx::query_as::<_, CustomerWithUser>(
        r#"
        SELECT c.*, u.email
        FROM customers c
        JOIN users u ON u.id = c.user_id
        WHERE c.id = $1 AND c.deleted_at IS NULL
        "#,
    )
    .bind(customer_id)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

pub async fn get_customer_by_user_id<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: Uuid,
) -> Res<Customer> {
    sqlx::query_as::<_, Customer>(
        "SELECT * FROM customers WHERE user_id = $1 AND deleted_at IS NULL",
    )
    .bind(user_id)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

/// Takes a row lock on the customer for the rest of the transaction.
/// Lifecycle operations that touch the active subscription serialize on it.
pub async fn lock_customer<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    customer_id: Uuid,
) -> Res<Customer> {
    sqlx::query_as::<_, Customer>(
        "SELECT * FROM customers WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
    )
    .bind(customer_id)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

pub async fn update_customer<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    customer_id: Uuid,
    data: CustomerUpdateRequest,
) -> Res<Customer> {
    sqlx::query_as::<_, Customer>(
        r#"
        UPDATE customers
        SET name = COALESCE($2, name),
            phone = COALESCE($3, phone),
            updated_at = NOW()
        WHERE id = $1 AND deleted_at IS NULL
        RETURNING *
        "#,
    )
    .bind(customer_id)
    .bind(data.name)
    .bind(data.phone)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

pub async fn soft_delete_customer<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    customer_id: Uuid,
) -> Res<Customer> {
    sqlx::query_as::<_, Customer>(
        r#"
        UPDATE customers SET deleted_at = NOW(), updated_at = NOW()
        WHERE id = $1 AND deleted_at IS NULL
        RETURNING *
        "#,
    )
    .bind(customer_id)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

fn push_customer_conditions(qb: &mut QueryBuilder<'_, Postgres>, filter: &CustomerFilter) {
    qb.push(" WHERE c.deleted_at IS NULL");
    if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
        let pattern = like_pattern(search);
        qb.push(" AND (c.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR u.email ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

pub async fn list_customers<'e, E>(
    executor: E,
    filter: &CustomerFilter,
) -> Res<Vec<CustomerWithUser>>
where
    E: Executor<'e, Database = Postgres>,
{
    let mut qb: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT c.*, u.email FROM customers c JOIN users u ON u.id = c.user_id");
    push_customer_conditions(&mut qb, filter);
    qb.push(" ORDER BY c.created_at DESC LIMIT ")
        .push_bind(filter.limit)
        .push(" OFFSET ")
        .push_bind(filter.offset);

    qb.build_query_as::<CustomerWithUser>()
        .fetch_all(executor)
        .await
        .map_err(AppError::from)
}

pub async fn count_customers<'e, E>(executor: E, filter: &CustomerFilter) -> Res<i64>
where
    E: Executor<'e, Database = Postgres>,
{
    let mut qb: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT COUNT(*) FROM customers c JOIN users u ON u.id = c.user_id");
    push_customer_conditions(&mut qb, filter);

    qb.build_query_scalar::<i64>()
        .fetch_one(executor)
        .await
        .map_err(AppError::from)
}
