use common::error::{AppError, Res};
use sqlx::{Executor, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    dtos::pack::{PackCreateRequest, PackFilter, PackUpdateRequest},
    like_pattern,
    models::pack::SubscriptionPack,
};

/// Includes soft-deleted packs: a SKU is never reused.
pub async fn exists_pack_by_sku<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    sku: &str,
) -> Res<bool> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM subscription_packs WHERE sku = $1)")
        .bind(sku)
        .fetch_one(executor)
        .await
        .map_err(AppError::from)
}

pub async fn insert_pack<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    data: PackCreateRequest,
) -> Res<SubscriptionPack> {
    sqlx::query_as::<_, SubscriptionPack>(
        r#"
        INSERT INTO subscription_packs (name, description, sku, price, validity_months)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(data.name)
    .bind(data.description)
    .bind(data.sku)
    .bind(data.price)
    .bind(data.validity_months)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

pub async fn get_pack_by_id<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    pack_id: Uuid,
) -> Res<SubscriptionPack> {
    sqlx::query_as::<_, SubscriptionPack>(
        "SELECT * FROM subscription_packs WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(pack_id)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

/// Fetches a pack regardless of soft deletion. Existing subscriptions keep referencing it.
pub async fn get_pack_including_deleted<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    pack_id: Uuid,
) -> Res<SubscriptionPack> {
    sqlx::query_as::<_, SubscriptionPack>("SELECT * FROM subscription_packs WHERE id = $1")
        .bind(pack_id)
        .fetch_one(executor)
        .await
        .map_err(AppError::from)
}

pub async fn get_pack_by_sku<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    sku: &str,
) -> Res<SubscriptionPack> {
    sqlx::query_as::<_, SubscriptionPack>(
        "SELECT * FROM subscription_packs WHERE sku = $1 AND deleted_at IS NULL",
    )
    .bind(sku)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

pub async fn update_pack<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    pack_id: Uuid,
    data: PackUpdateRequest,
) -> Res<SubscriptionPack> {
    sqlx::query_as::<_, SubscriptionPack>(
        r#"
        UPDATE subscription_packs
        SET name = COALESCE($2, name),
            description = COALESCE($3, description),
            price = COALESCE($4, price),
            validity_months = COALESCE($5, validity_months),
            updated_at = NOW()
        WHERE id = $1 AND deleted_at IS NULL
        RETURNING *
        "#,
    )
    .bind(pack_id)
    .bind(data.name)
    .bind(data.description)
    .bind(data.price)
    .bind(data.validity_months)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

pub async fn soft_delete_pack<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    pack_id: Uuid,
) -> Res<SubscriptionPack> {
    sqlx::query_as::<_, SubscriptionPack>(
        r#"
        UPDATE subscription_packs SET deleted_at = NOW(), updated_at = NOW()
        WHERE id = $1 AND deleted_at IS NULL
        RETURNING *
        "#,
    )
    .bind(pack_id)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

fn push_pack_conditions(qb: &mut QueryBuilder<'_, Postgres>, filter: &PackFilter) {
    qb.push(" WHERE deleted_at IS NULL");
    if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
        let pattern = like_pattern(search);
        qb.push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR sku ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

pub async fn list_packs<'e, E>(executor: E, filter: &PackFilter) -> Res<Vec<SubscriptionPack>>
where
    E: Executor<'e, Database = Postgres>,
{
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM subscription_packs");
    push_pack_conditions(&mut qb, filter);
    qb.push(" ORDER BY created_at DESC LIMIT ")
        .push_bind(filter.limit)
        .push(" OFFSET ")
        .push_bind(filter.offset);

    qb.build_query_as::<SubscriptionPack>()
        .fetch_all(executor)
        .await
        .map_err(AppError::from)
}

pub async fn count_packs<'e, E>(executor: E, filter: &PackFilter) -> Res<i64>
where
    E: Executor<'e, Database = Postgres>,
{
    let mut qb: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT COUNT(*) FROM subscription_packs");
    push_pack_conditions(&mut qb, filter);

    qb.build_query_scalar::<i64>()
        .fetch_one(executor)
        .await
        .map_err(AppError::from)
}
