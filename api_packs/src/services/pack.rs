use common::{
    error::{AppError, Res},
    http::{PageQuery, Paginated},
};
use db::{dtos::pack::PackFilter, models::pack::SubscriptionPack};
use sqlx::PgPool;
use uuid::Uuid;

use crate::dtos::pack::{CreatePackRequest, PackListQuery, UpdatePackRequest};

const PACK_NOT_FOUND: &str = "Subscription pack not found";

/// Validates and stores a new pack. SKUs of deleted packs stay reserved.
pub async fn create_pack(pool: &PgPool, req: CreatePackRequest) -> Res<SubscriptionPack> {
    let data = req.validate()?;
    if db::pack::exists_pack_by_sku(pool, &data.sku).await? {
        return Err(AppError::Conflict("SKU already exists".to_string()));
    }
    let pack = db::pack::insert_pack(pool, data).await?;
    log::info!("Created subscription pack {} ({})", pack.id, pack.sku);
    Ok(pack)
}

pub async fn get_pack(pool: &PgPool, pack_id: Uuid) -> Res<SubscriptionPack> {
    db::pack::get_pack_by_id(pool, pack_id)
        .await
        .map_err(|e| e.or_not_found(PACK_NOT_FOUND))
}

/// Existing subscriptions keep the expiry computed when they were assigned.
pub async fn update_pack(
    pool: &PgPool,
    pack_id: Uuid,
    req: UpdatePackRequest,
) -> Res<SubscriptionPack> {
    let data = req.validate()?;
    db::pack::update_pack(pool, pack_id, data)
        .await
        .map_err(|e| e.or_not_found(PACK_NOT_FOUND))
}

pub async fn delete_pack(pool: &PgPool, pack_id: Uuid) -> Res<()> {
    let pack = db::pack::soft_delete_pack(pool, pack_id)
        .await
        .map_err(|e| e.or_not_found(PACK_NOT_FOUND))?;
    log::info!("Subscription pack {} ({}) soft-deleted", pack.id, pack.sku);
    Ok(())
}

pub async fn list_packs(pool: &PgPool, query: PackListQuery) -> Res<Paginated<SubscriptionPack>> {
    let page = PageQuery {
        page: query.page,
        limit: query.limit,
    };
    let filter = PackFilter {
        search: query.search.map(|s| s.trim().to_string()),
        limit: page.limit(),
        offset: page.offset(),
    };

    let packs = db::pack::list_packs(pool, &filter).await?;
    let total = db::pack::count_packs(pool, &filter).await?;
    Ok(Paginated::new(packs, total, &page))
}
