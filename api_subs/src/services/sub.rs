use chrono::Utc;
use common::{
    error::{AppError, Res},
    http::{PageQuery, Paginated},
    identity::Identity,
};
use db::{
    dtos::subscription::{HistoryQuery, SubscriptionCreateRequest, SubscriptionFilter},
    models::{customer::Customer, subscription::Subscription},
};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    dtos::sub::{HistoryParams, ListQuery, SubscriptionResponse},
    lifecycle,
};

const SUBSCRIPTION_NOT_FOUND: &str = "Subscription not found";
const CUSTOMER_NOT_FOUND: &str = "Customer not found";
const NO_ACTIVE_SUBSCRIPTION: &str = "No active subscription found";
const ALREADY_ACTIVE: &str = "Customer already has an active subscription";

/// Resolves the customer profile behind a customer identity.
/// A missing or soft-deleted profile means the caller is no longer a customer.
pub async fn current_customer(pool: &PgPool, identity: &Identity) -> Res<Customer> {
    db::customer::get_customer_by_user_id(pool, identity.user_id)
        .await
        .map_err(|e| match e {
            AppError::Database(sqlx::Error::RowNotFound) => {
                AppError::Unauthorized(CUSTOMER_NOT_FOUND.to_string())
            }
            other => other,
        })
}

async fn load_response(
    conn: &mut PgConnection,
    subscription_id: Uuid,
) -> Res<SubscriptionResponse> {
    let view = db::subscription::get_subscription_view(conn, subscription_id)
        .await
        .map_err(|e| e.or_not_found(SUBSCRIPTION_NOT_FOUND))?;
    Ok(SubscriptionResponse::new(view, Utc::now()))
}

async fn lock_subscription(conn: &mut PgConnection, subscription_id: Uuid) -> Res<Subscription> {
    db::subscription::lock_subscription(conn, subscription_id)
        .await
        .map_err(|e| e.or_not_found(SUBSCRIPTION_NOT_FOUND))
}

async fn find_subscription(conn: &mut PgConnection, subscription_id: Uuid) -> Res<Subscription> {
    db::subscription::get_subscription_by_id(conn, subscription_id)
        .await
        .map_err(|e| e.or_not_found(SUBSCRIPTION_NOT_FOUND))
}

/// Locks the customer row and moves its lapsed `active` rows to `expired`,
/// so only a still-running subscription can block the caller.
///
/// Operations that touch both rows take this lock before any subscription
/// row lock.
async fn lock_customer_and_expire(conn: &mut PgConnection, customer_id: Uuid) -> Res<Customer> {
    let customer = db::customer::lock_customer(&mut *conn, customer_id)
        .await
        .map_err(|e| e.or_not_found(CUSTOMER_NOT_FOUND))?;
    let expired = db::subscription::expire_due_for_customer(&mut *conn, customer_id).await?;
    if expired > 0 {
        log::info!("Expired {} subscription(s) of customer {}", expired, customer_id);
    }
    Ok(customer)
}

/// Creates a `requested` subscription for `customer_id` on the pack with `pack_sku`.
pub async fn request_subscription(
    pool: &PgPool,
    customer_id: Uuid,
    pack_sku: &str,
) -> Res<SubscriptionResponse> {
    let pack_sku = pack_sku.trim();
    if pack_sku.is_empty() {
        return Err(AppError::BadRequest("pack_sku is required".to_string()));
    }

    let mut tx = pool.begin().await?;
    lock_customer_and_expire(&mut tx, customer_id).await?;

    if db::subscription::has_active_subscription(&mut *tx, customer_id, None).await? {
        return Err(AppError::Conflict(ALREADY_ACTIVE.to_string()));
    }

    let pack = db::pack::get_pack_by_sku(&mut *tx, pack_sku)
        .await
        .map_err(|e| e.or_not_found("Subscription pack not found"))?;

    let subscription = db::subscription::insert_subscription(
        &mut *tx,
        SubscriptionCreateRequest {
            customer_id,
            pack_id: pack.id,
        },
        Utc::now(),
    )
    .await?;
    let response = load_response(&mut tx, subscription.id).await?;
    tx.commit().await?;

    log::info!(
        "Subscription {} requested for customer {} on pack {}",
        subscription.id,
        customer_id,
        pack.sku
    );
    Ok(response)
}

pub async fn approve_subscription(
    pool: &PgPool,
    subscription_id: Uuid,
) -> Res<SubscriptionResponse> {
    let mut tx = pool.begin().await?;
    let mut subscription = lock_subscription(&mut tx, subscription_id).await?;
    lifecycle::approve(&mut subscription, Utc::now())?;
    db::subscription::save_subscription(&mut *tx, &subscription).await?;
    let response = load_response(&mut tx, subscription_id).await?;
    tx.commit().await?;

    log::info!("Subscription {} approved", subscription_id);
    Ok(response)
}

/// Activates an approved (or previously deactivated) subscription.
///
/// Runs under the customer lock and then the subscription lock, so two
/// assignments for the same customer serialize and the second one sees the
/// first one's `active` row.
pub async fn assign_subscription(
    pool: &PgPool,
    subscription_id: Uuid,
) -> Res<SubscriptionResponse> {
    let mut tx = pool.begin().await?;
    let customer_id = find_subscription(&mut tx, subscription_id).await?.customer_id;

    lock_customer_and_expire(&mut tx, customer_id).await?;
    let mut subscription = lock_subscription(&mut tx, subscription_id).await?;
    lifecycle::ensure_assignable(&subscription)?;
    if db::subscription::has_active_subscription(
        &mut *tx,
        subscription.customer_id,
        Some(subscription.id),
    )
    .await?
    {
        return Err(AppError::Conflict(ALREADY_ACTIVE.to_string()));
    }

    // validity is read at assignment time; later pack edits leave expires_at alone
    let pack = db::pack::get_pack_including_deleted(&mut *tx, subscription.pack_id)
        .await
        .map_err(|e| e.or_not_found("Subscription pack not found"))?;
    lifecycle::assign(&mut subscription, pack.validity_months, Utc::now())?;
    db::subscription::save_subscription(&mut *tx, &subscription).await?;
    let response = load_response(&mut tx, subscription_id).await?;
    tx.commit().await?;

    log::info!(
        "Subscription {} assigned to customer {}, expires at {:?}",
        subscription_id,
        subscription.customer_id,
        subscription.expires_at
    );
    Ok(response)
}

pub async fn unassign_subscription(
    pool: &PgPool,
    subscription_id: Uuid,
) -> Res<SubscriptionResponse> {
    let mut tx = pool.begin().await?;
    let mut subscription = lock_subscription(&mut tx, subscription_id).await?;
    lifecycle::deactivate(&mut subscription, Utc::now())?;
    db::subscription::save_subscription(&mut *tx, &subscription).await?;
    let response = load_response(&mut tx, subscription_id).await?;
    tx.commit().await?;

    log::info!("Subscription {} unassigned", subscription_id);
    Ok(response)
}

pub async fn reject_subscription(
    pool: &PgPool,
    subscription_id: Uuid,
) -> Res<SubscriptionResponse> {
    let mut tx = pool.begin().await?;
    let mut subscription = lock_subscription(&mut tx, subscription_id).await?;
    lifecycle::reject(&mut subscription, Utc::now())?;
    db::subscription::save_subscription(&mut *tx, &subscription).await?;
    let response = load_response(&mut tx, subscription_id).await?;
    tx.commit().await?;

    log::info!("Subscription {} rejected", subscription_id);
    Ok(response)
}

/// Turns an expired subscription back into a request.
/// With `owner` set, subscriptions of other customers are reported as missing.
pub async fn renew_subscription(
    pool: &PgPool,
    subscription_id: Uuid,
    owner: Option<Uuid>,
) -> Res<SubscriptionResponse> {
    let mut tx = pool.begin().await?;
    let customer_id = find_subscription(&mut tx, subscription_id).await?.customer_id;
    if owner.is_some_and(|owner_id| owner_id != customer_id) {
        return Err(AppError::NotFound(SUBSCRIPTION_NOT_FOUND.to_string()));
    }

    lock_customer_and_expire(&mut tx, customer_id).await?;
    // locked after the expiry pass, which may have just moved this row to `expired`
    let mut subscription = lock_subscription(&mut tx, subscription_id).await?;
    if db::subscription::has_active_subscription(&mut *tx, subscription.customer_id, None).await? {
        return Err(AppError::Conflict(ALREADY_ACTIVE.to_string()));
    }

    lifecycle::renew(&mut subscription, Utc::now())?;
    db::subscription::save_subscription(&mut *tx, &subscription).await?;
    let response = load_response(&mut tx, subscription_id).await?;
    tx.commit().await?;

    log::info!("Subscription {} renewed", subscription_id);
    Ok(response)
}

/// Deactivates the customer's running subscription.
pub async fn deactivate_current(pool: &PgPool, customer_id: Uuid) -> Res<SubscriptionResponse> {
    let mut tx = pool.begin().await?;
    let mut subscription = db::subscription::lock_current_subscription(&mut *tx, customer_id)
        .await?
        .ok_or_else(|| AppError::NotFound(NO_ACTIVE_SUBSCRIPTION.to_string()))?;
    lifecycle::deactivate(&mut subscription, Utc::now())?;
    db::subscription::save_subscription(&mut *tx, &subscription).await?;
    let response = load_response(&mut tx, subscription.id).await?;
    tx.commit().await?;

    log::info!(
        "Subscription {} deactivated by customer {}",
        subscription.id,
        customer_id
    );
    Ok(response)
}

pub async fn delete_subscription(pool: &PgPool, subscription_id: Uuid) -> Res<()> {
    let deleted = db::subscription::delete_subscription(pool, subscription_id).await?;
    if deleted == 0 {
        return Err(AppError::NotFound(SUBSCRIPTION_NOT_FOUND.to_string()));
    }
    log::info!("Subscription {} deleted", subscription_id);
    Ok(())
}

pub async fn get_subscription(pool: &PgPool, subscription_id: Uuid) -> Res<SubscriptionResponse> {
    let view = db::subscription::get_subscription_view(pool, subscription_id)
        .await
        .map_err(|e| e.or_not_found(SUBSCRIPTION_NOT_FOUND))?;
    Ok(SubscriptionResponse::new(view, Utc::now()))
}

pub async fn get_current_subscription(
    pool: &PgPool,
    customer_id: Uuid,
) -> Res<SubscriptionResponse> {
    let view = db::subscription::get_current_subscription_view(pool, customer_id)
        .await?
        .ok_or_else(|| AppError::NotFound(NO_ACTIVE_SUBSCRIPTION.to_string()))?;
    Ok(SubscriptionResponse::new(view, Utc::now()))
}

pub async fn list_subscriptions(
    pool: &PgPool,
    query: &ListQuery,
) -> Res<Paginated<SubscriptionResponse>> {
    let page = query.page_query();
    let filter = SubscriptionFilter {
        status: query.status,
        customer_id: query.customer_id,
        limit: page.limit(),
        offset: page.offset(),
    };

    let views = db::subscription::list_subscriptions(pool, &filter).await?;
    let total = db::subscription::count_subscriptions(pool, &filter).await?;

    let now = Utc::now();
    let data = views
        .into_iter()
        .map(|view| SubscriptionResponse::new(view, now))
        .collect();
    Ok(Paginated::new(data, total, &page))
}

/// One page of a customer's subscriptions, in the requested order.
pub async fn get_history(
    pool: &PgPool,
    customer_id: Uuid,
    params: &HistoryParams,
) -> Res<Paginated<SubscriptionResponse>> {
    let page: PageQuery = params.page_query();
    let query = HistoryQuery {
        customer_id,
        sort: params.sort.unwrap_or_default(),
        order: params.order.unwrap_or_default(),
        limit: page.limit(),
        offset: page.offset(),
    };

    let views = db::subscription::get_subscription_history(pool, &query).await?;
    let total = db::subscription::count_customer_subscriptions(pool, customer_id).await?;

    let now = Utc::now();
    let data = views
        .into_iter()
        .map(|view| SubscriptionResponse::new(view, now))
        .collect();
    Ok(Paginated::new(data, total, &page))
}
