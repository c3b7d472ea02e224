use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use common::status::SubscriptionStatus;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize)]
pub struct Subscription {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub pack_id: Uuid,
    pub status: SubscriptionStatus,
    pub requested_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub deactivated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Subscription joined with its pack and customer, as returned to clients.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct SubscriptionView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub subscription: Subscription,
    pub pack_sku: String,
    pub pack_name: String,
    pub pack_price: BigDecimal,
    pub pack_validity_months: i32,
    pub customer_name: String,
}
