use chrono::{DateTime, Utc};
use common::{http::PageQuery, status::SubscriptionStatus};
use db::{
    dtos::subscription::{SortField, SortOrder},
    models::subscription::SubscriptionView,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::lifecycle;

/// Subscription as returned to clients, with the expiry flags evaluated at response time.
#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    #[serde(flatten)]
    pub subscription: SubscriptionView,
    pub is_active: bool,
    pub is_expired: bool,
}

impl SubscriptionResponse {
    pub fn new(view: SubscriptionView, now: DateTime<Utc>) -> Self {
        SubscriptionResponse {
            is_active: lifecycle::is_active(&view.subscription, now),
            is_expired: lifecycle::is_expired(&view.subscription, now),
            subscription: view,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RequestSubscriptionRequest {
    pub pack_sku: String,
}

#[derive(Debug, Deserialize)]
pub struct AdminCreateSubscriptionRequest {
    pub customer_id: Uuid,
    pub pack_sku: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<SubscriptionStatus>,
    pub customer_id: Option<Uuid>,
}

impl ListQuery {
    pub fn page_query(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            limit: self.limit,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort: Option<SortField>,
    pub order: Option<SortOrder>,
}

impl HistoryParams {
    pub fn page_query(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            limit: self.limit,
        }
    }
}
