use common::status::SubscriptionStatus;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug)]
pub struct SubscriptionCreateRequest {
    pub customer_id: Uuid,
    pub pack_id: Uuid,
}

#[derive(Debug)]
pub struct SubscriptionFilter {
    pub status: Option<SubscriptionStatus>,
    pub customer_id: Option<Uuid>,
    pub limit: i64,
    pub offset: i64,
}

/// Columns a subscription history can be ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    CreatedAt,
    RequestedAt,
    ApprovedAt,
    AssignedAt,
    ExpiresAt,
    Status,
}

impl SortField {
    pub fn column(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "s.created_at",
            SortField::RequestedAt => "s.requested_at",
            SortField::ApprovedAt => "s.approved_at",
            SortField::AssignedAt => "s.assigned_at",
            SortField::ExpiresAt => "s.expires_at",
            SortField::Status => "s.status",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug)]
pub struct HistoryQuery {
    pub customer_id: Uuid,
    pub sort: SortField,
    pub order: SortOrder,
    pub limit: i64,
    pub offset: i64,
}
