use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Customer {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Customer row joined with the owning user's email.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct CustomerWithUser {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub customer: Customer,
    pub email: String,
}
