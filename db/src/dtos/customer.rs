use uuid::Uuid;

#[derive(Debug)]
pub struct CustomerCreateRequest {
    pub user_id: Uuid,
    pub name: String,
    pub phone: String,
}

/// `None` leaves the column untouched.
#[derive(Debug)]
pub struct CustomerUpdateRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug)]
pub struct CustomerFilter {
    pub search: Option<String>,
    pub limit: i64,
    pub offset: i64,
}
