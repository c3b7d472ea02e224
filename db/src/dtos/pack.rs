use bigdecimal::BigDecimal;

#[derive(Debug)]
pub struct PackCreateRequest {
    pub name: String,
    pub description: String,
    pub sku: String,
    pub price: BigDecimal,
    pub validity_months: i32,
}

/// `None` leaves the column untouched.
#[derive(Debug)]
pub struct PackUpdateRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<BigDecimal>,
    pub validity_months: Option<i32>,
}

#[derive(Debug)]
pub struct PackFilter {
    pub search: Option<String>,
    pub limit: i64,
    pub offset: i64,
}
