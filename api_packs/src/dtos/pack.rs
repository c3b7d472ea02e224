use bigdecimal::{BigDecimal, RoundingMode, Zero};
use common::error::{AppError, Res};
use db::dtos::pack::{PackCreateRequest, PackUpdateRequest};
use serde::Deserialize;

pub const MIN_VALIDITY_MONTHS: i32 = 1;
pub const MAX_VALIDITY_MONTHS: i32 = 12;

#[derive(Debug, Deserialize)]
pub struct CreatePackRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub sku: String,
    pub price: BigDecimal,
    pub validity_months: i32,
}

/// Absent fields are left unchanged, so a price of `0` can be set explicitly.
#[derive(Debug, Default, Deserialize)]
pub struct UpdatePackRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<BigDecimal>,
    pub validity_months: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PackListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
}

fn non_empty(field: &str, value: &str) -> Res<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

/// Non-negative, fits NUMERIC(10,2), rounded to cents.
fn valid_price(price: BigDecimal) -> Res<BigDecimal> {
    if price < BigDecimal::zero() {
        return Err(AppError::BadRequest("Price cannot be negative".to_string()));
    }
    if price >= BigDecimal::from(100_000_000) {
        return Err(AppError::BadRequest("Price is too large".to_string()));
    }
    Ok(price.with_scale_round(2, RoundingMode::HalfUp))
}

fn valid_validity(months: i32) -> Res<i32> {
    if !(MIN_VALIDITY_MONTHS..=MAX_VALIDITY_MONTHS).contains(&months) {
        return Err(AppError::BadRequest(format!(
            "Validity must be between {} and {} months",
            MIN_VALIDITY_MONTHS, MAX_VALIDITY_MONTHS
        )));
    }
    Ok(months)
}

impl CreatePackRequest {
    pub fn validate(self) -> Res<PackCreateRequest> {
        Ok(PackCreateRequest {
            name: non_empty("Name", &self.name)?,
            description: self.description.trim().to_string(),
            sku: non_empty("SKU", &self.sku)?,
            price: valid_price(self.price)?,
            validity_months: valid_validity(self.validity_months)?,
        })
    }
}

impl UpdatePackRequest {
    pub fn validate(self) -> Res<PackUpdateRequest> {
        Ok(PackUpdateRequest {
            name: self.name.as_deref().map(|n| non_empty("Name", n)).transpose()?,
            description: self.description.map(|d| d.trim().to_string()),
            price: self.price.map(valid_price).transpose()?,
            validity_months: self.validity_months.map(valid_validity).transpose()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn create(price: &str, validity_months: i32) -> CreatePackRequest {
        CreatePackRequest {
            name: "Pro".to_string(),
            description: "All features".to_string(),
            sku: " PRO-1M ".to_string(),
            price: BigDecimal::from_str(price).unwrap(),
            validity_months,
        }
    }

    #[test]
    fn valid_pack_is_normalized() {
        let pack = create("19.999", 1).validate().unwrap();
        assert_eq!(pack.sku, "PRO-1M");
        assert_eq!(pack.price, BigDecimal::from_str("20.00").unwrap());
    }

    #[test]
    fn free_pack_is_allowed() {
        assert!(create("0", 12).validate().is_ok());
    }

    #[test]
    fn negative_price_and_bad_validity_are_rejected() {
        assert!(matches!(
            create("-0.01", 1).validate(),
            Err(AppError::BadRequest(_))
        ));
        assert!(create("10", 0).validate().is_err());
        assert!(create("10", 13).validate().is_err());
    }

    #[test]
    fn blank_name_or_sku_is_rejected() {
        let mut req = create("10", 1);
        req.sku = "  ".to_string();
        assert!(req.validate().is_err());

        let mut req = create("10", 1);
        req.name = String::new();
        assert!(req.validate().is_err());
    }

    #[test]
    fn update_can_set_price_to_zero() {
        let update = UpdatePackRequest {
            price: Some(BigDecimal::zero()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(update.price, Some(BigDecimal::zero()));
        assert_eq!(update.name, None);
        assert_eq!(update.validity_months, None);
    }

    #[test]
    fn update_checks_present_fields() {
        let err = UpdatePackRequest {
            validity_months: Some(24),
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn price_accepts_json_numbers_and_strings() {
        let req: CreatePackRequest = serde_json::from_value(serde_json::json!({
            "name": "Basic",
            "sku": "BASIC-1M",
            "price": "9.90",
            "validity_months": 1
        }))
        .unwrap();
        assert_eq!(req.price, BigDecimal::from_str("9.90").unwrap());
        assert_eq!(req.description, "");

        let req: CreatePackRequest = serde_json::from_value(serde_json::json!({
            "name": "Basic",
            "sku": "BASIC-1M",
            "price": 5,
            "validity_months": 1
        }))
        .unwrap();
        assert_eq!(req.price, BigDecimal::from(5));
    }
}
