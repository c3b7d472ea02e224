use api_subs::dtos::sub::SubscriptionResponse;
use common::error::{AppError, Res};
use db::{dtos::customer::CustomerUpdateRequest, models::customer::CustomerWithUser};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CreateCustomerRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(default)]
    pub phone: String,
}

/// Absent fields are left unchanged. An empty `phone` clears it.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateCustomerRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
}

impl UpdateCustomerRequest {
    pub fn validate(self) -> Res<CustomerUpdateRequest> {
        let name = match self.name {
            Some(name) if name.trim().is_empty() => {
                return Err(AppError::BadRequest("Name cannot be empty".to_string()));
            }
            Some(name) => Some(name.trim().to_string()),
            None => None,
        };
        Ok(CustomerUpdateRequest {
            name,
            phone: self.phone.map(|phone| phone.trim().to_string()),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CustomerListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
}

/// Customer with user email and its most recent subscriptions.
#[derive(Debug, Serialize)]
pub struct CustomerDetail {
    #[serde(flatten)]
    pub customer: CustomerWithUser,
    pub subscriptions: Vec<SubscriptionResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_fields_stay_untouched() {
        let update = UpdateCustomerRequest::default().validate().unwrap();
        assert_eq!(update.name, None);
        assert_eq!(update.phone, None);
    }

    #[test]
    fn empty_phone_is_an_explicit_clear() {
        let update = UpdateCustomerRequest {
            name: None,
            phone: Some(String::new()),
        }
        .validate()
        .unwrap();
        assert_eq!(update.phone, Some(String::new()));
    }

    #[test]
    fn blank_name_is_rejected() {
        let err = UpdateCustomerRequest {
            name: Some("   ".to_string()),
            phone: None,
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
