use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Res};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum Role {
    Admin,
    Customer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Customer => "customer",
        }
    }
}

/// Verified caller attached to a request by the session or API key middleware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

/// Authorization predicate evaluated by every protected operation.
pub fn require_role(identity: &Identity, role: Role) -> Res<()> {
    if identity.role == role {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "{} access required",
            match role {
                Role::Admin => "Admin",
                Role::Customer => "Customer",
            }
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(role: Role) -> Identity {
        Identity {
            user_id: Uuid::new_v4(),
            email: "someone@example.com".to_string(),
            role,
        }
    }

    #[test]
    fn matching_role_passes() {
        assert!(require_role(&identity(Role::Admin), Role::Admin).is_ok());
        assert!(require_role(&identity(Role::Customer), Role::Customer).is_ok());
    }

    #[test]
    fn mismatched_role_is_forbidden() {
        let err = require_role(&identity(Role::Customer), Role::Admin).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(ref m) if m == "Admin access required"));

        let err = require_role(&identity(Role::Admin), Role::Customer).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(ref m) if m == "Customer access required"));
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(
            serde_json::from_str::<Role>("\"customer\"").unwrap(),
            Role::Customer
        );
    }
}
