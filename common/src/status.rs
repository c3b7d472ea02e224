//! Subscription status and the transitions the lifecycle allows between them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "subscription_status", rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Requested,
    Approved,
    Active,
    Inactive,
    Expired,
}

impl SubscriptionStatus {
    pub const ALL: [SubscriptionStatus; 5] = [
        SubscriptionStatus::Requested,
        SubscriptionStatus::Approved,
        SubscriptionStatus::Active,
        SubscriptionStatus::Inactive,
        SubscriptionStatus::Expired,
    ];

    /// Statuses reachable in one step from `self`.
    pub fn allowed_transitions(&self) -> &'static [SubscriptionStatus] {
        use SubscriptionStatus::*;
        match self {
            Requested => &[Approved, Inactive],
            Approved => &[Active, Inactive],
            Active => &[Inactive, Expired],
            Inactive => &[Active],
            Expired => &[Requested],
        }
    }

    pub fn can_transition_to(&self, target: SubscriptionStatus) -> bool {
        self.allowed_transitions().contains(&target)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Requested => "requested",
            SubscriptionStatus::Approved => "approved",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Inactive => "inactive",
            SubscriptionStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SubscriptionStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SubscriptionStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown subscription status: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::SubscriptionStatus::*;
    use super::*;

    #[test]
    fn only_listed_transitions_are_allowed() {
        let allowed = [
            (Requested, Approved),
            (Requested, Inactive),
            (Approved, Active),
            (Approved, Inactive),
            (Active, Inactive),
            (Active, Expired),
            (Inactive, Active),
            (Expired, Requested),
        ];
        for from in SubscriptionStatus::ALL {
            for to in SubscriptionStatus::ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn expired_cannot_be_approved() {
        assert!(!Expired.can_transition_to(Approved));
    }

    #[test]
    fn inactive_can_only_be_reactivated() {
        assert_eq!(Inactive.allowed_transitions(), &[Active]);
        assert!(!Inactive.can_transition_to(Requested));
    }

    #[test]
    fn no_status_transitions_to_itself() {
        for status in SubscriptionStatus::ALL {
            assert!(!status.can_transition_to(status), "{status}");
        }
    }

    #[test]
    fn parses_wire_names() {
        assert_eq!("active".parse::<SubscriptionStatus>().unwrap(), Active);
        assert!("Active".parse::<SubscriptionStatus>().is_err());
    }
}
