//! Subscription lifecycle rules.
//!
//! Every operation takes the subscription as loaded (and locked) by the
//! caller, checks the move against the transition table and updates the
//! status and timestamps in place. Persisting the result and checking the
//! one-active-subscription-per-customer rule are left to the service layer,
//! which runs both inside the same transaction.

use chrono::{DateTime, Months, Utc};
use common::{
    error::{AppError, Res},
    status::SubscriptionStatus,
};
use db::models::subscription::Subscription;

/// Adds whole calendar months to `assigned_at`, clamping to the last day of
/// the target month when the original day does not exist there.
pub fn compute_expiry(assigned_at: DateTime<Utc>, validity_months: i32) -> Res<DateTime<Utc>> {
    let months = u32::try_from(validity_months)
        .ok()
        .filter(|m| (1..=12).contains(m))
        .ok_or_else(|| {
            AppError::Internal(format!("Invalid pack validity: {} months", validity_months))
        })?;
    assigned_at
        .checked_add_months(Months::new(months))
        .ok_or_else(|| AppError::Internal("Expiry date out of range".to_string()))
}

/// Active now: stored status is `active` and the expiry is still ahead.
pub fn is_active(subscription: &Subscription, now: DateTime<Utc>) -> bool {
    subscription.status == SubscriptionStatus::Active
        && subscription
            .expires_at
            .is_some_and(|expires_at| expires_at > now)
}

/// Expired now, whether or not the sweep has already stored `expired`.
pub fn is_expired(subscription: &Subscription, now: DateTime<Utc>) -> bool {
    match subscription.status {
        SubscriptionStatus::Expired => true,
        SubscriptionStatus::Active => subscription
            .expires_at
            .is_some_and(|expires_at| expires_at <= now),
        _ => false,
    }
}

fn ensure_transition(
    subscription: &Subscription,
    target: SubscriptionStatus,
    action: &str,
) -> Res<()> {
    if subscription.status.can_transition_to(target) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "Subscription cannot be {} in current status ({})",
            action, subscription.status
        )))
    }
}

/// `requested -> approved`
pub fn approve(subscription: &mut Subscription, now: DateTime<Utc>) -> Res<()> {
    ensure_transition(subscription, SubscriptionStatus::Approved, "approved")?;
    subscription.status = SubscriptionStatus::Approved;
    subscription.approved_at = Some(now);
    Ok(())
}

/// Checks that `assign` would be accepted, before the caller takes further locks.
pub fn ensure_assignable(subscription: &Subscription) -> Res<()> {
    ensure_transition(subscription, SubscriptionStatus::Active, "assigned")
}

/// `approved | inactive -> active`, starting a new validity period.
pub fn assign(
    subscription: &mut Subscription,
    validity_months: i32,
    now: DateTime<Utc>,
) -> Res<()> {
    ensure_assignable(subscription)?;
    let expires_at = compute_expiry(now, validity_months)?;
    subscription.status = SubscriptionStatus::Active;
    subscription.assigned_at = Some(now);
    subscription.expires_at = Some(expires_at);
    subscription.deactivated_at = None;
    Ok(())
}

/// `active -> inactive`. A row whose period already ran out counts as expired.
pub fn deactivate(subscription: &mut Subscription, now: DateTime<Utc>) -> Res<()> {
    if !is_active(subscription, now) {
        return Err(AppError::BadRequest(
            "Only active subscriptions can be deactivated".to_string(),
        ));
    }
    subscription.status = SubscriptionStatus::Inactive;
    subscription.deactivated_at = Some(now);
    Ok(())
}

/// `requested | approved -> inactive`, turning down a pending request.
pub fn reject(subscription: &mut Subscription, now: DateTime<Utc>) -> Res<()> {
    if !matches!(
        subscription.status,
        SubscriptionStatus::Requested | SubscriptionStatus::Approved
    ) {
        return Err(AppError::BadRequest(format!(
            "Subscription cannot be rejected in current status ({})",
            subscription.status
        )));
    }
    subscription.status = SubscriptionStatus::Inactive;
    subscription.deactivated_at = Some(now);
    Ok(())
}

/// `expired -> requested`, reusing the record for a new request.
pub fn renew(subscription: &mut Subscription, now: DateTime<Utc>) -> Res<()> {
    ensure_transition(subscription, SubscriptionStatus::Requested, "renewed")?;
    subscription.status = SubscriptionStatus::Requested;
    subscription.requested_at = now;
    subscription.approved_at = None;
    subscription.assigned_at = None;
    subscription.expires_at = None;
    subscription.deactivated_at = None;
    Ok(())
}
