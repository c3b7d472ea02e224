use std::{sync::Arc, time::Duration};

use common::error::Res;
use sqlx::PgPool;
use tokio::{
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};

/// Marks every active subscription whose expiry has passed as expired.
///
/// Reads already report such rows as expired, so the sweep only brings the
/// stored status in line. Returns the number of rows changed.
pub async fn run_sweep(pool: &PgPool) -> Res<u64> {
    let expired = db::subscription::expire_due_subscriptions(pool).await?;
    if expired > 0 {
        log::info!("Expiry sweep marked {} subscription(s) as expired", expired);
    } else {
        log::debug!("Expiry sweep found nothing to expire");
    }
    Ok(expired)
}

/// Runs [`run_sweep`] every `interval_secs` seconds until the runtime stops.
/// The first sweep happens immediately.
pub fn spawn(pool: Arc<PgPool>, interval_secs: u64) -> JoinHandle<()> {
    let period = Duration::from_secs(interval_secs.max(1));
    log::info!("Starting expiry sweep every {}s", period.as_secs());

    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = run_sweep(&pool).await {
                log::error!("Expiry sweep failed: {}", e);
            }
        }
    })
}
