use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use crate::service::FoodService;

/// Periodically purge trashed items whose retention window has run out.
///
/// Runs until the process exits. A failed pass is logged and retried on the
/// next tick.
pub async fn run_trash_purge(service: Arc<FoodService>, every: Duration) {
    info!(interval_secs = every.as_secs(), "trash auto-purge enabled");
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        if let Err(e) = service.purge_expired_trash(Utc::now()).await {
            warn!(error = %e, "trash auto-purge pass failed");
        }
    }
}
