//! Expiry sweep background task.
//!
//! Purges blocks whose expiry has passed and refreshes the active-block
//! gauge. Lookups already ignore expired records, so a late or failed sweep
//! only costs disk space.

use crate::config::SweepConfig;
use crate::db::{BlockStatus, Database};
use crate::error::AclResult;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{Instrument, info, warn};

/// Spawn the sweep task. The first sweep runs immediately.
pub fn spawn_sweep_task(db: Database, config: &SweepConfig) -> JoinHandle<()> {
    let period = Duration::from_secs(config.interval_secs.max(1));
    let batch_size = config.batch_size;

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let pass = sweep_once(&db, batch_size).instrument(crate::telemetry::spans::sweep(batch_size));
            if let Err(e) = pass.await {
                crate::metrics::record_store_error(e.error_code());
                warn!(error = %e, "Expiry sweep failed");
            }
        }
    })
}

/// Run one sweep pass. Returns the number of records removed.
pub async fn sweep_once(db: &Database, batch_size: u32) -> AclResult<u64> {
    let repo = db.blocks();
    let removed = repo.sweep_expired_batched(None, batch_size).await?;
    crate::metrics::record_sweep(removed);
    if removed > 0 {
        info!(removed = removed, "Expired blocks removed");
    }

    let active = repo.count(BlockStatus::Active, None).await?;
    crate::metrics::set_active_blocks(active);
    Ok(removed)
}
