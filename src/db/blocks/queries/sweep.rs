//! Expiry sweep.

use super::super::models::to_millis;
use crate::db::Database;
use crate::error::AclResult;
use chrono::{DateTime, Utc};
use tracing::debug;

/// Delete every record whose expiry is at or before `as_of`.
///
/// Each batch is its own statement over the `expires_at` index, so the write
/// lock is released between batches and lookups interleave freely.
pub async fn sweep_expired(
    db: &Database,
    as_of: Option<DateTime<Utc>>,
    batch_size: u32,
) -> AclResult<u64> {
    let as_of = to_millis(as_of.unwrap_or_else(Utc::now));
    let batch_size = u64::from(batch_size.max(1));
    let mut removed = 0u64;

    loop {
        let result = db
            .bounded(
                sqlx::query(
                    r#"
                    DELETE FROM block_records WHERE id IN (
                        SELECT id FROM block_records
                        WHERE expires_at IS NOT NULL AND expires_at <= ?
                        ORDER BY expires_at
                        LIMIT ?
                    )
                    "#,
                )
                .bind(as_of)
                .bind(batch_size as i64)
                .execute(db.pool()),
            )
            .await?;

        let deleted = result.rows_affected();
        removed += deleted;
        if deleted < batch_size {
            break;
        }
        tokio::task::yield_now().await;
    }

    debug!(removed, "Expired blocks swept");
    Ok(removed)
}
