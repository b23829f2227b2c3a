//! Block creation, replacement, update and removal.

use super::super::models::{
    BLOCK_COLUMNS, BlockOptions, BlockRecord, BlockRow, BlockUpdate, check_expiry, check_reason,
    from_row, to_millis,
};
use crate::address::BlockAddress;
use crate::db::Database;
use crate::error::{AclError, AclResult};
use chrono::{DateTime, Utc};
use tracing::debug;

/// Create a block, failing if an active one exists for the address.
///
/// A stored but expired record for the same address is replaced in the same
/// statement, so the uniqueness check and the write cannot interleave with a
/// concurrent `block`.
pub async fn block_at(
    db: &Database,
    ip: &str,
    options: BlockOptions,
    now: DateTime<Utc>,
) -> AclResult<BlockRecord> {
    let addr = BlockAddress::parse(ip)?;
    check_reason(options.reason.as_deref())?;
    check_expiry(options.expires_at, now)?;

    let now_ms = to_millis(now);
    let query = format!(
        r#"
        INSERT INTO block_records (id, ip_address, reason, created_by, expires_at, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(ip_address) DO UPDATE SET
            id = excluded.id,
            reason = excluded.reason,
            created_by = excluded.created_by,
            expires_at = excluded.expires_at,
            created_at = excluded.created_at,
            updated_at = excluded.updated_at
        WHERE block_records.expires_at IS NOT NULL
          AND block_records.expires_at <= excluded.created_at
        RETURNING {BLOCK_COLUMNS}
        "#
    );

    let row = db
        .bounded(
            sqlx::query_as::<_, BlockRow>(&query)
                .bind(uuid::Uuid::new_v4().to_string())
                .bind(addr.canonical())
                .bind(options.reason.as_deref())
                .bind(options.created_by.as_ref().map(|a| a.as_str()))
                .bind(options.expires_at.map(to_millis))
                .bind(now_ms)
                .bind(now_ms)
                .fetch_optional(db.pool()),
        )
        .await?;

    match row {
        Some(row) => {
            let record = from_row(row)?;
            debug!(ip = %record.ip_address, id = %record.id, permanent = record.is_permanent(), "Block created");
            Ok(record)
        }
        None => Err(AclError::DuplicateBlock(addr.canonical())),
    }
}

/// Create or overwrite the block for an address.
///
/// Overwriting an active record keeps its id and `created_at`; overwriting an
/// expired one starts a fresh record.
pub async fn replace_at(
    db: &Database,
    ip: &str,
    options: BlockOptions,
    now: DateTime<Utc>,
) -> AclResult<BlockRecord> {
    let addr = BlockAddress::parse(ip)?;
    check_reason(options.reason.as_deref())?;
    check_expiry(options.expires_at, now)?;

    let now_ms = to_millis(now);
    let query = format!(
        r#"
        INSERT INTO block_records (id, ip_address, reason, created_by, expires_at, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(ip_address) DO UPDATE SET
            id = CASE WHEN {expired} THEN excluded.id ELSE block_records.id END,
            created_at = CASE WHEN {expired} THEN excluded.created_at ELSE block_records.created_at END,
            reason = excluded.reason,
            created_by = excluded.created_by,
            expires_at = excluded.expires_at,
            updated_at = excluded.updated_at
        RETURNING {BLOCK_COLUMNS}
        "#,
        expired = "(block_records.expires_at IS NOT NULL AND block_records.expires_at <= excluded.created_at)",
    );

    let row = db
        .bounded(
            sqlx::query_as::<_, BlockRow>(&query)
                .bind(uuid::Uuid::new_v4().to_string())
                .bind(addr.canonical())
                .bind(options.reason.as_deref())
                .bind(options.created_by.as_ref().map(|a| a.as_str()))
                .bind(options.expires_at.map(to_millis))
                .bind(now_ms)
                .bind(now_ms)
                .fetch_one(db.pool()),
        )
        .await?;

    let record = from_row(row)?;
    debug!(ip = %record.ip_address, id = %record.id, "Block replaced");
    Ok(record)
}

/// Change reason and/or expiry of an existing record.
pub async fn update_at(
    db: &Database,
    ip: &str,
    changes: BlockUpdate,
    now: DateTime<Utc>,
) -> AclResult<BlockRecord> {
    let addr = BlockAddress::parse(ip)?;
    if let Some(reason) = &changes.reason {
        check_reason(reason.as_deref())?;
    }
    if let Some(expires_at) = changes.expires_at {
        check_expiry(expires_at, now)?;
    }

    let (set_reason, reason) = match changes.reason {
        Some(reason) => (true, reason),
        None => (false, None),
    };
    let (set_expiry, expires_at) = match changes.expires_at {
        Some(expires_at) => (true, expires_at.map(to_millis)),
        None => (false, None),
    };

    let query = format!(
        r#"
        UPDATE block_records SET
            reason = CASE WHEN ? THEN ? ELSE reason END,
            expires_at = CASE WHEN ? THEN ? ELSE expires_at END,
            updated_at = ?
        WHERE ip_address = ?
        RETURNING {BLOCK_COLUMNS}
        "#
    );

    let row = db
        .bounded(
            sqlx::query_as::<_, BlockRow>(&query)
                .bind(set_reason)
                .bind(reason)
                .bind(set_expiry)
                .bind(expires_at)
                .bind(to_millis(now))
                .bind(addr.canonical())
                .fetch_optional(db.pool()),
        )
        .await?;

    match row {
        Some(row) => {
            let record = from_row(row)?;
            debug!(ip = %record.ip_address, "Block updated");
            Ok(record)
        }
        None => Err(AclError::NotFound(addr.canonical())),
    }
}

/// Remove the record for an address. Absent addresses are not an error.
pub async fn unblock(db: &Database, ip: &str) -> AclResult<bool> {
    let addr = BlockAddress::parse(ip)?;

    let result = db
        .bounded(
            sqlx::query("DELETE FROM block_records WHERE ip_address = ?")
                .bind(addr.canonical())
                .execute(db.pool()),
        )
        .await?;

    let removed = result.rows_affected() > 0;
    debug!(ip = %addr, removed, "Unblock");
    Ok(removed)
}
