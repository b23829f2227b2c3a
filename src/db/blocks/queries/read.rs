//! Read-only block lookups. None of these mutate the store.

use super::super::models::{
    BLOCK_COLUMNS, BlockRecord, BlockRow, BlockStatus, ListFilter, from_row, to_millis,
};
use crate::address::BlockAddress;
use crate::db::Database;
use crate::error::AclResult;
use chrono::{DateTime, Utc};

/// SQL predicate selecting records of a status relative to a bound `as_of`.
fn status_clause(status: BlockStatus) -> &'static str {
    match status {
        BlockStatus::All => "(? IS NOT NULL)",
        BlockStatus::Active => "(expires_at IS NULL OR expires_at > ?)",
        BlockStatus::Expired => "(expires_at IS NOT NULL AND expires_at <= ?)",
    }
}

/// Check if an address has a block in force at `as_of`.
pub async fn is_blocked(
    db: &Database,
    ip: &str,
    as_of: Option<DateTime<Utc>>,
) -> AclResult<bool> {
    let addr = BlockAddress::parse(ip)?;
    let as_of = to_millis(as_of.unwrap_or_else(Utc::now));

    let hit: i64 = db
        .bounded(
            sqlx::query_scalar::<_, i64>(
                r#"
                SELECT EXISTS(
                    SELECT 1 FROM block_records
                    WHERE ip_address = ? AND (expires_at IS NULL OR expires_at > ?)
                )
                "#,
            )
            .bind(addr.canonical())
            .bind(as_of)
            .fetch_one(db.pool()),
        )
        .await?;

    Ok(hit != 0)
}

/// Get the block in force for an address at `as_of`, if any.
pub async fn active_block(
    db: &Database,
    ip: &str,
    as_of: Option<DateTime<Utc>>,
) -> AclResult<Option<BlockRecord>> {
    let addr = BlockAddress::parse(ip)?;
    let as_of = to_millis(as_of.unwrap_or_else(Utc::now));
    let query = format!(
        r#"
        SELECT {BLOCK_COLUMNS}
        FROM block_records
        WHERE ip_address = ? AND (expires_at IS NULL OR expires_at > ?)
        "#
    );

    let row = db
        .bounded(
            sqlx::query_as::<_, BlockRow>(&query)
                .bind(addr.canonical())
                .bind(as_of)
                .fetch_optional(db.pool()),
        )
        .await?;

    row.map(from_row).transpose()
}

/// Get the stored record for an address, expired or not.
pub async fn find(db: &Database, ip: &str) -> AclResult<Option<BlockRecord>> {
    let addr = BlockAddress::parse(ip)?;
    let query = format!("SELECT {BLOCK_COLUMNS} FROM block_records WHERE ip_address = ?");

    let row = db
        .bounded(
            sqlx::query_as::<_, BlockRow>(&query)
                .bind(addr.canonical())
                .fetch_optional(db.pool()),
        )
        .await?;

    row.map(from_row).transpose()
}

/// List records matching a filter, newest first with ties broken by address.
pub async fn list(db: &Database, filter: ListFilter) -> AclResult<Vec<BlockRecord>> {
    let as_of = to_millis(filter.as_of.unwrap_or_else(Utc::now));
    // SQLite treats a negative LIMIT as unbounded.
    let limit = filter.limit.map_or(-1, i64::from);
    let query = format!(
        r#"
        SELECT {BLOCK_COLUMNS}
        FROM block_records
        WHERE {}
        ORDER BY created_at DESC, ip_address ASC
        LIMIT ? OFFSET ?
        "#,
        status_clause(filter.status)
    );

    let rows = db
        .bounded(
            sqlx::query_as::<_, BlockRow>(&query)
                .bind(as_of)
                .bind(limit)
                .bind(i64::from(filter.offset))
                .fetch_all(db.pool()),
        )
        .await?;

    rows.into_iter().map(from_row).collect()
}

/// Count records of a status at `as_of`.
pub async fn count(
    db: &Database,
    status: BlockStatus,
    as_of: Option<DateTime<Utc>>,
) -> AclResult<u64> {
    let as_of = to_millis(as_of.unwrap_or_else(Utc::now));
    let query = format!(
        "SELECT COUNT(*) FROM block_records WHERE {}",
        status_clause(status)
    );

    let n: i64 = db
        .bounded(sqlx::query_scalar::<_, i64>(&query).bind(as_of).fetch_one(db.pool()))
        .await?;

    Ok(u64::try_from(n).unwrap_or(0))
}
