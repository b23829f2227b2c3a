//! Database query methods for block operations.

pub mod read;
pub mod sweep;
pub mod write;

use super::models::{BlockOptions, BlockRecord, BlockStatus, BlockUpdate, ListFilter};
use crate::config::default_batch_size;
use crate::db::Database;
use crate::error::AclResult;
use chrono::{DateTime, Utc};

/// Generates repository wrapper methods that forward to module-level functions.
macro_rules! block_repository_methods {
    (
        $(
            $(#[$meta:meta])*
            fn $method_name:ident($($arg:ident: $arg_ty:ty),*) -> $ret_ty:ty
                => $module:ident::$fn_name:ident;
        )*
    ) => {
        $(
            $(#[$meta])*
            pub async fn $method_name(&self, $($arg: $arg_ty),*) -> $ret_ty {
                $module::$fn_name(self.db, $($arg),*).await
            }
        )*
    };
}

/// Repository for block record operations.
///
/// Address arguments are validated before any store interaction; a malformed
/// address fails with `InvalidAddress`.
pub struct BlockRepository<'a> {
    db: &'a Database,
}

impl<'a> BlockRepository<'a> {
    /// Create a new block repository.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    block_repository_methods! {
        /// Create a block with an explicit creation instant.
        fn block_at(ip: &str, options: BlockOptions, now: DateTime<Utc>) -> AclResult<BlockRecord>
            => write::block_at;

        /// Create or overwrite a block with an explicit instant.
        fn replace_at(ip: &str, options: BlockOptions, now: DateTime<Utc>) -> AclResult<BlockRecord>
            => write::replace_at;

        /// Update a block with an explicit instant.
        fn update_at(ip: &str, changes: BlockUpdate, now: DateTime<Utc>) -> AclResult<BlockRecord>
            => write::update_at;

        /// Remove the block for an address. Returns whether a record was removed.
        fn unblock(ip: &str) -> AclResult<bool>
            => write::unblock;

        /// Check if an address is blocked at `as_of` (default: now).
        fn is_blocked(ip: &str, as_of: Option<DateTime<Utc>>) -> AclResult<bool>
            => read::is_blocked;

        /// Get the block in force for an address at `as_of` (default: now).
        fn active_block(ip: &str, as_of: Option<DateTime<Utc>>) -> AclResult<Option<BlockRecord>>
            => read::active_block;

        /// Get the stored record for an address, expired or not.
        fn find(ip: &str) -> AclResult<Option<BlockRecord>>
            => read::find;

        /// List records matching a filter.
        fn list(filter: ListFilter) -> AclResult<Vec<BlockRecord>>
            => read::list;

        /// Count records of a status at `as_of` (default: now).
        fn count(status: BlockStatus, as_of: Option<DateTime<Utc>>) -> AclResult<u64>
            => read::count;

        /// Sweep expired records in batches of `batch_size`.
        fn sweep_expired_batched(as_of: Option<DateTime<Utc>>, batch_size: u32) -> AclResult<u64>
            => sweep::sweep_expired;
    }

    /// Block an address. Fails with `DuplicateBlock` if an active block exists.
    pub async fn block(&self, ip: &str, options: BlockOptions) -> AclResult<BlockRecord> {
        self.block_at(ip, options, Utc::now()).await
    }

    /// Create or overwrite the block for an address (upsert by address).
    pub async fn replace(&self, ip: &str, options: BlockOptions) -> AclResult<BlockRecord> {
        self.replace_at(ip, options, Utc::now()).await
    }

    /// Update reason and/or expiry. Fails with `NotFound` if no record exists.
    pub async fn update(&self, ip: &str, changes: BlockUpdate) -> AclResult<BlockRecord> {
        self.update_at(ip, changes, Utc::now()).await
    }

    /// Delete all records expired at `as_of` (default: now). Returns the count removed.
    pub async fn sweep_expired(&self, as_of: Option<DateTime<Utc>>) -> AclResult<u64> {
        self.sweep_expired_batched(as_of, default_batch_size()).await
    }
}
