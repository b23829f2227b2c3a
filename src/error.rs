//! Unified error handling for the access-control store.
//!
//! Every store operation returns [`AclError`]. Variants carry a stable
//! `error_code()` used for metric labels and HTTP error bodies.

use thiserror::Error;

/// Maximum accepted length of a block reason, in characters.
pub const MAX_REASON_LEN: usize = 512;

/// Errors produced by the access-control store.
#[derive(Debug, Error)]
pub enum AclError {
    /// Input is not a canonical-parsable IPv4/IPv6 address.
    #[error("invalid IP address: {0:?}")]
    InvalidAddress(String),

    #[error("expiry must be strictly in the future")]
    InvalidExpiry,

    #[error("reason is {0} characters, limit is {MAX_REASON_LEN}")]
    ReasonTooLong(usize),

    /// An active block already exists for this address.
    #[error("address already blocked: {0}")]
    DuplicateBlock(String),

    #[error("no block record for address: {0}")]
    NotFound(String),

    /// The underlying store failed or did not answer in time.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl AclError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAddress(_) => "invalid_address",
            Self::InvalidExpiry => "invalid_expiry",
            Self::ReasonTooLong(_) => "reason_too_long",
            Self::DuplicateBlock(_) => "duplicate_block",
            Self::NotFound(_) => "not_found",
            Self::StoreUnavailable(_) => "store_unavailable",
            Self::Migration(_) => "migration",
        }
    }

    /// True for failures of the store itself rather than of the caller's input.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_) | Self::Migration(_))
    }
}

impl From<sqlx::Error> for AclError {
    fn from(err: sqlx::Error) -> Self {
        AclError::StoreUnavailable(err.to_string())
    }
}

/// Result alias for store operations.
pub type AclResult<T> = Result<T, AclError>;
