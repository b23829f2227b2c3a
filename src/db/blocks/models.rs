//! Block record models and data structures.

use crate::actors::ActorId;
use crate::address::BlockAddress;
use crate::error::{AclError, AclResult, MAX_REASON_LEN};
use chrono::{DateTime, Duration, Utc};

/// A blocked IP address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockRecord {
    /// Server-assigned identifier (UUID v4).
    pub id: String,
    /// Canonical address; unique across the store.
    pub ip_address: BlockAddress,
    /// Reason for the block.
    pub reason: Option<String>,
    /// Administrator who set the block.
    pub created_by: Option<ActorId>,
    /// Optional expiration; `None` is permanent.
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BlockRecord {
    /// True if the block is in force at `as_of`.
    pub fn is_active(&self, as_of: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|exp| exp > as_of)
    }

    pub fn is_permanent(&self) -> bool {
        self.expires_at.is_none()
    }
}

/// Options for creating or replacing a block.
#[derive(Debug, Clone, Default)]
pub struct BlockOptions {
    pub reason: Option<String>,
    pub created_by: Option<ActorId>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl BlockOptions {
    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn created_by(mut self, actor: ActorId) -> Self {
        self.created_by = Some(actor);
        self
    }

    pub fn expires_at(mut self, at: DateTime<Utc>) -> Self {
        self.expires_at = Some(at);
        self
    }

    /// Expire `duration` from now.
    ///
    /// Saturates at the representable range instead of overflowing; a
    /// negative overflow yields an instant in the past, which the store
    /// rejects as `InvalidExpiry`.
    pub fn expires_in(self, duration: Duration) -> Self {
        let at = Utc::now().checked_add_signed(duration).unwrap_or(
            if duration < Duration::zero() {
                DateTime::<Utc>::MIN_UTC
            } else {
                DateTime::<Utc>::MAX_UTC
            },
        );
        self.expires_at(at)
    }
}

/// Changes applied by an update. The outer `Option` means "leave as is";
/// `Some(None)` clears the field.
#[derive(Debug, Clone, Default)]
pub struct BlockUpdate {
    pub reason: Option<Option<String>>,
    pub expires_at: Option<Option<DateTime<Utc>>>,
}

impl BlockUpdate {
    pub fn is_empty(&self) -> bool {
        self.reason.is_none() && self.expires_at.is_none()
    }
}

/// Which records a listing includes, relative to its `as_of` instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockStatus {
    #[default]
    All,
    Active,
    Expired,
}

impl BlockStatus {
    /// Parse a query-string value (`all`, `active`, `expired`).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "all" => Some(Self::All),
            "active" => Some(Self::Active),
            "expired" => Some(Self::Expired),
            _ => None,
        }
    }
}

/// Listing filter. Results are ordered newest first, ties by address.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub status: BlockStatus,
    /// Reference instant for `Active`/`Expired` (defaults to now).
    pub as_of: Option<DateTime<Utc>>,
    pub limit: Option<u32>,
    pub offset: u32,
}

impl ListFilter {
    pub fn active() -> Self {
        Self {
            status: BlockStatus::Active,
            ..Self::default()
        }
    }

    pub fn expired() -> Self {
        Self {
            status: BlockStatus::Expired,
            ..Self::default()
        }
    }

    pub fn as_of(mut self, at: DateTime<Utc>) -> Self {
        self.as_of = Some(at);
        self
    }

    pub fn page(mut self, limit: u32, offset: u32) -> Self {
        self.limit = Some(limit);
        self.offset = offset;
        self
    }
}

/// Raw row: (id, ip_address, reason, created_by, expires_at, created_at, updated_at).
pub(super) type BlockRow = (
    String,
    String,
    Option<String>,
    Option<String>,
    Option<i64>,
    i64,
    i64,
);

pub(super) const BLOCK_COLUMNS: &str =
    "id, ip_address, reason, created_by, expires_at, created_at, updated_at";

pub(super) fn from_row(row: BlockRow) -> AclResult<BlockRecord> {
    let (id, ip_address, reason, created_by, expires_at, created_at, updated_at) = row;
    let ip_address = ip_address
        .parse::<BlockAddress>()
        .map_err(|_| AclError::StoreUnavailable(format!("corrupt ip_address in store: {ip_address}")))?;

    Ok(BlockRecord {
        id,
        ip_address,
        reason,
        created_by: created_by.map(ActorId::new),
        expires_at: expires_at.map(from_millis).transpose()?,
        created_at: from_millis(created_at)?,
        updated_at: from_millis(updated_at)?,
    })
}

/// Store representation of an instant (Unix milliseconds).
pub(super) fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

pub(super) fn from_millis(ms: i64) -> AclResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| AclError::StoreUnavailable(format!("corrupt timestamp in store: {ms}")))
}

/// Reject reasons over the length limit.
pub(super) fn check_reason(reason: Option<&str>) -> AclResult<()> {
    match reason {
        Some(r) if r.chars().count() > MAX_REASON_LEN => {
            Err(AclError::ReasonTooLong(r.chars().count()))
        }
        _ => Ok(()),
    }
}

/// Require an expiry strictly after `now`, at store precision.
pub(super) fn check_expiry(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> AclResult<()> {
    match expires_at {
        Some(exp) if to_millis(exp) <= to_millis(now) => Err(AclError::InvalidExpiry),
        _ => Ok(()),
    }
}
