//! Request admission against the block store.
//!
//! Called on every inbound request before routing. The store reports
//! failures explicitly; what an unavailable store means for the request is
//! decided here by the configured [`FailurePolicy`].

use crate::config::FailurePolicy;
use crate::db::Database;
use crate::error::AclResult;
use std::fmt;
use std::net::IpAddr;
use tracing::{debug, warn};

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionDecision {
    /// No active block for the source address.
    Allow,
    /// The source address is blocked.
    Deny,
    /// The store could not answer; `allowed` reflects the failure policy.
    Unavailable { allowed: bool },
}

impl AdmissionDecision {
    /// Whether the request may proceed.
    pub fn is_allowed(&self) -> bool {
        match self {
            Self::Allow => true,
            Self::Deny => false,
            Self::Unavailable { allowed } => *allowed,
        }
    }

    /// Static label for metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
            Self::Unavailable { allowed: true } => "unavailable_open",
            Self::Unavailable { allowed: false } => "unavailable_closed",
        }
    }
}

impl fmt::Display for AdmissionDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.outcome())
    }
}

/// Admission gate backed by the block store.
#[derive(Clone)]
pub struct Admission {
    db: Database,
    policy: FailurePolicy,
}

impl Admission {
    pub fn new(db: Database, policy: FailurePolicy) -> Self {
        Self { db, policy }
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Decide whether a request from `ip` may proceed.
    ///
    /// An IPv4-mapped IPv6 peer (as reported by dual-stack listeners) is
    /// checked as its IPv4 address, and also under the mapped spelling in
    /// case it was blocked that way.
    pub async fn check(&self, ip: IpAddr) -> AdmissionDecision {
        let decision = match self.is_blocked(ip).await {
            Ok(false) => AdmissionDecision::Allow,
            Ok(true) => {
                debug!(ip = %ip, "Request from blocked address");
                AdmissionDecision::Deny
            }
            Err(e) => self.unavailable(ip, &e),
        };
        crate::metrics::record_admission(decision.outcome());
        decision
    }

    async fn is_blocked(&self, ip: IpAddr) -> AclResult<bool> {
        let repo = self.db.blocks();
        let canonical = ip.to_canonical();
        if repo.is_blocked(&canonical.to_string(), None).await? {
            return Ok(true);
        }
        if canonical != ip {
            return repo.is_blocked(&ip.to_string(), None).await;
        }
        Ok(false)
    }

    /// Decision when the source address could not be determined or checked.
    pub fn unavailable(&self, ip: impl fmt::Display, error: &dyn fmt::Display) -> AdmissionDecision {
        let allowed = self.policy == FailurePolicy::FailOpen;
        warn!(ip = %ip, error = %error, allowed, "Admission check failed");
        AdmissionDecision::Unavailable { allowed }
    }
}
