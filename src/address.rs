//! Address parsing and canonicalization.
//!
//! Blocks are keyed by the canonical textual form of an [`IpAddr`], so
//! `2001:DB8::0:1` and `2001:db8::1` refer to the same record. Input is
//! never trimmed: surrounding whitespace, ports, zone indices and CIDR
//! suffixes are rejected.

use crate::error::AclError;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// A validated IP address in canonical textual form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockAddress(IpAddr);

impl BlockAddress {
    /// Parse and canonicalize an address string.
    pub fn parse(input: &str) -> Result<Self, AclError> {
        input
            .parse::<IpAddr>()
            .map(Self)
            .map_err(|_| AclError::InvalidAddress(input.to_string()))
    }

    /// The parsed address.
    pub fn ip(&self) -> IpAddr {
        self.0
    }

    /// Canonical text used as the storage key.
    pub fn canonical(&self) -> String {
        self.0.to_string()
    }
}

impl From<IpAddr> for BlockAddress {
    fn from(ip: IpAddr) -> Self {
        Self(ip)
    }
}

impl FromStr for BlockAddress {
    type Err = AclError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for BlockAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
