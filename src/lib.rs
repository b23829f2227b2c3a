//! ipacl-store - IP access-control store.
//!
//! A SQLite-backed set of blocked IP addresses with optional expiry and
//! audit attribution, plus the request-admission gate, admin HTTP API and
//! expiry sweeper built on it.

pub mod actors;
pub mod address;
pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod metrics;
pub mod security;
pub mod services;
pub mod telemetry;

pub use address::BlockAddress;
pub use db::{BlockOptions, BlockRecord, BlockStatus, BlockUpdate, Database, ListFilter};
pub use error::{AclError, AclResult};
