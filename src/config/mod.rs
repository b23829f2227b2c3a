//! Configuration loading and management.
//!
//! - [`types`]: Core config structs (Config, DatabaseConfig, SweepConfig, ...)
//! - [`admin`]: Administrator blocks for the actor directory
//! - [`validation`]: Startup validation

mod admin;
mod types;
pub mod validation;

pub use admin::AdminBlock;
pub use types::{
    AdmissionConfig, Config, ConfigError, DatabaseConfig, FailurePolicy, LogFormat,
    LoggingConfig, ServerConfig, SweepConfig,
};
pub(crate) use types::default_batch_size;
