//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("database.max_connections must be at least 1")]
    ZeroConnections,
    #[error("database.op_timeout_ms must be at least 1")]
    ZeroOpTimeout,
    #[error("database.path parent directory does not exist: {0}")]
    DatabasePathInvalid(String),
    #[error("sweep.interval_secs must be at least 1 when sweeping is enabled")]
    ZeroSweepInterval,
    #[error("sweep.batch_size must be at least 1")]
    ZeroBatchSize,
    #[error("admin.id must not be empty")]
    EmptyAdminId,
    #[error("duplicate admin.id: {0}")]
    DuplicateAdminId(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.database.max_connections == 0 {
        errors.push(ValidationError::ZeroConnections);
    }
    if config.database.op_timeout_ms == 0 {
        errors.push(ValidationError::ZeroOpTimeout);
    }

    // Database path validation
    if config.database.path != ":memory:" {
        let db_path = Path::new(&config.database.path);
        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            errors.push(ValidationError::DatabasePathInvalid(
                config.database.path.clone(),
            ));
        }
    }

    if config.sweep.enabled && config.sweep.interval_secs == 0 {
        errors.push(ValidationError::ZeroSweepInterval);
    }
    if config.sweep.batch_size == 0 {
        errors.push(ValidationError::ZeroBatchSize);
    }

    let mut seen = HashSet::new();
    for admin in &config.admin {
        if admin.id.is_empty() {
            errors.push(ValidationError::EmptyAdminId);
        } else if !seen.insert(admin.id.as_str()) {
            errors.push(ValidationError::DuplicateAdminId(admin.id.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
