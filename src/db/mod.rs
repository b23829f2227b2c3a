//! Database module for persistent storage.
//!
//! Provides async SQLite access using SQLx for the block record store.
//! Every store call goes through [`Database::bounded`], which caps it at the
//! configured operation timeout and reports overruns as
//! [`AclError::StoreUnavailable`].

mod blocks;

pub use blocks::{
    BlockOptions, BlockRecord, BlockRepository, BlockStatus, BlockUpdate, ListFilter,
};

use crate::config::DatabaseConfig;
use crate::error::{AclError, AclResult};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::future::Future;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Database handle with connection pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
    op_timeout: Duration,
}

impl Database {
    /// Maximum time a connection can remain idle before being closed.
    const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

    /// Open a database with default settings, running migrations if needed.
    pub async fn new(path: &str) -> AclResult<Self> {
        Self::open(&DatabaseConfig {
            path: path.to_string(),
            ..DatabaseConfig::default()
        })
        .await
    }

    /// Open the configured database, running migrations if needed.
    pub async fn open(config: &DatabaseConfig) -> AclResult<Self> {
        let path = config.path.as_str();
        let acquire_timeout = Duration::from_secs(config.acquire_timeout_secs);
        let busy_timeout = Duration::from_millis(config.busy_timeout_ms);

        let pool = if path == ":memory:" {
            // Each parse yields a uniquely named shared-cache database, so
            // parallel tests never collide. A single connection that never
            // idles out keeps the data alive.
            let options = SqliteConnectOptions::from_str("sqlite::memory:")?
                .busy_timeout(busy_timeout);

            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .acquire_timeout(acquire_timeout)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            if let Some(parent) = Path::new(path).parent()
                && !parent.as_os_str().is_empty()
                && let Err(e) = std::fs::create_dir_all(parent)
            {
                tracing::warn!(path = %parent.display(), error = %e, "Failed to create database directory");
            }

            // WAL lets lookups proceed while a sweep batch or block is writing.
            let options = SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
                .busy_timeout(busy_timeout);

            SqlitePoolOptions::new()
                .max_connections(config.max_connections)
                .acquire_timeout(acquire_timeout)
                .idle_timeout(Some(Self::IDLE_TIMEOUT))
                .test_before_acquire(true)
                .connect_with(options)
                .await?
        };

        info!(path = %path, "Database connected");

        Self::run_migrations(&pool).await?;

        let integrity_result: String = sqlx::query_scalar("PRAGMA integrity_check")
            .fetch_one(&pool)
            .await?;

        if integrity_result != "ok" {
            tracing::error!(
                integrity_check = %integrity_result,
                "Database integrity check FAILED - corruption detected!"
            );
            return Err(AclError::StoreUnavailable(format!(
                "integrity check failed: {integrity_result}"
            )));
        }

        Ok(Self {
            pool,
            op_timeout: Duration::from_millis(config.op_timeout_ms),
        })
    }

    /// Get reference to the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Upper bound applied to each store call.
    pub fn op_timeout(&self) -> Duration {
        self.op_timeout
    }

    /// Replace the per-call timeout.
    pub fn with_op_timeout(mut self, timeout: Duration) -> Self {
        self.op_timeout = timeout;
        self
    }

    /// Get block record repository.
    pub fn blocks(&self) -> BlockRepository<'_> {
        BlockRepository::new(self)
    }

    /// Close the pool. Later calls fail with `StoreUnavailable`.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Run a store call under the operation timeout.
    pub(crate) async fn bounded<T, F>(&self, call: F) -> AclResult<T>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.op_timeout, call).await {
            Ok(result) => result.map_err(AclError::from),
            Err(_) => Err(AclError::StoreUnavailable(format!(
                "store call exceeded {}ms",
                self.op_timeout.as_millis()
            ))),
        }
    }

    /// Run embedded migrations.
    async fn run_migrations(pool: &SqlitePool) -> AclResult<()> {
        sqlx::migrate!("./migrations").run(pool).await?;

        info!("Database migrations checked/applied");
        Ok(())
    }
}
