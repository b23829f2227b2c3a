//! ipacld - IP access-control daemon.
//!
//! Serves the admin API behind the admission gate, sweeps expired blocks and
//! exposes Prometheus metrics.

use ipacl_store::actors::ConfiguredActors;
use ipacl_store::config::{Config, validation};
use ipacl_store::db::Database;
use ipacl_store::http::{self, AdmissionGate, AppState};
use ipacl_store::security::Admission;
use ipacl_store::services::sweeper::spawn_sweep_task;
use ipacl_store::{metrics, telemetry};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "ipacl.toml".to_string());

    let config = Config::load(&config_path)
        .map_err(|e| anyhow::anyhow!("failed to load config {config_path}: {e}"))?;

    telemetry::init(&config.logging)?;

    if let Err(errors) = validation::validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        return Err(anyhow::anyhow!(
            "{} configuration error(s) in {}",
            errors.len(),
            config_path
        ));
    }

    info!(
        listen = %config.server.listen,
        database = %config.database.path,
        policy = ?config.admission.policy,
        "Starting ipacld"
    );

    let db = Database::open(&config.database).await?;

    // Prometheus metrics are optional.
    // Convention: metrics_port = 0 disables the HTTP endpoint (used by tests).
    let metrics_port = config.server.metrics_port.unwrap_or(9090);
    if metrics_port == 0 {
        info!("Metrics disabled");
    } else {
        metrics::init();
        tokio::spawn(async move {
            http::run_metrics_server(metrics_port).await;
        });
        info!(port = metrics_port, "Prometheus HTTP server started");
    }

    let sweeper = if config.sweep.enabled {
        info!(
            interval_secs = config.sweep.interval_secs,
            batch_size = config.sweep.batch_size,
            "Expiry sweep task started"
        );
        Some(spawn_sweep_task(db.clone(), &config.sweep))
    } else {
        info!("Expiry sweep disabled");
        None
    };

    let actors = ConfiguredActors::from_blocks(&config.admin);
    info!(count = actors.len(), "Loaded administrators");

    let state = AppState {
        db: db.clone(),
        actors: Arc::new(actors),
        sweep_batch_size: config.sweep.batch_size,
    };
    let gate = config.admission.enabled.then(|| {
        Arc::new(AdmissionGate {
            admission: Admission::new(db.clone(), config.admission.policy),
            trust_forwarded_for: config.admission.trust_forwarded_for,
        })
    });
    if gate.is_none() {
        tracing::warn!("Admission gate disabled; blocked addresses can reach the API");
    }

    let app = http::router(state, gate);
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for shutdown signal");
        }
        info!("Shutdown requested");
    };
    http::run_api_server(config.server.listen, app, shutdown).await?;

    if let Some(handle) = sweeper {
        handle.abort();
    }
    db.close().await;
    info!("ipacld stopped");

    Ok(())
}
