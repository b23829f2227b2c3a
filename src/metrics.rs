//! Prometheus metrics collection.
//!
//! - `ipacl_blocks_created_total` - Blocks created or replaced
//! - `ipacl_unblocks_total` - Records removed by unblock
//! - `ipacl_sweep_removed_total` - Records purged by the expiry sweep
//! - `ipacl_admission_total{outcome}` - Admission decisions
//! - `ipacl_store_errors_total{code}` - Store failures (unavailable, migration) by error code
//! - `ipacl_active_blocks` - Active blocks at the last sweep

use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

pub static BLOCKS_CREATED: OnceLock<IntCounter> = OnceLock::new();

pub static UNBLOCKS: OnceLock<IntCounter> = OnceLock::new();

pub static SWEEP_REMOVED: OnceLock<IntCounter> = OnceLock::new();

/// Admission decisions by outcome (allow, deny, unavailable_open, unavailable_closed).
pub static ADMISSION: OnceLock<IntCounterVec> = OnceLock::new();

pub static STORE_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

pub static ACTIVE_BLOCKS: OnceLock<IntGauge> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Must be called once at startup before any metrics are recorded; until
/// then the record helpers are no-ops.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            if $metric.get().is_none() {
                match $init {
                    Ok(m) => {
                        if let Err(e) = r.register(Box::new(m.clone())) {
                            tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
                        }
                        let _ = $metric.set(m);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, concat!("Failed to create metric ", stringify!($metric)));
                    }
                }
            }
        };
    }

    register!(BLOCKS_CREATED, IntCounter::new("ipacl_blocks_created_total", "Blocks created or replaced"));
    register!(UNBLOCKS, IntCounter::new("ipacl_unblocks_total", "Records removed by unblock"));
    register!(SWEEP_REMOVED, IntCounter::new("ipacl_sweep_removed_total", "Records purged by the expiry sweep"));
    register!(ADMISSION, IntCounterVec::new(Opts::new("ipacl_admission_total", "Admission decisions by outcome"), &["outcome"]));
    register!(STORE_ERRORS, IntCounterVec::new(Opts::new("ipacl_store_errors_total", "Store errors by code"), &["code"]));
    register!(ACTIVE_BLOCKS, IntGauge::new("ipacl_active_blocks", "Active blocks at the last sweep"));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

#[inline]
pub fn record_block_created() {
    if let Some(c) = BLOCKS_CREATED.get() {
        c.inc();
    }
}

#[inline]
pub fn record_unblock() {
    if let Some(c) = UNBLOCKS.get() {
        c.inc();
    }
}

#[inline]
pub fn record_sweep(removed: u64) {
    if let Some(c) = SWEEP_REMOVED.get() {
        c.inc_by(removed);
    }
}

#[inline]
pub fn record_admission(outcome: &str) {
    if let Some(c) = ADMISSION.get() {
        c.with_label_values(&[outcome]).inc();
    }
}

#[inline]
pub fn record_store_error(code: &str) {
    if let Some(c) = STORE_ERRORS.get() {
        c.with_label_values(&[code]).inc();
    }
}

#[inline]
pub fn set_active_blocks(count: u64) {
    if let Some(g) = ACTIVE_BLOCKS.get() {
        g.set(i64::try_from(count).unwrap_or(i64::MAX));
    }
}
