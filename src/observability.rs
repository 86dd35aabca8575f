//! Observability module for tracing and metrics setup.
//!
//! This module provides:
//! - Structured logging with configurable level and format
//! - Counter and histogram helpers for the resolution engine
//!
//! Metrics go through the `metrics` facade. Installing a recorder is up to
//! the host process; without one the helpers are no-ops.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::Result;
use tracing_subscriber::prelude::*;

use crate::observability_config::ObservabilityConfig;

static METRICS_ENABLED: AtomicBool = AtomicBool::new(true);

/// Initialize the observability stack from environment variables
pub fn init_observability() -> Result<()> {
    init_observability_with_config(&ObservabilityConfig::from_env())
}

/// Initialize the observability stack with custom configuration
pub fn init_observability_with_config(config: &ObservabilityConfig) -> Result<()> {
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid observability configuration: {}", e))?;

    init_tracing_with_config(config)?;
    METRICS_ENABLED.store(config.enable_metrics_export, Ordering::Relaxed);

    tracing::info!(
        environment = %config.environment,
        metrics_enabled = %config.enable_metrics_export,
        "Observability stack initialized"
    );
    Ok(())
}

/// Initialize structured logging with tracing and configuration
fn init_tracing_with_config(config: &ObservabilityConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("slip_resolver={}", config.log_level).parse()?)
        .add_directive("sqlx=warn".parse()?);

    // Pretty for development, JSON otherwise
    if config.use_pretty_logs() {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_thread_names(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    }

    tracing::info!(
        environment = %config.environment,
        log_level = %config.log_level,
        log_format = %config.log_format,
        "Tracing initialized with structured logging"
    );
    Ok(())
}

fn metrics_enabled() -> bool {
    METRICS_ENABLED.load(Ordering::Relaxed)
}

/// Create a span for one resolution batch
pub fn batch_span(line_count: usize, catalog_source: &str) -> tracing::Span {
    tracing::info_span!(
        "resolve_batch",
        line_count = line_count,
        catalog_source = catalog_source,
        component = "resolver"
    )
}

/// Create a span for database operations
pub fn db_span(operation: &str, table: &str) -> tracing::Span {
    tracing::info_span!(
        "db_operation",
        operation = operation,
        table = table,
        component = "database"
    )
}

/// Record how many candidates a matching tier produced
pub fn record_tier_metrics(tier: &'static str, candidates: usize) {
    if !metrics_enabled() {
        return;
    }
    metrics::counter!("matching_tier_runs_total", "tier" => tier).increment(1);
    if candidates > 0 {
        metrics::counter!("matching_tier_hits_total", "tier" => tier).increment(1);
    }
}

/// Record the outcome of one resolution batch
pub fn record_resolution_metrics(lines: usize, accepted: usize, duration: Duration) {
    if !metrics_enabled() {
        return;
    }
    metrics::counter!("resolution_batches_total").increment(1);
    metrics::counter!("resolution_lines_total").increment(lines as u64);
    metrics::counter!("resolution_accepted_total").increment(accepted as u64);
    metrics::histogram!("resolution_duration_seconds").record(duration.as_secs_f64());
}

/// Record a cart mutation and the resulting cart size
pub fn record_cart_metrics(operation: &'static str, cart_len: usize) {
    if !metrics_enabled() {
        return;
    }
    metrics::counter!("cart_operations_total", "operation" => operation).increment(1);
    metrics::gauge!("cart_items").set(cart_len as f64);
}

/// Record a catalog fetch
pub fn record_catalog_fetch_metrics(success: bool, duration: Duration, entries: usize) {
    if !metrics_enabled() {
        return;
    }
    metrics::counter!("catalog_fetches_total", "result" => if success { "success" } else { "failure" }).increment(1);
    metrics::histogram!("catalog_fetch_duration_seconds").record(duration.as_secs_f64());
    if success {
        metrics::gauge!("catalog_entries").set(entries as f64);
    }
}

/// Record database operation metrics
pub fn record_db_metrics(operation: &str, duration: Duration) {
    if !metrics_enabled() {
        return;
    }
    let operation = operation.to_string();
    metrics::counter!("db_operations_total", "operation" => operation).increment(1);
    metrics::histogram!("db_operation_duration_seconds").record(duration.as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_helpers_without_recorder() {
        record_tier_metrics("exact", 1);
        record_resolution_metrics(3, 2, Duration::from_millis(5));
        record_cart_metrics("append", 1);
        record_catalog_fetch_metrics(false, Duration::from_millis(1), 0);
        record_db_metrics("fetch_catalog", Duration::from_millis(1));
    }

    #[test]
    fn test_init_rejects_invalid_config() {
        let config = ObservabilityConfig {
            log_format: "xml".to_string(),
            ..Default::default()
        };
        assert!(init_observability_with_config(&config).is_err());
    }
}
