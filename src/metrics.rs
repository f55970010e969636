//! Metrics initialization for the Prometheus exporter.
//!
//! Capture sessions record these counters, labelled by session `address`:
//!
//! - `ipmon_packets_received_total`
//! - `ipmon_bytes_received_total`
//! - `ipmon_packet_errors_total`
//! - `ipmon_session_faults_total`

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::config::MetricsConfig;
use crate::error::{Error, Result};

/// Initialize the metrics system based on configuration.
///
/// When enabled, this starts an HTTP listener exposing `/metrics` for
/// Prometheus to scrape. Otherwise nothing is installed and every counter
/// update is a no-op.
pub fn init(config: &MetricsConfig) -> Result<()> {
    if !config.enabled {
        return Ok(());
    }

    PrometheusBuilder::new()
        .with_http_listener(config.listen)
        .install()
        .map_err(|e| Error::Metrics(e.to_string()))?;

    Ok(())
}
