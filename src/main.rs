//! ipmon - Entry point.
//!
//! Opens a capture session per local IPv4 address (configured explicitly or
//! discovered from the host's interfaces), decodes every captured packet and
//! logs a one-line summary of it until Ctrl-C.

use std::borrow::Cow;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use ipmon::capture::{
    CaptureEvent, CaptureSessionPool, InterfaceFilter, PacketSocketProvider, PnetInterfaces,
    RawFrame, SessionConfig,
};
use ipmon::config::Config;
use ipmon::wire::{IcmpDescriptions, IpHeader, StandardIcmpTable, TransportHeader};

/// Formats one decoded packet as a log line.
fn summarize(header: &IpHeader<'_>, icmp: &dyn IcmpDescriptions) -> String {
    let mut line = format!(
        "{} {} {} -> {}",
        header.version(),
        header.protocol(),
        header.source(),
        header.destination()
    );

    match header.transport() {
        Some(Ok(TransportHeader::Icmp(message))) => {
            let meaning = message.describe(icmp).unwrap_or("unknown type/code");
            line.push_str(&format!(
                " type={} code={} ({meaning})",
                message.icmp_type, message.code
            ));
        }
        Some(Ok(transport)) => {
            if let Some((source, destination)) = transport.ports() {
                line.push_str(&format!(" ports {source} -> {destination}"));
            }
        }
        Some(Err(err)) => line.push_str(&format!(" [{err}]")),
        None => {}
    }

    line.push_str(&format!(" len={}", header.payload().len()));
    line
}

fn report_packet(frame: &RawFrame, icmp: &dyn IcmpDescriptions) {
    match frame.parse() {
        Some(Ok(header)) => info!(session = %frame.address(), "{}", summarize(&header, icmp)),
        Some(Err(err)) => warn!(session = %frame.address(), error = %err, "undecodable packet"),
        None => debug!(session = %frame.address(), bytes = frame.len(), "non-IP frame"),
    }
}

/// Drains the shared event channel until every session is gone.
async fn consume_events(mut events: broadcast::Receiver<CaptureEvent>) {
    let icmp = StandardIcmpTable::new();

    loop {
        match events.recv().await {
            Ok(CaptureEvent::PacketReceived(frame)) => report_packet(&frame, &icmp),
            Ok(CaptureEvent::PacketError(frame)) => {
                if let Some(code) = frame.transport_error() {
                    debug!(session = %frame.address(), %code, "transport error");
                }
            }
            Ok(CaptureEvent::SessionFault(fault)) => warn!("{fault}"),
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "event consumer lagging, events dropped");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

async fn run() -> Result<()> {
    let config_path = std::env::var("CONFIG_PATH")
        .map(Cow::Owned)
        .unwrap_or(Cow::Borrowed("config.toml"));
    let config =
        Config::load_or_default(config_path.as_ref()).context("Failed to load configuration")?;

    // Initialize metrics (must be done before any counter is recorded)
    ipmon::metrics::init(&config.metrics).context("Failed to initialize metrics")?;
    if config.metrics.enabled {
        info!("Metrics enabled on {}", config.metrics.listen);
    }

    let provider = Arc::new(PacketSocketProvider::new(PnetInterfaces));
    let session_config = SessionConfig::from(&config);

    let pool = if config.addresses.is_empty() {
        let filter = InterfaceFilter::new(config.virtual_adapter_prefixes.iter().cloned());
        CaptureSessionPool::bind_all(&PnetInterfaces, &filter, provider, session_config)
            .context("Failed to discover capture addresses")?
    } else {
        CaptureSessionPool::from_addresses(config.addresses.iter().copied(), provider, session_config)
    };

    if pool.is_empty() {
        bail!("No eligible IPv4 address to capture on");
    }

    let consumer = tokio::spawn(consume_events(pool.subscribe()));

    let failures = pool.start_all();
    for (address, err) in &failures {
        error!("Capture on {address} failed to start: {err}");
    }
    if failures.len() == pool.len() {
        bail!("No capture session could be started (raw capture usually needs CAP_NET_RAW)");
    }

    info!(
        "Capturing on {} address(es), press Ctrl-C to stop",
        pool.len() - failures.len()
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    info!("Ctrl-C received, shutting down...");

    pool.stop_all().await;
    drop(pool);
    let _ = consumer.await;

    info!("Shutdown complete.");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    run().await
}
