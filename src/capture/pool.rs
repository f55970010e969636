//! One capture session per eligible local IPv4 address.

use std::net::Ipv4Addr;
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::event::CaptureEvent;
use super::interface::{InterfaceFilter, InterfaceSource};
use super::session::{CaptureSession, SessionConfig};
use super::socket::SocketProvider;
use crate::error::CaptureError;

/// A set of capture sessions publishing into one shared event channel.
///
/// Events from different sessions interleave in no particular order; each
/// event carries the address and port of the session that produced it.
pub struct CaptureSessionPool<P: SocketProvider> {
    sessions: Vec<CaptureSession<P>>,
    events: broadcast::Sender<CaptureEvent>,
}

impl<P: SocketProvider> CaptureSessionPool<P> {
    /// Creates one idle session per IPv4 address of every eligible interface.
    pub fn bind_all<I>(
        interfaces: &I,
        filter: &InterfaceFilter,
        provider: Arc<P>,
        config: SessionConfig,
    ) -> Result<Self, CaptureError>
    where
        I: InterfaceSource + ?Sized,
    {
        let mut addresses = Vec::new();
        for iface in interfaces.interfaces()? {
            if !filter.is_eligible(&iface) {
                debug!(interface = %iface.name, "skipping interface");
                continue;
            }
            for address in iface.ipv4 {
                debug!(interface = %iface.name, %address, "binding capture session");
                addresses.push(address);
            }
        }

        info!(sessions = addresses.len(), "discovered capture addresses");
        Ok(Self::from_addresses(addresses, provider, config))
    }

    /// Creates one idle session per address, skipping duplicates.
    pub fn from_addresses<A>(addresses: A, provider: Arc<P>, config: SessionConfig) -> Self
    where
        A: IntoIterator<Item = Ipv4Addr>,
    {
        let (events, _) = broadcast::channel(config.channel_capacity.max(1));
        let mut sessions: Vec<CaptureSession<P>> = Vec::new();
        for address in addresses {
            if sessions.iter().any(|s| s.address() == address) {
                continue;
            }
            sessions.push(CaptureSession::with_events(
                address,
                0,
                Arc::clone(&provider),
                config.clone(),
                events.clone(),
            ));
        }

        Self { sessions, events }
    }

    pub fn sessions(&self) -> &[CaptureSession<P>] {
        &self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Subscribes to the events of every session in the pool.
    pub fn subscribe(&self) -> broadcast::Receiver<CaptureEvent> {
        self.events.subscribe()
    }

    /// Starts every session, returning the ones that failed to open.
    pub fn start_all(&self) -> Vec<(Ipv4Addr, CaptureError)> {
        let mut failures = Vec::new();
        for session in &self.sessions {
            if let Err(err) = session.start() {
                warn!(address = %session.address(), error = %err, "failed to start capture session");
                failures.push((session.address(), err));
            }
        }
        failures
    }

    /// Stops every session in turn; each stop is bounded by the close timeout.
    pub async fn stop_all(&self) {
        for session in &self.sessions {
            session.stop().await;
        }
    }

    pub fn into_sessions(self) -> Vec<CaptureSession<P>> {
        self.sessions
    }
}
