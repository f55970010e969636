//! Capture session: one raw socket and the receive cycle draining it.
//!
//! A session is `Idle` after construction, `Running` once [`CaptureSession::start`]
//! has opened its socket and spawned the receive cycle, and `Stopped` for good
//! after [`CaptureSession::stop`]. Everything the cycle observes ends up as a
//! [`CaptureEvent`] on the session's broadcast channel; only a failure to open
//! the socket is reported to the caller.

use std::io;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use metrics::counter;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::{Notify, broadcast};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, trace, warn};

use super::buffer::{BufferPool, DEFAULT_RECEIVE_SIZE};
use super::event::{CaptureEvent, RawFrame, SessionFault, TransportError};
use super::socket::{RawSocket, SocketProvider};
use crate::config::Config;
use crate::error::CaptureError;

/// Pause after a failed buffer allocation before re-arming.
const ALLOCATION_BACKOFF: Duration = Duration::from_millis(50);

/// Tunables shared by every session of a pool.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub receive_buffer_size: usize,
    pub buffer_pool_size: usize,
    pub channel_capacity: usize,
    /// Upper bound on how long `stop` waits for the cycle to drain.
    pub close_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            receive_buffer_size: DEFAULT_RECEIVE_SIZE,
            buffer_pool_size: 8,
            channel_capacity: 1024,
            close_timeout: Duration::from_millis(500),
        }
    }
}

impl From<&Config> for SessionConfig {
    fn from(config: &Config) -> Self {
        Self {
            receive_buffer_size: config.receive_buffer_size,
            buffer_pool_size: config.buffer_pool_size,
            channel_capacity: config.channel_capacity,
            close_timeout: config.close_timeout(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
    Stopped,
}

/// A raw IP capture bound to one local address.
pub struct CaptureSession<P: SocketProvider> {
    address: Ipv4Addr,
    port: u16,
    provider: Arc<P>,
    config: SessionConfig,
    events: broadcast::Sender<CaptureEvent>,
    state: Mutex<SessionState>,
    running: Arc<AtomicBool>,
    stop_signal: Arc<Notify>,
    task: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl<P: SocketProvider> CaptureSession<P> {
    /// Creates an idle session with its own event channel.
    pub fn new(address: Ipv4Addr, port: u16, provider: Arc<P>, config: SessionConfig) -> Self {
        let (events, _) = broadcast::channel(config.channel_capacity.max(1));
        Self::with_events(address, port, provider, config, events)
    }

    /// Creates an idle session publishing into an existing channel.
    pub fn with_events(
        address: Ipv4Addr,
        port: u16,
        provider: Arc<P>,
        config: SessionConfig,
        events: broadcast::Sender<CaptureEvent>,
    ) -> Self {
        Self {
            address,
            port,
            provider,
            config,
            events,
            state: Mutex::new(SessionState::Idle),
            running: Arc::new(AtomicBool::new(false)),
            stop_signal: Arc::new(Notify::new()),
            task: tokio::sync::Mutex::new(None),
        }
    }

    pub const fn address(&self) -> Ipv4Addr {
        self.address
    }

    pub const fn port(&self) -> u16 {
        self.port
    }

    pub fn state(&self) -> SessionState {
        *self.state.lock()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Subscribes to this session's events.
    pub fn subscribe(&self) -> broadcast::Receiver<CaptureEvent> {
        self.events.subscribe()
    }

    /// Opens the socket and spawns the receive cycle onto the current runtime.
    ///
    /// Returns as soon as the first receive is armed. A session that failed
    /// to open its socket stays `Idle`.
    #[instrument(skip(self), fields(address = %self.address, port = self.port))]
    pub fn start(&self) -> Result<(), CaptureError> {
        let mut state = self.state.lock();
        match *state {
            SessionState::Idle => {}
            SessionState::Running => return Err(CaptureError::AlreadyStarted),
            SessionState::Stopped => return Err(CaptureError::Stopped),
        }

        let runtime = Handle::try_current().map_err(|_| CaptureError::NoRuntime)?;
        let Ok(mut slot) = self.task.try_lock() else {
            return Err(CaptureError::AlreadyStarted);
        };

        let socket = self
            .provider
            .open(self.address, self.port, self.config.receive_buffer_size)?;

        self.running.store(true, Ordering::SeqCst);
        let cycle = ReceiveCycle {
            address: self.address,
            port: self.port,
            label: self.address.to_string(),
            running: Arc::clone(&self.running),
            stop_signal: Arc::clone(&self.stop_signal),
            events: self.events.clone(),
            buffers: BufferPool::new(self.config.buffer_pool_size, self.config.receive_buffer_size),
        };
        *slot = Some(runtime.spawn(cycle.run(socket)));
        *state = SessionState::Running;

        info!("capture session started");
        Ok(())
    }

    /// Stops the receive cycle and releases the socket.
    ///
    /// Idempotent and safe from any state. Waits at most the configured
    /// close timeout for the cycle to drain, then aborts it. No event of
    /// this session is delivered after `stop` returns.
    #[instrument(skip(self), fields(address = %self.address, port = self.port))]
    pub async fn stop(&self) {
        let previous = std::mem::replace(&mut *self.state.lock(), SessionState::Stopped);
        self.running.store(false, Ordering::SeqCst);
        self.stop_signal.notify_one();

        let mut slot = self.task.lock().await;
        let Some(mut task) = slot.take() else {
            return;
        };

        match tokio::time::timeout(self.config.close_timeout, &mut task).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(error = %err, "receive cycle ended abnormally"),
            Err(_) => {
                warn!(timeout = ?self.config.close_timeout, "receive cycle did not drain in time, aborting");
                task.abort();
                let _ = task.await;
            }
        }

        if previous == SessionState::Running {
            info!("capture session stopped");
        }
    }
}

impl<P: SocketProvider> Drop for CaptureSession<P> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        self.stop_signal.notify_one();
        if let Some(task) = self.task.get_mut().take() {
            task.abort();
        }
    }
}

/// State moved into the spawned receive task.
struct ReceiveCycle {
    address: Ipv4Addr,
    port: u16,
    label: String,
    running: Arc<AtomicBool>,
    stop_signal: Arc<Notify>,
    events: broadcast::Sender<CaptureEvent>,
    buffers: BufferPool,
}

impl ReceiveCycle {
    async fn run<S: RawSocket>(self, mut socket: S) {
        debug!(address = %self.address, "receive cycle armed");

        loop {
            if !self.running.load(Ordering::SeqCst) {
                break;
            }

            let mut buffer = match self.buffers.acquire() {
                Ok(buffer) => buffer,
                Err(err) => {
                    self.fault(err);
                    tokio::time::sleep(ALLOCATION_BACKOFF).await;
                    continue;
                }
            };

            let completion = tokio::select! {
                biased;
                completion = socket.recv(buffer.as_mut_slice()) => completion,
                () = self.stop_signal.notified() => break,
            };

            if !self.running.load(Ordering::SeqCst) {
                break;
            }

            let delivered = self.complete(completion, buffer.as_slice());
            drop(buffer);
            match delivered {
                Ok(true) => {}
                Ok(false) => tokio::task::yield_now().await,
                Err(err) => {
                    self.fault(err);
                    tokio::task::yield_now().await;
                }
            }
        }

        drop(socket);
        debug!(address = %self.address, "receive cycle finished, socket released");
    }

    /// Turns one completion into an event. `Ok(false)` marks a transport error.
    fn complete(&self, completion: io::Result<usize>, buffer: &[u8]) -> Result<bool, CaptureError> {
        match completion {
            Ok(0) => {
                self.transport_error(TransportError::NoData);
                Ok(false)
            }
            Ok(received) => {
                let data = buffer.get(..received).ok_or(CaptureError::BufferOverrun {
                    received,
                    capacity: buffer.len(),
                })?;

                counter!("ipmon_packets_received_total", "address" => self.label.clone()).increment(1);
                counter!("ipmon_bytes_received_total", "address" => self.label.clone())
                    .increment(received as u64);
                trace!(address = %self.address, bytes = received, "packet received");

                self.deliver(CaptureEvent::PacketReceived(RawFrame::packet(
                    data,
                    self.address,
                    self.port,
                )));
                Ok(true)
            }
            Err(err) => match TransportError::from_io(&err) {
                Some(code) => {
                    self.transport_error(code);
                    Ok(false)
                }
                None => Err(CaptureError::UnclassifiedReceive(err)),
            },
        }
    }

    fn transport_error(&self, code: TransportError) {
        counter!("ipmon_packet_errors_total", "address" => self.label.clone()).increment(1);
        warn!(address = %self.address, error = %code, "transport error on receive");
        self.deliver(CaptureEvent::PacketError(RawFrame::error(
            code,
            self.address,
            self.port,
        )));
    }

    fn fault(&self, error: CaptureError) {
        counter!("ipmon_session_faults_total", "address" => self.label.clone()).increment(1);
        warn!(address = %self.address, error = %error, "capture session fault");
        self.deliver(CaptureEvent::SessionFault(SessionFault {
            error: Arc::new(error),
            address: self.address,
            port: self.port,
        }));
    }

    fn deliver(&self, event: CaptureEvent) {
        if self.events.send(event).is_err() {
            trace!(address = %self.address, "no subscribers, event dropped");
        }
    }
}
