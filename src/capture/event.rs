//! Events delivered by capture sessions to their subscribers.

use std::fmt;
use std::io;
use std::net::Ipv4Addr;
use std::sync::Arc;

use crate::error::{CaptureError, DecodeError};
use crate::wire::{IpHeader, IpVersion};

/// Error code attached to a receive completion by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportError {
    /// A completion that reported success with zero bytes.
    NoData,
    /// An OS error number reported by the socket.
    Os(i32),
}

impl TransportError {
    /// Classifies an I/O error by its OS error number, if it carries one.
    pub fn from_io(err: &io::Error) -> Option<Self> {
        err.raw_os_error().map(Self::Os)
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoData => f.write_str("no data received"),
            Self::Os(code) => {
                let kind = io::Error::from_raw_os_error(*code).kind();
                write!(f, "{kind} (os error {code})")
            }
        }
    }
}

/// One completed receive: the captured bytes plus where they were captured.
///
/// Frames are cheap to clone; every subscriber shares the same bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    data: Arc<[u8]>,
    address: Ipv4Addr,
    port: u16,
    error: Option<TransportError>,
}

impl RawFrame {
    /// Copies exactly `data` into a new frame.
    pub fn packet(data: &[u8], address: Ipv4Addr, port: u16) -> Self {
        Self {
            data: Arc::from(data),
            address,
            port,
            error: None,
        }
    }

    /// An empty frame carrying a transport error code.
    pub fn error(code: TransportError, address: Ipv4Addr, port: u16) -> Self {
        Self {
            data: Arc::from(&[][..]),
            address,
            port,
            error: Some(code),
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Local address of the capturing socket.
    pub const fn address(&self) -> Ipv4Addr {
        self.address
    }

    /// Local port of the capturing socket (0 for raw capture).
    pub const fn port(&self) -> u16 {
        self.port
    }

    pub const fn transport_error(&self) -> Option<TransportError> {
        self.error
    }

    /// Peeks the IP version without decoding the header.
    pub fn version(&self) -> IpVersion {
        crate::wire::identify_version(&self.data)
    }

    /// Decodes the frame's network-layer header; `None` for non-IP data.
    pub fn parse(&self) -> Option<Result<IpHeader<'_>, DecodeError>> {
        crate::wire::parse(&self.data)
    }
}

/// A failure raised while handling a completion, tagged with its session.
#[derive(Debug, Clone)]
pub struct SessionFault {
    pub error: Arc<CaptureError>,
    pub address: Ipv4Addr,
    pub port: u16,
}

impl fmt::Display for SessionFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session {}:{} fault: {}", self.address, self.port, self.error)
    }
}

/// Everything a capture session reports to its subscribers.
#[derive(Debug, Clone)]
pub enum CaptureEvent {
    /// A packet was captured.
    PacketReceived(RawFrame),
    /// The transport reported an error code; the frame carries no data.
    PacketError(RawFrame),
    /// Handling a completion failed; the session keeps running.
    SessionFault(SessionFault),
}

impl CaptureEvent {
    pub const fn address(&self) -> Ipv4Addr {
        match self {
            Self::PacketReceived(frame) | Self::PacketError(frame) => frame.address,
            Self::SessionFault(fault) => fault.address,
        }
    }

    pub const fn port(&self) -> u16 {
        match self {
            Self::PacketReceived(frame) | Self::PacketError(frame) => frame.port,
            Self::SessionFault(fault) => fault.port,
        }
    }
}
