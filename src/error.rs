//! Error types for capture sessions and header codecs.

use std::io;
use std::net::Ipv4Addr;

use thiserror::Error;

/// Main error type for ipmon operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("bit operation error: {0}")]
    Bits(#[from] BitError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("metrics error: {0}")]
    Metrics(String),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadFile(#[source] io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("validation failed: {0}")]
    Validation(String),
}

/// Errors raised by the bit/nibble primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BitError {
    #[error("{bits} bits do not fit into a {width}-bit integer")]
    TooManyBits { bits: usize, width: u32 },
}

/// Errors raised while decoding a header from a byte buffer.
///
/// Unknown protocol numbers, ICMP types and IP versions are not errors;
/// they decode to an explicit "undefined" classification instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("truncated {header} packet: needed {needed} bytes, {available} available")]
    Truncated {
        header: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("malformed {header} packet: {reason}")]
    Malformed {
        header: &'static str,
        reason: &'static str,
    },
}

/// Capture session errors.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to open raw socket for {address}: {source}")]
    Open {
        address: Ipv4Addr,
        #[source]
        source: io::Error,
    },

    #[error("failed to bind raw socket to {address}: {source}")]
    Bind {
        address: Ipv4Addr,
        #[source]
        source: io::Error,
    },

    #[error("failed to configure raw socket for {address}: {source}")]
    Configure {
        address: Ipv4Addr,
        #[source]
        source: io::Error,
    },

    #[error("no network interface owns address {0}")]
    InterfaceNotFound(Ipv4Addr),

    #[error("interface enumeration failed: {0}")]
    Interfaces(String),

    #[error("capture session already started")]
    AlreadyStarted,

    #[error("capture session has been stopped")]
    Stopped,

    #[error("raw IP capture is not supported on this platform")]
    Unsupported,

    #[error("capture session must be started from within a tokio runtime")]
    NoRuntime,

    #[error("socket reported {received} bytes for a {capacity}-byte receive buffer")]
    BufferOverrun { received: usize, capacity: usize },

    #[error("failed to allocate a {0}-byte receive buffer")]
    BufferAllocation(usize),

    #[error("receive failed without a transport error code: {0}")]
    UnclassifiedReceive(#[source] io::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;
