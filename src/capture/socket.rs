//! Socket seam between capture sessions and the host's raw capture facility.

use std::future::Future;
use std::io;
use std::net::Ipv4Addr;

use crate::error::CaptureError;

/// A raw socket delivering whole IP packets, header included.
///
/// The session owns its socket exclusively and only ever receives from it
/// or drops it.
pub trait RawSocket: Send + 'static {
    /// Receives one packet into `buf` and returns the number of bytes written.
    ///
    /// Cancel-safe: dropping the future before completion loses no packet
    /// that was not yet copied into `buf`.
    fn recv(&mut self, buf: &mut [u8]) -> impl Future<Output = io::Result<usize>> + Send;
}

/// Opens raw sockets for capture sessions.
pub trait SocketProvider: Send + Sync + 'static {
    type Socket: RawSocket;

    /// Opens, binds and configures a socket capturing traffic of the
    /// interface that owns `address`.
    ///
    /// Called from within the tokio runtime that will drive the socket.
    fn open(
        &self,
        address: Ipv4Addr,
        port: u16,
        receive_buffer_size: usize,
    ) -> Result<Self::Socket, CaptureError>;
}
