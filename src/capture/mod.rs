//! Raw IP capture.
//!
//! A [`CaptureSession`] owns one raw socket bound to a local IPv4 address and
//! runs a receive cycle on the tokio runtime, publishing [`CaptureEvent`]s to
//! any number of subscribers. [`CaptureSessionPool`] discovers the host's
//! eligible addresses and creates one session for each.
//!
//! The socket is reached through the [`SocketProvider`] / [`RawSocket`] seam;
//! [`PacketSocketProvider`] is the production implementation.

pub mod buffer;
pub mod event;
pub mod interface;
pub mod pool;
pub mod session;
pub mod socket;
pub mod sys;

pub use buffer::{BufferPool, PooledBuffer};
pub use event::{CaptureEvent, RawFrame, SessionFault, TransportError};
pub use interface::{InterfaceFilter, InterfaceInfo, InterfaceSource, PnetInterfaces};
pub use pool::CaptureSessionPool;
pub use session::{CaptureSession, SessionConfig, SessionState};
pub use socket::{RawSocket, SocketProvider};
pub use sys::{PacketSocket, PacketSocketProvider};
