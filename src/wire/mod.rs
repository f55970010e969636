//! Binary codecs for the IP protocol stack.
//!
//! Each header type decodes from a borrowed byte buffer and re-encodes into
//! an owned one. For any buffer a codec accepts, `encode(decode(b)) == b`.
//!
//! ```rust
//! use ipmon::wire::{Codec, TcpHeader};
//!
//! let segment = [
//!     0xd4, 0x31, 0x01, 0xbb, 0, 0, 0, 1, 0, 0, 0, 0, 0x50, 0x02, 0xff, 0xff, 0, 0, 0, 0,
//! ];
//! let tcp = TcpHeader::decode(&segment).unwrap();
//! assert_eq!(tcp.destination_port, 443);
//! assert!(tcp.flags.syn && !tcp.flags.ack);
//! assert_eq!(tcp.encode(), segment);
//! ```

pub mod bits;
pub mod cursor;
pub mod dispatch;
mod icmp;
mod icmp_table;
mod ipv4;
mod ipv6;
mod protocol;
mod tcp;
mod udp;

#[cfg(test)]
pub(crate) mod fixtures;

pub use dispatch::{IpHeader, TransportHeader, identify_version, parse};
pub use icmp::IcmpHeader;
pub use icmp_table::{IcmpDescriptions, StandardIcmpTable};
pub use ipv4::{Ipv4Flags, Ipv4Header};
pub use ipv6::Ipv6Header;
pub use protocol::{IcmpType, IpVersion, Protocol};
pub use tcp::{TcpFlags, TcpHeader};
pub use udp::UdpHeader;

use crate::error::DecodeError;

/// A protocol header that can be decoded from and encoded to raw bytes.
pub trait Codec<'a>: Sized {
    /// Size of the fixed part of the header in bytes.
    const MIN_LEN: usize;

    /// Decodes a header from the start of `buf`.
    fn decode(buf: &'a [u8]) -> Result<Self, DecodeError>;

    /// Number of bytes [`Codec::encode`] will produce.
    fn encoded_len(&self) -> usize;

    /// Appends the wire representation to `out`.
    fn encode_into(&self, out: &mut Vec<u8>);

    /// Encodes the header, including options and payload, into a new buffer.
    fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.encode_into(&mut out);
        out
    }
}
