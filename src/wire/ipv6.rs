//! IPv6 fixed header codec (RFC 8200).
//!
//! The traffic class straddles the first two bytes and the flow label takes
//! the remaining nibble of the second byte plus the following 16 bits:
//!
//! ```text
//! +-------+---------------+---------------------------------------+
//! |Version| Traffic Class |              Flow Label               |
//! +-------+---------------+-------+---------------+---------------+
//! |        Payload Length         |  Next Header  |   Hop Limit   |
//! +-------------------------------+---------------+---------------+
//! ```

use std::net::Ipv6Addr;

use super::Codec;
use super::bits::{combine_nibbles, high_nibble, low_nibble};
use super::cursor::{Reader, Writer};
use super::protocol::Protocol;
use crate::error::DecodeError;

const HEADER: &str = "IPv6";
const FIXED_LEN: usize = 40;
const FLOW_LABEL_MASK: u32 = 0x000f_ffff;

/// A decoded IPv6 header borrowing its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv6Header<'a> {
    pub version: u8,
    pub traffic_class: u8,
    /// 20-bit flow label.
    pub flow_label: u32,
    pub payload_length: u16,
    /// Raw next-header byte; see [`Ipv6Header::protocol`].
    pub next_header: u8,
    pub hop_limit: u8,
    pub source: Ipv6Addr,
    pub destination: Ipv6Addr,
    /// Exactly `payload_length` bytes: an extension header or upper-layer data.
    pub payload: &'a [u8],
    /// Bytes captured after the payload, such as link-layer padding.
    pub trailer: &'a [u8],
}

impl Ipv6Header<'_> {
    /// Upper-layer classification of the next-header byte.
    pub const fn protocol(&self) -> Protocol {
        Protocol::from_number(self.next_header)
    }
}

impl<'a> Codec<'a> for Ipv6Header<'a> {
    const MIN_LEN: usize = FIXED_LEN;

    fn decode(buf: &'a [u8]) -> Result<Self, DecodeError> {
        let mut reader = Reader::new(buf, HEADER);
        reader.require(FIXED_LEN)?;

        let first = reader.u8()?;
        let second = reader.u8()?;
        let version = high_nibble(first);
        let traffic_class = combine_nibbles(low_nibble(first), high_nibble(second));
        let flow_label = (u32::from(low_nibble(second)) << 16) | u32::from(reader.u16()?);

        let payload_length = reader.u16()?;
        let next_header = reader.u8()?;
        let hop_limit = reader.u8()?;
        let source = Ipv6Addr::from(reader.array::<16>()?);
        let destination = Ipv6Addr::from(reader.array::<16>()?);
        let payload = reader.bytes(usize::from(payload_length))?;

        Ok(Self {
            version,
            traffic_class,
            flow_label,
            payload_length,
            next_header,
            hop_limit,
            source,
            destination,
            payload,
            trailer: reader.rest(),
        })
    }

    fn encoded_len(&self) -> usize {
        FIXED_LEN + self.payload.len() + self.trailer.len()
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        let flow_label = self.flow_label & FLOW_LABEL_MASK;

        Writer::new(out)
            .u8(combine_nibbles(self.version, high_nibble(self.traffic_class)))
            .u8(combine_nibbles(
                low_nibble(self.traffic_class),
                (flow_label >> 16) as u8,
            ))
            .u16(flow_label as u16)
            .u16(self.payload_length)
            .u8(self.next_header)
            .u8(self.hop_limit)
            .bytes(&self.source.octets())
            .bytes(&self.destination.octets())
            .bytes(self.payload)
            .bytes(self.trailer);
    }
}
