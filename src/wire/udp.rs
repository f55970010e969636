//! UDP header codec (RFC 768).

use super::Codec;
use super::cursor::{Reader, Writer};
use crate::error::DecodeError;

const HEADER: &str = "UDP";
const FIXED_LEN: usize = 8;

/// A decoded UDP header borrowing its payload.
///
/// The payload runs to the end of the supplied buffer. The `length` field is
/// reported as received and never used for slicing, so a forged length cannot
/// move the payload boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UdpHeader<'a> {
    pub source_port: u16,
    pub destination_port: u16,
    /// Datagram length including the 8-byte header, as announced.
    pub length: u16,
    pub checksum: u16,
    pub payload: &'a [u8],
}

impl<'a> Codec<'a> for UdpHeader<'a> {
    const MIN_LEN: usize = FIXED_LEN;

    fn decode(buf: &'a [u8]) -> Result<Self, DecodeError> {
        let mut reader = Reader::new(buf, HEADER);
        reader.require(FIXED_LEN)?;

        Ok(Self {
            source_port: reader.u16()?,
            destination_port: reader.u16()?,
            length: reader.u16()?,
            checksum: reader.u16()?,
            payload: reader.rest(),
        })
    }

    fn encoded_len(&self) -> usize {
        FIXED_LEN + self.payload.len()
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        Writer::new(out)
            .u16(self.source_port)
            .u16(self.destination_port)
            .u16(self.length)
            .u16(self.checksum)
            .bytes(self.payload);
    }
}
