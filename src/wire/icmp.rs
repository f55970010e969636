//! ICMP header codec (RFC 792).

use super::Codec;
use super::cursor::{Reader, Writer};
use super::icmp_table::IcmpDescriptions;
use super::protocol::IcmpType;
use crate::error::DecodeError;

const HEADER: &str = "ICMP";
const FIXED_LEN: usize = 4;

/// A decoded ICMP header borrowing the rest of the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IcmpHeader<'a> {
    /// Raw type byte; see [`IcmpHeader::kind`].
    pub icmp_type: u8,
    pub code: u8,
    pub checksum: u16,
    pub payload: &'a [u8],
}

impl IcmpHeader<'_> {
    pub const fn kind(&self) -> IcmpType {
        IcmpType::from_number(self.icmp_type)
    }

    /// Looks up the human-readable meaning of this type/code pair.
    pub fn describe<'t, D>(&self, table: &'t D) -> Option<&'t str>
    where
        D: IcmpDescriptions + ?Sized,
    {
        table.describe(self.icmp_type, self.code)
    }
}

impl<'a> Codec<'a> for IcmpHeader<'a> {
    const MIN_LEN: usize = FIXED_LEN;

    fn decode(buf: &'a [u8]) -> Result<Self, DecodeError> {
        let mut reader = Reader::new(buf, HEADER);
        reader.require(FIXED_LEN)?;

        Ok(Self {
            icmp_type: reader.u8()?,
            code: reader.u8()?,
            checksum: reader.u16()?,
            payload: reader.rest(),
        })
    }

    fn encoded_len(&self) -> usize {
        FIXED_LEN + self.payload.len()
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        Writer::new(out)
            .u8(self.icmp_type)
            .u8(self.code)
            .u16(self.checksum)
            .bytes(self.payload);
    }
}
