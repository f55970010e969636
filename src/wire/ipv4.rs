//! IPv4 header codec (RFC 791).
//!
//! ```text
//!  0               1               2               3
//!  0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7
//! +-------+-------+---------------+-------------------------------+
//! |Version|  IHL  |      TOS      |         Total Length          |
//! +-------+-------+---------------+-----+-------------------------+
//! |        Identification         |Flags|     Fragment Offset     |
//! +---------------+---------------+-----+-------------------------+
//! |      TTL      |   Protocol    |        Header Checksum        |
//! +---------------+---------------+-------------------------------+
//! |                        Source Address                         |
//! +---------------------------------------------------------------+
//! |                      Destination Address                      |
//! +---------------------------------------------------------------+
//! |                 Options and Padding (0-40 bytes)              |
//! +---------------------------------------------------------------+
//! ```

use std::net::Ipv4Addr;

use super::Codec;
use super::bits::{combine_nibbles, get_bit, high_nibble, low_nibble, set_bit};
use super::cursor::{Reader, Writer};
use super::protocol::Protocol;
use crate::error::DecodeError;

const HEADER: &str = "IPv4";
const FIXED_LEN: usize = 20;
const FRAGMENT_OFFSET_MASK: u16 = 0x1fff;

// Flag bits within the high byte of the flags/fragment-offset field,
// most significant first.
const RESERVED_BIT: u8 = 7;
const DONT_FRAGMENT_BIT: u8 = 6;
const MORE_FRAGMENTS_BIT: u8 = 5;

/// The three fragmentation control bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ipv4Flags {
    pub reserved: bool,
    pub dont_fragment: bool,
    pub more_fragments: bool,
}

impl Ipv4Flags {
    /// Reads the flags from the upper three bits of `byte`.
    pub const fn from_byte(byte: u8) -> Self {
        Self {
            reserved: get_bit(byte, RESERVED_BIT),
            dont_fragment: get_bit(byte, DONT_FRAGMENT_BIT),
            more_fragments: get_bit(byte, MORE_FRAGMENTS_BIT),
        }
    }

    /// Places the flags in the upper three bits of a byte, lower bits clear.
    pub const fn to_byte(self) -> u8 {
        let byte = set_bit(0, RESERVED_BIT, self.reserved);
        let byte = set_bit(byte, DONT_FRAGMENT_BIT, self.dont_fragment);
        set_bit(byte, MORE_FRAGMENTS_BIT, self.more_fragments)
    }
}

/// A decoded IPv4 header borrowing its options and payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Header<'a> {
    pub version: u8,
    /// Header length in 32-bit words.
    pub header_len_words: u8,
    pub type_of_service: u8,
    pub total_length: u16,
    pub identification: u16,
    pub flags: Ipv4Flags,
    pub fragment_offset: u16,
    pub ttl: u8,
    /// Raw protocol number; see [`Ipv4Header::protocol`].
    pub protocol_number: u8,
    pub header_checksum: u16,
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
    pub options: &'a [u8],
    pub payload: &'a [u8],
}

impl Ipv4Header<'_> {
    /// Header length in bytes, options included.
    #[inline]
    pub const fn header_len(&self) -> usize {
        self.header_len_words as usize * 4
    }

    pub const fn protocol(&self) -> Protocol {
        Protocol::from_number(self.protocol_number)
    }

    pub const fn dont_fragment(&self) -> bool {
        self.flags.dont_fragment
    }

    pub const fn more_fragments(&self) -> bool {
        self.flags.more_fragments
    }

    /// True when none of the three flag bits is set.
    pub const fn no_more_fragments(&self) -> bool {
        !self.flags.reserved && !self.flags.dont_fragment && !self.flags.more_fragments
    }
}

impl<'a> Codec<'a> for Ipv4Header<'a> {
    const MIN_LEN: usize = FIXED_LEN;

    fn decode(buf: &'a [u8]) -> Result<Self, DecodeError> {
        let mut reader = Reader::new(buf, HEADER);
        reader.require(FIXED_LEN)?;

        let first = reader.u8()?;
        let version = high_nibble(first);
        let header_len_words = low_nibble(first);
        let type_of_service = reader.u8()?;
        let total_length = reader.u16()?;
        let identification = reader.u16()?;

        let flags_and_offset = reader.u16()?;
        let flags = Ipv4Flags::from_byte((flags_and_offset >> 8) as u8);
        let fragment_offset = flags_and_offset & FRAGMENT_OFFSET_MASK;

        let ttl = reader.u8()?;
        let protocol_number = reader.u8()?;
        let header_checksum = reader.u16()?;
        let source = Ipv4Addr::from(reader.array::<4>()?);
        let destination = Ipv4Addr::from(reader.array::<4>()?);

        let header_len = usize::from(header_len_words) * 4;
        let Some(options_len) = header_len.checked_sub(FIXED_LEN) else {
            return Err(DecodeError::Truncated {
                header: HEADER,
                needed: FIXED_LEN,
                available: header_len,
            });
        };
        let options = reader.bytes(options_len)?;

        let total = usize::from(total_length);
        if total < header_len {
            return Err(reader.malformed("total length shorter than header"));
        }
        if total > buf.len() {
            return Err(DecodeError::Truncated {
                header: HEADER,
                needed: total,
                available: buf.len(),
            });
        }

        Ok(Self {
            version,
            header_len_words,
            type_of_service,
            total_length,
            identification,
            flags,
            fragment_offset,
            ttl,
            protocol_number,
            header_checksum,
            source,
            destination,
            options,
            payload: reader.rest(),
        })
    }

    fn encoded_len(&self) -> usize {
        FIXED_LEN + self.options.len() + self.payload.len()
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        let flags_and_offset =
            (u16::from(self.flags.to_byte()) << 8) | (self.fragment_offset & FRAGMENT_OFFSET_MASK);

        Writer::new(out)
            .u8(combine_nibbles(self.version, self.header_len_words))
            .u8(self.type_of_service)
            .u16(self.total_length)
            .u16(self.identification)
            .u16(flags_and_offset)
            .u8(self.ttl)
            .u8(self.protocol_number)
            .u16(self.header_checksum)
            .bytes(&self.source.octets())
            .bytes(&self.destination.octets())
            .bytes(self.options)
            .bytes(self.payload);
    }
}
