//! TCP header codec (RFC 9293).

use super::Codec;
use super::bits::{combine_nibbles, get_bit, high_nibble, low_nibble, set_bit};
use super::cursor::{Reader, Writer};
use crate::error::DecodeError;

const HEADER: &str = "TCP";
const FIXED_LEN: usize = 20;
const MIN_DATA_OFFSET: u8 = 5;

// Control bits within the flags byte, CWR in the most significant position.
const CWR: u8 = 7;
const ECE: u8 = 6;
const URG: u8 = 5;
const ACK: u8 = 4;
const PSH: u8 = 3;
const RST: u8 = 2;
const SYN: u8 = 1;
const FIN: u8 = 0;

/// The eight TCP control bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TcpFlags {
    pub cwr: bool,
    pub ece: bool,
    pub urg: bool,
    pub ack: bool,
    pub psh: bool,
    pub rst: bool,
    pub syn: bool,
    pub fin: bool,
}

impl TcpFlags {
    pub const fn from_byte(byte: u8) -> Self {
        Self {
            cwr: get_bit(byte, CWR),
            ece: get_bit(byte, ECE),
            urg: get_bit(byte, URG),
            ack: get_bit(byte, ACK),
            psh: get_bit(byte, PSH),
            rst: get_bit(byte, RST),
            syn: get_bit(byte, SYN),
            fin: get_bit(byte, FIN),
        }
    }

    pub const fn to_byte(self) -> u8 {
        let mut byte = 0;
        byte = set_bit(byte, CWR, self.cwr);
        byte = set_bit(byte, ECE, self.ece);
        byte = set_bit(byte, URG, self.urg);
        byte = set_bit(byte, ACK, self.ack);
        byte = set_bit(byte, PSH, self.psh);
        byte = set_bit(byte, RST, self.rst);
        byte = set_bit(byte, SYN, self.syn);
        set_bit(byte, FIN, self.fin)
    }
}

/// A decoded TCP header borrowing its options and payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcpHeader<'a> {
    pub source_port: u16,
    pub destination_port: u16,
    pub sequence_number: u32,
    pub acknowledgment_number: u32,
    /// Header length in 32-bit words.
    pub data_offset_words: u8,
    pub reserved: u8,
    pub flags: TcpFlags,
    pub window: u16,
    pub checksum: u16,
    pub urgent_pointer: u16,
    pub options: &'a [u8],
    pub payload: &'a [u8],
}

impl TcpHeader<'_> {
    /// Header length in bytes, options included.
    #[inline]
    pub const fn header_len(&self) -> usize {
        self.data_offset_words as usize * 4
    }
}

impl<'a> Codec<'a> for TcpHeader<'a> {
    const MIN_LEN: usize = FIXED_LEN;

    fn decode(buf: &'a [u8]) -> Result<Self, DecodeError> {
        let mut reader = Reader::new(buf, HEADER);
        reader.require(FIXED_LEN)?;

        let source_port = reader.u16()?;
        let destination_port = reader.u16()?;
        let sequence_number = reader.u32()?;
        let acknowledgment_number = reader.u32()?;

        let offset_byte = reader.u8()?;
        let data_offset_words = high_nibble(offset_byte);
        let reserved = low_nibble(offset_byte);
        if data_offset_words < MIN_DATA_OFFSET {
            return Err(reader.malformed("data offset below 5 words"));
        }

        let flags = TcpFlags::from_byte(reader.u8()?);
        let window = reader.u16()?;
        let checksum = reader.u16()?;
        let urgent_pointer = reader.u16()?;
        let options = reader.bytes(usize::from(data_offset_words) * 4 - FIXED_LEN)?;

        Ok(Self {
            source_port,
            destination_port,
            sequence_number,
            acknowledgment_number,
            data_offset_words,
            reserved,
            flags,
            window,
            checksum,
            urgent_pointer,
            options,
            payload: reader.rest(),
        })
    }

    fn encoded_len(&self) -> usize {
        FIXED_LEN + self.options.len() + self.payload.len()
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        Writer::new(out)
            .u16(self.source_port)
            .u16(self.destination_port)
            .u32(self.sequence_number)
            .u32(self.acknowledgment_number)
            .u8(combine_nibbles(self.data_offset_words, self.reserved))
            .u8(self.flags.to_byte())
            .u16(self.window)
            .u16(self.checksum)
            .u16(self.urgent_pointer)
            .bytes(self.options)
            .bytes(self.payload);
    }
}
