//! Bounds-checked network-byte-order reads and writes.
//!
//! Every codec reads multi-byte fields through [`Reader`] and writes them
//! through [`Writer`], so big-endian handling lives in exactly one place.

use byteorder::{ByteOrder, NetworkEndian};

use crate::error::DecodeError;

/// Forward-only reader over a borrowed buffer.
///
/// Reads never go past the end of the buffer; a short read yields
/// [`DecodeError::Truncated`] naming the header being decoded.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
    header: &'static str,
}

impl<'a> Reader<'a> {
    pub const fn new(buf: &'a [u8], header: &'static str) -> Self {
        Self {
            buf,
            pos: 0,
            header,
        }
    }

    /// Bytes consumed so far.
    #[inline]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read.
    #[inline]
    pub const fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Fails unless at least `len` bytes remain.
    pub const fn require(&self, len: usize) -> Result<(), DecodeError> {
        if self.remaining() < len {
            return Err(self.truncated(len));
        }
        Ok(())
    }

    pub fn bytes(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        self.require(len)?;
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    pub fn array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.bytes(N)?);
        Ok(out)
    }

    pub fn u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.bytes(1)?[0])
    }

    pub fn u16(&mut self) -> Result<u16, DecodeError> {
        Ok(NetworkEndian::read_u16(self.bytes(2)?))
    }

    pub fn u32(&mut self) -> Result<u32, DecodeError> {
        Ok(NetworkEndian::read_u32(self.bytes(4)?))
    }

    /// Consumes everything that is left.
    pub fn rest(&mut self) -> &'a [u8] {
        let slice = &self.buf[self.pos..];
        self.pos = self.buf.len();
        slice
    }

    pub const fn truncated(&self, len: usize) -> DecodeError {
        DecodeError::Truncated {
            header: self.header,
            needed: self.pos + len,
            available: self.buf.len(),
        }
    }

    pub const fn malformed(&self, reason: &'static str) -> DecodeError {
        DecodeError::Malformed {
            header: self.header,
            reason,
        }
    }
}

/// Appends network-byte-order fields to an owned buffer.
#[derive(Debug)]
pub struct Writer<'a> {
    out: &'a mut Vec<u8>,
}

impl<'a> Writer<'a> {
    pub const fn new(out: &'a mut Vec<u8>) -> Self {
        Self { out }
    }

    pub fn u8(&mut self, value: u8) -> &mut Self {
        self.out.push(value);
        self
    }

    pub fn u16(&mut self, value: u16) -> &mut Self {
        let mut raw = [0u8; 2];
        NetworkEndian::write_u16(&mut raw, value);
        self.out.extend_from_slice(&raw);
        self
    }

    pub fn u32(&mut self, value: u32) -> &mut Self {
        let mut raw = [0u8; 4];
        NetworkEndian::write_u32(&mut raw, value);
        self.out.extend_from_slice(&raw);
        self
    }

    pub fn bytes(&mut self, value: &[u8]) -> &mut Self {
        self.out.extend_from_slice(value);
        self
    }
}
