//! Bit and nibble primitives shared by every header codec.
//!
//! Bit indices count from the least-significant bit: index 0 is `0x01`,
//! index 7 is `0x80`. Fields that the protocols define most-significant-bit
//! first (IPv4 fragment flags, TCP control bits) are mapped onto these
//! indices by their codec.

use crate::error::BitError;

/// Order in which a bit sequence is interpreted by [`bits_to_uint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitOrder {
    /// The first element is the least-significant bit.
    LsbFirst,
    /// The first element is the most-significant bit.
    MsbFirst,
}

/// Returns the least-significant four bits of `byte`.
#[inline]
pub const fn low_nibble(byte: u8) -> u8 {
    byte & 0x0f
}

/// Returns the most-significant four bits of `byte`.
#[inline]
pub const fn high_nibble(byte: u8) -> u8 {
    byte >> 4
}

/// Packs two nibbles into one byte. Both inputs are masked to four bits.
#[inline]
pub const fn combine_nibbles(high: u8, low: u8) -> u8 {
    ((high & 0x0f) << 4) | (low & 0x0f)
}

/// Returns the bit at `index` (0..=7).
#[inline]
pub const fn get_bit(byte: u8, index: u8) -> bool {
    debug_assert!(index < 8);
    byte & (1 << (index & 7)) != 0
}

/// Returns `byte` with the bit at `index` (0..=7) set to `value`.
#[inline]
pub const fn set_bit(byte: u8, index: u8, value: bool) -> u8 {
    debug_assert!(index < 8);
    let mask = 1 << (index & 7);
    if value { byte | mask } else { byte & !mask }
}

/// Returns `byte` with every bit from `start` to `end` (inclusive) set to `value`.
///
/// An empty range (`start > end`) leaves the byte untouched.
pub fn set_bit_range(byte: u8, value: bool, start: u8, end: u8) -> u8 {
    (start..=end.min(7)).fold(byte, |acc, index| set_bit(acc, index, value))
}

/// Unsigned integer types that [`bits_to_uint`] can produce.
pub trait UnsignedBits: Copy {
    const BITS: u32;
    fn from_u64(value: u64) -> Self;
}

macro_rules! impl_unsigned_bits {
    ($($ty:ty),*) => {
        $(
            impl UnsignedBits for $ty {
                const BITS: u32 = <$ty>::BITS;

                #[inline]
                #[allow(clippy::cast_possible_truncation)]
                fn from_u64(value: u64) -> Self {
                    value as $ty
                }
            }
        )*
    };
}

impl_unsigned_bits!(u8, u16, u32, u64);

/// Converts a sequence of bits into an unsigned integer.
///
/// Fails if the sequence is longer than the target type is wide.
pub fn bits_to_uint<T: UnsignedBits>(bits: &[bool], order: BitOrder) -> Result<T, BitError> {
    if bits.len() > T::BITS as usize {
        return Err(BitError::TooManyBits {
            bits: bits.len(),
            width: T::BITS,
        });
    }

    let fold = |acc: u64, bit: &bool| (acc << 1) | u64::from(*bit);
    let value = match order {
        BitOrder::MsbFirst => bits.iter().fold(0, fold),
        BitOrder::LsbFirst => bits.iter().rev().fold(0, fold),
    };

    Ok(T::from_u64(value))
}

/// Expands a byte into its eight bits, least-significant first.
pub fn byte_to_bits(byte: u8) -> [bool; 8] {
    std::array::from_fn(|index| get_bit(byte, index as u8))
}
