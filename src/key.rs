//! Keys viewed as little-endian bitstrings.
//!
//! The attack target: a secret of `bit_len` bits stored in `ceil(bit_len/8)`
//! bytes. Bit `b` of the key lives in byte `b / 8` at bit offset `b % 8`,
//! so byte order is little-endian for the purposes of subkey extraction.
//! Hex input follows the written order instead: the leftmost character pair
//! becomes byte 0.

use crate::bitspan::BitSpan;
use crate::error::{Error, Result};
use num_traits::{PrimInt, Unsigned};
use rand::RngCore;

/// A key of a fixed bit length backed by an owned byte buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Key {
    bit_len: u32,
    bytes: Vec<u8>,
}

impl Key {
    /// Number of bytes required to store a key of `bit_len` bits.
    pub fn byte_count(bit_len: u32) -> usize {
        bit_len.div_ceil(8) as usize
    }

    /// Create a key of `bit_len` bits from raw bytes.
    pub fn from_bytes(bit_len: u32, bytes: &[u8]) -> Result<Self> {
        if bit_len == 0 {
            return Err(Error::InvalidArgument("key length must be > 0 bits"));
        }
        let expected = Self::byte_count(bit_len);
        if bytes.len() != expected {
            return Err(Error::LengthMismatch {
                expected,
                actual: bytes.len(),
            });
        }
        Ok(Self {
            bit_len,
            bytes: bytes.to_vec(),
        })
    }

    /// Parse a key from ASCII hex of exactly `2 * byte_count` characters.
    ///
    /// Case-insensitive, no `0x` prefix. Character pairs decode left to
    /// right into `bytes[0], bytes[1], ...`.
    pub fn from_hex(bit_len: u32, hex: &str) -> Result<Self> {
        if bit_len == 0 {
            return Err(Error::InvalidArgument("key length must be > 0 bits"));
        }
        let expected = Self::byte_count(bit_len) * 2;
        if hex.len() != expected {
            return Err(Error::LengthMismatch {
                expected,
                actual: hex.len(),
            });
        }
        if !hex.bytes().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidArgument("hex string contains a non-hex character"));
        }
        let bytes = hex
            .as_bytes()
            .chunks(2)
            .map(|pair| {
                let high = hex_digit(pair[0]);
                let low = hex_digit(pair[1]);
                (high << 4) | low
            })
            .collect();
        Ok(Self { bit_len, bytes })
    }

    /// Fill a key of `bit_len` bits with uniform random bytes.
    pub fn random<R: RngCore>(bit_len: u32, rng: &mut R) -> Self {
        let mut bytes = vec![0u8; Self::byte_count(bit_len)];
        rng.fill_bytes(&mut bytes);
        Self { bit_len, bytes }
    }

    /// The key's width in bits.
    pub fn bit_len(&self) -> u32 {
        self.bit_len
    }

    /// The key's backing bytes, least significant first.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Extract the integer value of the subkey covered by `span`.
    ///
    /// Bit `start + i` of the key lands at bit `i` of the result. Fails with
    /// [`Error::OutOfRange`] when `span.count()` exceeds `I`'s width.
    pub fn subkey_value<I: PrimInt + Unsigned>(&self, span: BitSpan) -> Result<I> {
        let digits = I::zero().count_zeros();
        if span.count() > digits {
            return Err(Error::OutOfRange("subkey does not fit the integer type"));
        }
        let mut value = I::zero();
        for bit in span.start()..=span.end() {
            let byte_index = (bit / 8) as usize;
            let bit_offset = bit % 8;
            if (self.bytes[byte_index] >> bit_offset) & 1 != 0 {
                value = value | (I::one() << (bit - span.start()) as usize);
            }
        }
        Ok(value)
    }

    /// Reinterpret the whole key as a little-endian integer.
    ///
    /// Fails with [`Error::OutOfRange`] when the key is wider than `I`.
    pub fn as_le_integer<I: PrimInt + Unsigned>(&self) -> Result<I> {
        let digits = I::zero().count_zeros();
        if self.bit_len > digits {
            return Err(Error::OutOfRange("key does not fit the integer type"));
        }
        let mut value = I::zero();
        for (index, &byte) in self.bytes.iter().enumerate() {
            let byte_value =
                I::from(byte).ok_or(Error::OutOfRange("key does not fit the integer type"))?;
            value = value + (byte_value << (index * 8));
        }
        Ok(value)
    }
}

fn hex_digit(c: u8) -> u8 {
    match c {
        b'0'..=b'9' => c - b'0',
        b'a'..=b'f' => c - b'a' + 10,
        _ => c - b'A' + 10,
    }
}
