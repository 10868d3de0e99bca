//! Partitioning a key into subkey vectors of declared bit widths.
//!
//! A divide-and-conquer attack scores each slice of the key independently.
//! The layout of those slices (how many vectors, how wide each one is,
//! where each sits in the key) is what the score and weight tables and the
//! rank algorithms all consult. [`SubkeyLayout`] is that interface; the
//! algorithms are written once against it, so a runtime-described layout
//! ([`Dimensions`]) and a compile-time equal-width one ([`FixedDimensions`])
//! share a single code path.

use crate::bitspan::BitSpan;
use crate::error::Result;

/// Queries over a partition of a key into contiguous subkey vectors.
///
/// Implementors supply the ordered span list; every derived query has a
/// default implementation in terms of it. Spans are contiguous and
/// non-overlapping: vector `i + 1` starts at vector `i`'s `end() + 1`.
pub trait SubkeyLayout {
    /// The ordered spans covering the key, lowest bits first.
    fn as_spans(&self) -> &[BitSpan];

    /// Number of subkey vectors.
    fn vector_count(&self) -> usize {
        self.as_spans().len()
    }

    /// Width in bits of vector `index`.
    fn vector_width_bits(&self, index: usize) -> u32 {
        self.as_spans()[index].count()
    }

    /// Total key width in bits.
    fn key_length_bits(&self) -> u32 {
        self.as_spans().iter().map(BitSpan::count).sum()
    }

    /// Bytes needed to store a key of this width.
    fn key_byte_count(&self) -> usize {
        self.key_length_bits().div_ceil(8) as usize
    }

    /// Number of subkeys (possible values) of vector `index`.
    fn subkey_count(&self, index: usize) -> usize {
        1usize << self.as_spans()[index].count()
    }

    /// Total number of score entries across all vectors.
    fn scores_count(&self) -> usize {
        self.as_spans().iter().map(|span| 1usize << span.count()).sum()
    }

    /// Number of score entries belonging to vectors before `index`.
    fn scores_before_count(&self, index: usize) -> usize {
        self.as_spans()[..index]
            .iter()
            .map(|span| 1usize << span.count())
            .sum()
    }

    /// Bit position at which vector `index` starts.
    fn bit_offset(&self, index: usize) -> u32 {
        self.as_spans()[..index].iter().map(BitSpan::count).sum()
    }

    /// True when every vector has the same width.
    fn is_equal_width(&self) -> bool {
        self.as_spans()
            .windows(2)
            .all(|pair| pair[0].count() == pair[1].count())
    }
}

/// Runtime-described partition of a key into subkey vectors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dimensions {
    spans: Vec<BitSpan>,
}

impl Dimensions {
    /// Lay the given widths out contiguously from bit 0.
    pub fn from_widths(widths: &[u32]) -> Result<Self> {
        let mut spans = Vec::with_capacity(widths.len());
        let mut offset = 0u32;
        for &width in widths {
            spans.push(BitSpan::new(offset, width)?);
            offset += width;
        }
        Ok(Self { spans })
    }

    /// `vector_count` vectors of `width_bits` bits each.
    pub fn uniform(vector_count: usize, width_bits: u32) -> Result<Self> {
        Self::from_widths(&vec![width_bits; vector_count])
    }
}

impl SubkeyLayout for Dimensions {
    fn as_spans(&self) -> &[BitSpan] {
        &self.spans
    }
}

/// Equal-width partition with the vector count and width fixed at compile
/// time.
///
/// Offers the same surface as [`Dimensions`] through [`SubkeyLayout`], with
/// the derived queries replaced by constant-time arithmetic.
#[derive(Clone, Copy, Debug)]
pub struct FixedDimensions<const VECTORS: usize, const WIDTH_BITS: u32> {
    spans: [BitSpan; VECTORS],
}

impl<const VECTORS: usize, const WIDTH_BITS: u32> FixedDimensions<VECTORS, WIDTH_BITS> {
    /// Build the span table for the fixed layout. `WIDTH_BITS` must be at
    /// least 1.
    pub fn new() -> Self {
        let spans = std::array::from_fn(|index| {
            BitSpan::new_unchecked(index as u32 * WIDTH_BITS, WIDTH_BITS)
        });
        Self { spans }
    }
}

impl<const VECTORS: usize, const WIDTH_BITS: u32> Default for FixedDimensions<VECTORS, WIDTH_BITS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const VECTORS: usize, const WIDTH_BITS: u32> SubkeyLayout
    for FixedDimensions<VECTORS, WIDTH_BITS>
{
    fn as_spans(&self) -> &[BitSpan] {
        &self.spans
    }

    fn vector_count(&self) -> usize {
        VECTORS
    }

    fn vector_width_bits(&self, _index: usize) -> u32 {
        WIDTH_BITS
    }

    fn key_length_bits(&self) -> u32 {
        VECTORS as u32 * WIDTH_BITS
    }

    fn subkey_count(&self, _index: usize) -> usize {
        1usize << WIDTH_BITS
    }

    fn scores_count(&self) -> usize {
        VECTORS << WIDTH_BITS
    }

    fn scores_before_count(&self, index: usize) -> usize {
        index << WIDTH_BITS
    }

    fn bit_offset(&self, index: usize) -> u32 {
        index as u32 * WIDTH_BITS
    }

    fn is_equal_width(&self) -> bool {
        true
    }
}
