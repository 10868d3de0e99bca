//! Integer weight tables and the score-to-weight mapping.
//!
//! The exact rank algorithms need each subkey's likelihood expressed as a
//! small non-negative integer: the dynamic program allocates one
//! accumulator per achievable total, so the weight range *is* the memory
//! budget. [`map_to_weight`] compresses a score table into that form, and
//! [`WeightTable`] carries the result along with the handful of queries the
//! rank algorithms ask of it.
//!
//! Weights order candidates the opposite way to scores: after the usual
//! `abs . log2 . normalise` pipeline a high likelihood becomes a small
//! weight, so the most likely key has the *minimum* total weight.

use crate::dimensions::{Dimensions, SubkeyLayout};
use crate::error::{Error, Result};
use crate::key::Key;
use crate::scores::ScoresTable;
use num_traits::{Float, NumCast, PrimInt, Unsigned};
use std::ops::{Index, IndexMut, Range};

/// Dense per-subkey unsigned integer weights for every vector of a layout.
///
/// Same shape as [`ScoresTable`]: one flat buffer, vector 0's entries
/// first. Rank algorithms consume these tables read-only.
#[derive(Clone, Debug)]
pub struct WeightTable<U, D = Dimensions> {
    dims: D,
    weights: Vec<U>,
}

impl<U: PrimInt + Unsigned, D: SubkeyLayout> WeightTable<U, D> {
    /// An all-zero table over `dims`.
    pub fn new(dims: D) -> Self {
        let weights = vec![U::zero(); dims.scores_count()];
        Self { dims, weights }
    }

    /// A table over `dims` filled with `weights`, vector 0's entries first.
    pub fn with_weights(dims: D, weights: Vec<U>) -> Result<Self> {
        let expected = dims.scores_count();
        if weights.len() != expected {
            return Err(Error::LengthMismatch {
                expected,
                actual: weights.len(),
            });
        }
        Ok(Self { dims, weights })
    }

    /// Bounds-checked read of the weight for subkey `s` of vector `v`.
    pub fn weight(&self, v: usize, s: usize) -> Result<U> {
        Ok(self.weights[self.checked_offset(v, s)?])
    }

    /// Bounds-checked mutable access to the weight for subkey `s` of
    /// vector `v`.
    pub fn weight_mut(&mut self, v: usize, s: usize) -> Result<&mut U> {
        let offset = self.checked_offset(v, s)?;
        Ok(&mut self.weights[offset])
    }

    /// The layout this table was built over.
    pub fn dimensions(&self) -> &D {
        &self.dims
    }

    /// The flat weight buffer, vector 0 first.
    pub fn all_weights(&self) -> &[U] {
        &self.weights
    }

    /// Mutable access to the flat weight buffer.
    pub fn all_weights_mut(&mut self) -> &mut [U] {
        &mut self.weights
    }

    /// Shift every weight so that the smallest becomes `new_min`.
    pub fn rebase(&mut self, new_min: U) {
        let Some(&min) = self.weights.iter().min() else {
            return;
        };
        if min >= new_min {
            let shift = min - new_min;
            for weight in &mut self.weights {
                *weight = *weight - shift;
            }
        } else {
            let shift = new_min - min;
            for weight in &mut self.weights {
                *weight = *weight + shift;
            }
        }
    }

    /// Sort each vector's weights ascending. Vector order is preserved.
    pub fn sort_ascending(&mut self) {
        for v in 0..self.dims.vector_count() {
            let bounds = self.vector_bounds(v);
            self.weights[bounds].sort_unstable();
        }
    }

    /// Sort each vector's weights descending. Vector order is preserved.
    pub fn sort_descending(&mut self) {
        for v in 0..self.dims.vector_count() {
            let bounds = self.vector_bounds(v);
            self.weights[bounds].sort_unstable_by(|a, b| b.cmp(a));
        }
    }

    /// Smallest achievable total key weight: the sum of each vector's
    /// minimum.
    pub fn minimum_weight(&self) -> U {
        let mut total = U::zero();
        for v in 0..self.dims.vector_count() {
            let bounds = self.vector_bounds(v);
            let min = self.weights[bounds]
                .iter()
                .copied()
                .min()
                .unwrap_or_else(U::zero);
            total = total + min;
        }
        total
    }

    /// Largest achievable total key weight: the sum of each vector's
    /// maximum.
    pub fn maximum_weight(&self) -> U {
        let mut total = U::zero();
        for v in 0..self.dims.vector_count() {
            let bounds = self.vector_bounds(v);
            let max = self.weights[bounds]
                .iter()
                .copied()
                .max()
                .unwrap_or_else(U::zero);
            total = total + max;
        }
        total
    }

    /// Total weight of `key`: the sum over vectors of the correct subkey's
    /// weight.
    pub fn weight_for_key(&self, key: &Key) -> Result<U> {
        if key.bit_len() < self.dims.key_length_bits() {
            return Err(Error::InvalidArgument(
                "key is shorter than the table's layout",
            ));
        }
        let mut total = U::zero();
        for (v, &span) in self.dims.as_spans().iter().enumerate() {
            let subkey: usize = key.subkey_value(span)?;
            total = total + self[(v, subkey)];
        }
        Ok(total)
    }

    fn checked_offset(&self, v: usize, s: usize) -> Result<usize> {
        if v >= self.dims.vector_count() || s >= self.dims.subkey_count(v) {
            return Err(Error::OutOfRange("weight index out of bounds"));
        }
        Ok(self.dims.scores_before_count(v) + s)
    }

    fn vector_bounds(&self, v: usize) -> Range<usize> {
        let start = self.dims.scores_before_count(v);
        start..start + self.dims.subkey_count(v)
    }
}

impl<U, D: SubkeyLayout> Index<(usize, usize)> for WeightTable<U, D> {
    type Output = U;

    /// Unchecked read: panics on out-of-bounds indices.
    fn index(&self, (v, s): (usize, usize)) -> &U {
        &self.weights[self.dims.scores_before_count(v) + s]
    }
}

impl<U, D: SubkeyLayout> IndexMut<(usize, usize)> for WeightTable<U, D> {
    /// Unchecked write: panics on out-of-bounds indices.
    fn index_mut(&mut self, (v, s): (usize, usize)) -> &mut U {
        let offset = self.dims.scores_before_count(v) + s;
        &mut self.weights[offset]
    }
}

/// Map floating scores onto small integer weights.
///
/// With `M` the table's maximum score, each score `x` becomes
/// `floor(x * 2^(precision_bits - log2 M))`, putting the weights in
/// `0..=2^precision_bits`. The result is then rebased so that the most
/// likely subkey has weight one, which shrinks the rank algorithms' search
/// space considerably.
///
/// Fails with [`Error::InvalidArgument`] when `precision_bits < 2` and with
/// [`Error::Logic`] when the maximum score is not positive.
pub fn map_to_weight<U, F, D>(
    table: &ScoresTable<F, D>,
    precision_bits: u32,
) -> Result<WeightTable<U, D>>
where
    U: PrimInt + Unsigned,
    F: Float,
    D: SubkeyLayout + Clone,
{
    if precision_bits < 2 {
        return Err(Error::InvalidArgument(
            "precision must be at least 2 bits",
        ));
    }

    let scores = table.all_scores();
    let max_score = scores.iter().copied().fold(F::neg_infinity(), F::max);
    let alpha = max_score.log2();
    if !alpha.is_finite() {
        return Err(Error::Logic(
            "maximum score must be positive to map to weights",
        ));
    }
    let exponent = F::from(precision_bits).unwrap_or_else(F::zero) - alpha;
    let multiplier = (F::one() + F::one()).powf(exponent);

    let mut weights = WeightTable::new(table.dimensions().clone());
    for (weight, &score) in weights.all_weights_mut().iter_mut().zip(scores) {
        let scaled = (score * multiplier).floor();
        *weight = <U as NumCast>::from(scaled).unwrap_or_else(U::zero);
    }

    weights.rebase(U::one());
    Ok(weights)
}
