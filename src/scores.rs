//! Per-subkey score tables and the transforms that shape them.
//!
//! Distinguishers emit a real-valued score for every candidate subkey of
//! every vector: correlations, log-likelihoods, template probabilities.
//! Scores arrive in whatever range the attack produced and are massaged in
//! place (made positive, normalised to probabilities, pushed through a
//! logarithm) until [`crate::weights::map_to_weight`] can turn them into
//! the small integer weights the rank algorithms need.
//!
//! Storage is a single flat buffer: vector 0's entries first, then vector
//! 1's, with `(v, s)` at offset `scores_before_count(v) + s`. The
//! equal-width case degenerates to `v * subkey_count + s`, which keeps the
//! inner loops of every consumer sequential in memory.

use crate::bitspan::BitSpan;
use crate::dimensions::{Dimensions, SubkeyLayout};
use crate::error::{Error, Result};
use crate::numeric::kahan_sum;
use num_traits::Float;
use std::ops::{Index, IndexMut, Range};

/// Additive fudge applied by [`ScoresTable::translate_vectors_to_positive`]
/// so that no score is exactly zero after translation.
pub const SCORE_EPSILON: f64 = 1e-6;

/// Dense per-subkey floating-point scores for every vector of a layout.
#[derive(Clone, Debug)]
pub struct ScoresTable<F, D = Dimensions> {
    dims: D,
    scores: Vec<F>,
}

impl<F: Float, D: SubkeyLayout> ScoresTable<F, D> {
    /// The translation fudge as the table's score type.
    pub fn epsilon() -> F {
        F::from(SCORE_EPSILON).unwrap_or_else(F::epsilon)
    }

    /// An all-zero table over `dims`.
    pub fn new(dims: D) -> Self {
        let scores = vec![F::zero(); dims.scores_count()];
        Self { dims, scores }
    }

    /// A table over `dims` filled with `scores`, vector 0's entries first.
    pub fn with_scores(dims: D, scores: Vec<F>) -> Result<Self> {
        let expected = dims.scores_count();
        if scores.len() != expected {
            return Err(Error::LengthMismatch {
                expected,
                actual: scores.len(),
            });
        }
        Ok(Self { dims, scores })
    }

    /// Bounds-checked read of the score for subkey `s` of vector `v`.
    pub fn score(&self, v: usize, s: usize) -> Result<F> {
        Ok(self.scores[self.checked_offset(v, s)?])
    }

    /// Bounds-checked mutable access to the score for subkey `s` of
    /// vector `v`.
    pub fn score_mut(&mut self, v: usize, s: usize) -> Result<&mut F> {
        let offset = self.checked_offset(v, s)?;
        Ok(&mut self.scores[offset])
    }

    /// The layout this table was built over.
    pub fn dimensions(&self) -> &D {
        &self.dims
    }

    /// The flat score buffer, vector 0 first.
    pub fn all_scores(&self) -> &[F] {
        &self.scores
    }

    /// Mutable access to the flat score buffer.
    pub fn all_scores_mut(&mut self) -> &mut [F] {
        &mut self.scores
    }

    /// Scale each vector so that its entries sum to one.
    pub fn normalise_vectors(&mut self) {
        for v in 0..self.dims.vector_count() {
            let bounds = self.vector_bounds(v);
            let sum = kahan_sum(self.scores[bounds.clone()].iter().copied());
            let constant = F::one() / sum;
            for score in &mut self.scores[bounds] {
                *score = *score * constant;
            }
        }
    }

    /// Element-wise absolute value.
    pub fn abs(&mut self) {
        for score in &mut self.scores {
            *score = score.abs();
        }
    }

    /// Element-wise logarithm in `base`.
    pub fn log(&mut self, base: F) {
        let log_base = base.ln();
        for score in &mut self.scores {
            *score = score.ln() / log_base;
        }
    }

    /// Element-wise base-2 logarithm.
    pub fn log2(&mut self) {
        self.log(F::one() + F::one());
    }

    /// Shift every score so that the smallest becomes [`Self::epsilon`].
    ///
    /// The shift is computed from the minimum over the whole table, not per
    /// vector. A table whose minimum is already positive is left untouched.
    pub fn translate_vectors_to_positive(&mut self) {
        let min = self.scores.iter().copied().fold(F::infinity(), F::min);
        if min <= F::zero() {
            let epsilon = Self::epsilon();
            for score in &mut self.scores {
                *score = (*score - min) + epsilon;
            }
        }
    }

    /// Replace the block of scores belonging to `span` with `values`.
    ///
    /// `span` must be exactly one of the layout's vectors and `values` must
    /// have one entry per subkey of that vector.
    pub fn add_scores(&mut self, span: BitSpan, values: &[F]) -> Result<()> {
        let v = self
            .dims
            .as_spans()
            .iter()
            .position(|&candidate| candidate == span)
            .ok_or(Error::InvalidArgument(
                "span does not match any vector of the table",
            ))?;
        let expected = self.dims.subkey_count(v);
        if values.len() != expected {
            return Err(Error::LengthMismatch {
                expected,
                actual: values.len(),
            });
        }
        let bounds = self.vector_bounds(v);
        self.scores[bounds].copy_from_slice(values);
        Ok(())
    }

    /// Combine adjacent vector pairs into half as many double-width vectors.
    ///
    /// Vector `2m` supplies the high half of each merged subkey index and
    /// vector `2m + 1` the low half; the merged score is their product.
    /// Requires equal widths and an even, non-zero vector count.
    pub fn merge_vectors(&self) -> Result<ScoresTable<F, Dimensions>> {
        if !self.dims.is_equal_width() {
            return Err(Error::InvalidArgument(
                "vectors must have equal widths to merge",
            ));
        }
        let vector_count = self.dims.vector_count();
        if vector_count == 0 || vector_count % 2 != 0 {
            return Err(Error::InvalidArgument(
                "an even, non-zero number of vectors is required to merge",
            ));
        }
        let width = self.dims.vector_width_bits(0);
        let mask = (1usize << width) - 1;
        let merged_dims = Dimensions::uniform(vector_count / 2, width * 2)?;
        let mut merged = ScoresTable::new(merged_dims);
        for m in 0..vector_count / 2 {
            let rear = 2 * m;
            let front = 2 * m + 1;
            for s in 0..merged.dims.subkey_count(m) {
                merged[(m, s)] = self[(rear, s >> width)] * self[(front, s & mask)];
            }
        }
        Ok(merged)
    }

    fn checked_offset(&self, v: usize, s: usize) -> Result<usize> {
        if v >= self.dims.vector_count() || s >= self.dims.subkey_count(v) {
            return Err(Error::OutOfRange("score index out of bounds"));
        }
        Ok(self.dims.scores_before_count(v) + s)
    }

    fn vector_bounds(&self, v: usize) -> Range<usize> {
        let start = self.dims.scores_before_count(v);
        start..start + self.dims.subkey_count(v)
    }
}

impl<F, D: SubkeyLayout> Index<(usize, usize)> for ScoresTable<F, D> {
    type Output = F;

    /// Unchecked read: panics on out-of-bounds indices.
    fn index(&self, (v, s): (usize, usize)) -> &F {
        &self.scores[self.dims.scores_before_count(v) + s]
    }
}

impl<F, D: SubkeyLayout> IndexMut<(usize, usize)> for ScoresTable<F, D> {
    /// Unchecked write: panics on out-of-bounds indices.
    fn index_mut(&mut self, (v, s): (usize, usize)) -> &mut F {
        let offset = self.dims.scores_before_count(v) + s;
        &mut self.scores[offset]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_2x2() -> ScoresTable<f64> {
        let dims = Dimensions::uniform(2, 2).unwrap();
        ScoresTable::with_scores(dims, vec![3.0, 4.0, 6.0, 7.0, 0.0, 1.0, 3.0, 4.0]).unwrap()
    }

    #[test]
    fn test_score_checked() {
        let table = table_2x2();
        assert_eq!(table.score(0, 0).unwrap(), 3.0);
        assert_eq!(table.score(0, 1).unwrap(), 4.0);
        assert_eq!(table.score(0, 2).unwrap(), 6.0);
        assert_eq!(table.score(0, 3).unwrap(), 7.0);
        assert_eq!(table.score(1, 0).unwrap(), 0.0);
        assert_eq!(table.score(1, 1).unwrap(), 1.0);
        assert_eq!(table.score(1, 2).unwrap(), 3.0);
        assert_eq!(table.score(1, 3).unwrap(), 4.0);
        assert!(table.score(2, 0).is_err());
        assert!(table.score(0, 4).is_err());
    }

    #[test]
    fn test_score_unchecked() {
        let table = table_2x2();
        assert_eq!(table[(0, 0)], 3.0);
        assert_eq!(table[(0, 3)], 7.0);
        assert_eq!(table[(1, 0)], 0.0);
        assert_eq!(table[(1, 3)], 4.0);
    }

    #[test]
    fn test_score_set() {
        let mut table = table_2x2();
        *table.score_mut(1, 0).unwrap() = 6.0;
        assert_eq!(table.score(1, 0).unwrap(), 6.0);
        table[(1, 0)] = 7.0;
        assert_eq!(table[(1, 0)], 7.0);
    }

    #[test]
    fn test_with_scores_length_error() {
        let dims = Dimensions::uniform(2, 2).unwrap();
        assert!(matches!(
            ScoresTable::with_scores(dims, vec![1.0, 2.0, 3.0]),
            Err(Error::LengthMismatch { expected: 8, actual: 3 })
        ));
    }

    #[test]
    fn test_normalise_vectors() {
        let dims = Dimensions::uniform(2, 3).unwrap();
        let scores = vec![
            -4.3, 1.2, 0.7, -0.2, 3.9, 2.1, -1.5, 0.4, // vector 0
            2.5, 0.1, -3.3, 4.8, -0.9, 1.7, 0.2, -2.6, // vector 1
        ];
        let mut table = ScoresTable::with_scores(dims, scores).unwrap();
        table.normalise_vectors();

        let all = table.all_scores();
        let sum0: f64 = all[..8].iter().sum();
        let sum1: f64 = all[8..].iter().sum();
        assert!((sum0 - 1.0).abs() < 1e-6);
        assert!((sum1 - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_abs() {
        let dims = Dimensions::uniform(2, 2).unwrap();
        let mut table =
            ScoresTable::with_scores(dims, vec![-3.0, 4.0, -0.5, 7.0, 0.0, -1.0, 3.0, -4.0])
                .unwrap();
        table.abs();
        assert_eq!(
            table.all_scores(),
            &[3.0, 4.0, 0.5, 7.0, 0.0, 1.0, 3.0, 4.0]
        );
    }

    #[test]
    fn test_translate_vectors_to_positive() {
        let dims = Dimensions::uniform(2, 2).unwrap();
        let mut table =
            ScoresTable::with_scores(dims, vec![-3.25, 4.0, -0.5, 7.0, 0.0, 1.0, 3.0, 4.0])
                .unwrap();
        table.translate_vectors_to_positive();

        let epsilon = ScoresTable::<f64>::epsilon();
        let min = table.all_scores().iter().copied().fold(f64::INFINITY, f64::min);
        let max = table
            .all_scores()
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(min, epsilon);
        assert_eq!(max, 7.0 + 3.25 + epsilon);
    }

    #[test]
    fn test_translate_already_positive_is_identity() {
        let dims = Dimensions::uniform(2, 2).unwrap();
        let scores = vec![3.0, 4.0, 0.5, 7.0, 2.0, 1.0, 3.0, 4.0];
        let mut table = ScoresTable::with_scores(dims, scores.clone()).unwrap();
        table.translate_vectors_to_positive();
        assert_eq!(table.all_scores(), &scores[..]);
    }

    #[test]
    fn test_log2() {
        let dims = Dimensions::uniform(2, 2).unwrap();
        let mut table =
            ScoresTable::with_scores(dims, vec![1.0, 2.0, 4.0, 8.0, 16.0, 32.0, 0.5, 1.0])
                .unwrap();
        table.log2();
        let expected = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, -1.0, 0.0];
        for (actual, want) in table.all_scores().iter().zip(expected) {
            assert!((actual - want).abs() < 1e-12);
        }
    }

    #[test]
    fn test_merge_vectors() {
        let dims = Dimensions::uniform(2, 2).unwrap();
        let table =
            ScoresTable::with_scores(dims, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]).unwrap();
        let merged = table.merge_vectors().unwrap();

        assert_eq!(merged.dimensions().vector_count(), 1);
        assert_eq!(merged.dimensions().vector_width_bits(0), 4);
        let expected = [
            5.0, 6.0, 7.0, 8.0, 10.0, 12.0, 14.0, 16.0, 15.0, 18.0, 21.0, 24.0, 20.0, 24.0, 28.0,
            32.0,
        ];
        assert_eq!(merged.all_scores(), &expected);
    }

    #[test]
    fn test_merge_four_vectors() {
        let dims = Dimensions::uniform(4, 2).unwrap();
        let table = ScoresTable::with_scores(
            dims,
            vec![
                1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0,
            ],
        )
        .unwrap();
        let merged = table.merge_vectors().unwrap();

        let expected = [
            5.0, 6.0, 7.0, 8.0, 10.0, 12.0, 14.0, 16.0, 15.0, 18.0, 21.0, 24.0, 20.0, 24.0, 28.0,
            32.0, 5.0, 6.0, 7.0, 8.0, 10.0, 12.0, 14.0, 16.0, 15.0, 18.0, 21.0, 24.0, 20.0, 24.0,
            28.0, 32.0,
        ];
        assert_eq!(merged.all_scores(), &expected);
    }

    #[test]
    fn test_merge_vectors_invalid() {
        // odd number of vectors
        let dims = Dimensions::uniform(3, 1).unwrap();
        let table =
            ScoresTable::with_scores(dims, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert!(matches!(
            table.merge_vectors(),
            Err(Error::InvalidArgument(_))
        ));

        // uneven widths
        let dims = Dimensions::from_widths(&[2, 3]).unwrap();
        let table = ScoresTable::with_scores(
            dims,
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0],
        )
        .unwrap();
        assert!(matches!(
            table.merge_vectors(),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_add_scores() {
        let values = [1.1, 2.2, 3.3, 4.4, 5.5, 6.6, 7.7, 8.8];
        let dims = Dimensions::uniform(2, 2).unwrap();
        let mut table = ScoresTable::new(dims);
        table
            .add_scores(BitSpan::new(0, 2).unwrap(), &values[..4])
            .unwrap();
        table
            .add_scores(BitSpan::new(2, 2).unwrap(), &values[4..])
            .unwrap();
        assert_eq!(table.all_scores(), &values);
    }

    #[test]
    fn test_add_scores_invalid() {
        let values = [1.1, 2.2, 3.3, 4.4, 5.5, 6.6, 7.7, 8.8];
        let dims = Dimensions::uniform(2, 2).unwrap();
        let mut table = ScoresTable::<f64>::new(dims);

        // no such vector
        assert!(matches!(
            table.add_scores(BitSpan::new(0, 3).unwrap(), &values),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            table.add_scores(BitSpan::new(1, 2).unwrap(), &values[..4]),
            Err(Error::InvalidArgument(_))
        ));

        // too few or too many scores for a valid span
        assert!(matches!(
            table.add_scores(BitSpan::new(0, 2).unwrap(), &values[..3]),
            Err(Error::LengthMismatch { expected: 4, actual: 3 })
        ));
        assert!(matches!(
            table.add_scores(BitSpan::new(0, 2).unwrap(), &values[..5]),
            Err(Error::LengthMismatch { expected: 4, actual: 5 })
        ));
    }
}
