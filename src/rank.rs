//! Exact and approximate key rank computation.
//!
//! *How deep in the attacker's enumeration does the true key sit, without
//! enumerating?*
//!
//! Given integer weights for every subkey of every vector, the total weight
//! of a candidate key is the sum of its subkeys' weights, and its rank is
//! the number of candidates with a strictly smaller total. Counting those
//! candidates directly is hopeless (`2^128` for an AES key), but the counts
//! factor across vectors: the number of ways to spend a remaining weight
//! budget over vectors `v..n` only depends on the budget, not on how it was
//! reached. A dynamic program over `target` budget slots therefore counts
//! every candidate in `O(n * 2^w * target)` steps.
//!
//! Three exact variants share that recurrence:
//!
//! - [`rank`] / [`rank_for_key`]: two buffers of `target` accumulators.
//! - [`rank_low_mem`]: one buffer, updated in place.
//! - [`rank_all_weights`]: the full cumulative distribution, one count per
//!   weight up to the target.
//!
//! [`approximate_rank`] skips the dynamic program entirely and multiplies
//! per-vector ranks, which is cheap but blind to cross-vector correlation.
//!
//! Accumulators are generic: machine integers are fine for test-sized
//! problems, `num_bigint::BigUint` for real key lengths where ranks exceed
//! `2^64`.

use crate::dimensions::SubkeyLayout;
use crate::error::{Error, Result};
use crate::key::Key;
use crate::scores::ScoresTable;
use crate::weights::WeightTable;
use num_traits::{Float, One, PrimInt, Unsigned, Zero};
use std::ops::{AddAssign, MulAssign};

/// Capabilities a rank accumulator needs.
///
/// Blanket-implemented, so `u32`/`u64` qualify for small problems and
/// `num_bigint::BigUint` for real key sizes.
pub trait RankValue: Zero + One + AddAssign + MulAssign + Clone {}

impl<T> RankValue for T where T: Zero + One + AddAssign + MulAssign + Clone {}

/// Count key candidates whose total weight is strictly below `max_weight`.
///
/// Fails with [`Error::InvalidArgument`] when `max_weight` is zero. The
/// weight table is trusted: its entries must describe the same layout the
/// caller ranks against.
pub fn rank<R, U, D>(max_weight: U, weights: &WeightTable<U, D>) -> Result<R>
where
    R: RankValue,
    U: PrimInt + Unsigned,
    D: SubkeyLayout,
{
    let target = checked_target(max_weight)?;
    let dims = weights.dimensions();
    if dims.vector_count() == 0 {
        return Err(Error::InvalidArgument("layout has no vectors"));
    }

    let mut curr = vec![R::zero(); target];
    let mut prev = vec![R::one(); target];

    // every vector except the original-order first, visited in reverse
    for v in (1..dims.vector_count()).rev() {
        for s in (0..dims.subkey_count(v)).rev() {
            accumulate(&mut curr, &prev, weights[(v, s)], target);
        }
        prev.clone_from_slice(&curr);
        curr.fill(R::zero());
    }

    // the remaining budget must cover vector 0 exactly, so only the
    // zero-weight slot is ever read from it
    let mut total = R::zero();
    for s in (0..dims.subkey_count(0)).rev() {
        if let Some(weight) = weights[(0, s)].to_usize() {
            if weight < target {
                total += prev[weight].clone();
            }
        }
    }
    Ok(total)
}

/// Rank `key` itself: the number of candidates the attack would try before
/// it.
///
/// The target is the key's own total weight; fails with
/// [`Error::InvalidArgument`] when that weight is zero.
pub fn rank_for_key<R, U, D>(key: &Key, weights: &WeightTable<U, D>) -> Result<R>
where
    R: RankValue,
    U: PrimInt + Unsigned,
    D: SubkeyLayout,
{
    let key_weight = weights.weight_for_key(key)?;
    if key_weight.is_zero() {
        return Err(Error::InvalidArgument("the key's weight must be > 0"));
    }
    rank(key_weight, weights)
}

/// Same count as [`rank`] with half the accumulator storage.
///
/// A single buffer is updated in place. This is sound because weights are
/// non-negative: each slot only ever reads slots at equal or higher
/// indices, which still hold the previous vector's counts. Requires a
/// layout of at least two vectors.
pub fn rank_low_mem<R, U, D>(max_weight: U, weights: &WeightTable<U, D>) -> Result<R>
where
    R: RankValue,
    U: PrimInt + Unsigned,
    D: SubkeyLayout,
{
    let target = checked_target(max_weight)?;
    let dims = weights.dimensions();
    let vector_count = dims.vector_count();
    if vector_count < 2 {
        return Err(Error::InvalidArgument(
            "low-memory ranking needs at least two vectors",
        ));
    }

    let mut curr = vec![R::zero(); target];

    // seed from the original-order last vector: counts of its subkeys that
    // leave budget `wi` unspent
    let last = vector_count - 1;
    for wi in 0..target {
        let mut entry = R::zero();
        for s in 0..dims.subkey_count(last) {
            if let Some(weight) = weights[(last, s)].to_usize() {
                if weight < target && wi < target - weight {
                    entry += R::one();
                }
            }
        }
        curr[wi] = entry;
    }

    // middle vectors, in place
    for v in (1..last).rev() {
        for wi in 0..target {
            let mut entry = R::zero();
            for s in 0..dims.subkey_count(v) {
                if let Some(weight) = weights[(v, s)].to_usize() {
                    if weight < target && wi < target - weight {
                        entry += curr[wi + weight].clone();
                    }
                }
            }
            curr[wi] = entry;
        }
    }

    // final reduction: vector 0 must consume the remaining budget exactly
    let mut total = R::zero();
    for s in 0..dims.subkey_count(0) {
        if let Some(weight) = weights[(0, s)].to_usize() {
            if weight < target {
                total += curr[weight].clone();
            }
        }
    }
    Ok(total)
}

/// The cumulative rank distribution up to `max_weight`.
///
/// Entry `i` of the result counts candidates whose total weight is at most
/// `i` (strictly below `i + 1`), so ranking up to one past the table's
/// [`WeightTable::maximum_weight`] ranks every candidate. Fails with
/// [`Error::InvalidArgument`] when `max_weight` is zero.
pub fn rank_all_weights<R, U, D>(max_weight: U, weights: &WeightTable<U, D>) -> Result<Vec<R>>
where
    R: RankValue,
    U: PrimInt + Unsigned,
    D: SubkeyLayout,
{
    let target = checked_target(max_weight)?;
    let dims = weights.dimensions();

    let mut curr = vec![R::zero(); target];
    let mut prev = vec![R::one(); target];

    for v in (0..dims.vector_count()).rev() {
        for s in (0..dims.subkey_count(v)).rev() {
            accumulate(&mut curr, &prev, weights[(v, s)], target);
        }
        prev.clone_from_slice(&curr);
        curr.fill(R::zero());
    }

    // counts are produced highest target first
    prev.reverse();
    Ok(prev)
}

/// Product of per-vector independent subkey ranks.
///
/// For each vector, counts the rival subkeys whose score `better`s the
/// correct subkey's score (strictly-greater for a maximising attack), and
/// multiplies the per-vector ranks together. Ignores cross-vector
/// correlation, so this is only an estimate of the true rank, but one
/// that costs a single pass over the score table.
pub fn approximate_rank<R, F, D>(
    scores: &ScoresTable<F, D>,
    key: &Key,
    better: impl Fn(F, F) -> bool,
) -> Result<R>
where
    R: RankValue,
    F: Float,
    D: SubkeyLayout,
{
    let dims = scores.dimensions();
    let mut approximated = R::one();
    for (v, &span) in dims.as_spans().iter().enumerate() {
        let correct: usize = key.subkey_value(span)?;
        let correct_score = scores[(v, correct)];

        // the correct subkey itself counts as one
        let mut vector_rank = R::one();
        for s in 0..dims.subkey_count(v) {
            if s != correct && better(scores[(v, s)], correct_score) {
                vector_rank += R::one();
            }
        }
        approximated *= vector_rank;
    }
    Ok(approximated)
}

fn checked_target<U: PrimInt + Unsigned>(max_weight: U) -> Result<usize> {
    if max_weight.is_zero() {
        return Err(Error::InvalidArgument("the weight to rank to must be > 0"));
    }
    max_weight
        .to_usize()
        .ok_or(Error::Overflow("target weight does not fit in memory"))
}

/// One subkey's contribution: every budget slot that can still afford
/// `weight` inherits the count at the slot `weight` above it.
fn accumulate<R, U>(curr: &mut [R], prev: &[R], weight: U, target: usize)
where
    R: RankValue,
    U: PrimInt + Unsigned,
{
    let Some(weight) = weight.to_usize() else {
        return;
    };
    if weight > target {
        return;
    }
    for cw in (0..target - weight).rev() {
        let carried = prev[cw + weight].clone();
        curr[cw] += carried;
    }
}
