//! # Key Rank Estimation
//!
//! *How secure is a key after a side-channel attack that almost worked?*
//!
//! ## Intuition First
//!
//! A divide-and-conquer side-channel attack does not output "the key". It
//! outputs, for each byte (or other slice) of the key, a score for every
//! candidate value of that slice. An attacker then enumerates full keys
//! from most to least likely and tries each one. The security question is:
//! how many candidates come before the true key in that enumeration?
//!
//! That position is the key's **rank**. A rank of `2^20` means the attack
//! effectively succeeded; a rank of `2^70` means the leakage, although
//! real, left the key out of practical reach. Rank estimation answers the
//! question *without* enumerating: evaluators know the true key, so the
//! position can be counted rather than searched for.
//!
//! ## The Problem
//!
//! The candidate space is the product of the per-slice candidate sets
//! (`2^128` for AES-128 attacked byte-wise). Enumerating to measure depth
//! is exactly the work the defender wants to prove infeasible.
//!
//! ## Historical Context
//!
//! ```text
//! 2012  Veyrat-Charvillon et al.  Optimal key enumeration from per-slice scores
//! 2013  Veyrat-Charvillon et al.  Rank estimation: security beyond enumeration
//! 2015  Glowacz et al.            Histogram convolution rank estimation
//! 2015  Martin et al.             Rank as counting knapsack solutions over
//!                                 integer weights (the algorithm here)
//! 2016  Poussier et al.           Simple, tight histogram enumeration/ranking
//! ```
//!
//! ## Mathematical Formulation
//!
//! Map each score to a small integer weight so that likelier subkeys weigh
//! less. A candidate key's weight is the sum of its subkeys' weights, and
//!
//! $$ \mathrm{rank}(k) = |\{ c : w(c) < w(k) \}| $$
//!
//! The count factors over slices: the number of ways to finish a key
//! within a remaining weight budget depends only on the budget. A dynamic
//! program over budgets `0..W` counts all candidates in
//! $O(n \cdot 2^b \cdot W)$ time for `n` slices of `b` bits.
//!
//! ## What Could Go Wrong
//!
//! 1. **Quantisation**: scores are real-valued; weights are integers. Too
//!    few precision bits and distinct likelihoods collapse; too many and
//!    the DP's `O(W)` memory explodes. Bounds on the induced rank error
//!    come from ranking at the weight just above and below.
//! 2. **Accumulator width**: rank counts reach `2^keybits`. Machine
//!    integers silently wrap; use a big integer for real keys.
//!
//! ## Implementation Notes
//!
//! This crate provides:
//! - **`BitSpan`**, **`Dimensions`**, **`Key`**: the data model, a key as
//!   a concatenation of independent subkey vectors.
//! - **`ScoresTable`** / **`WeightTable`**: dense per-subkey tables with
//!   the score-shaping transforms and the score-to-weight mapping.
//! - **`rank`**, **`rank_low_mem`**, **`rank_all_weights`**,
//!   **`approximate_rank`**: the rank algorithms.
//!
//! ## References
//!
//! - Veyrat-Charvillon, N., Gérard, B., & Standaert, F.-X. (2013).
//!   "Security Evaluations beyond Computing Power."
//! - Martin, D. P., O'Connell, J. F., Oswald, E., & Stam, M. (2015).
//!   "Counting Keys in Parallel after a Side Channel Attack."
//! - Glowacz, C., Grosso, V., Poussier, R., Schüth, J., & Standaert,
//!   F.-X. (2015). "Simpler and More Efficient Rank Estimation."

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bitspan;
pub mod dimensions;
pub mod error;
pub mod key;
pub mod numeric;
pub mod rank;
pub mod scores;
pub mod weights;

pub use bitspan::BitSpan;
pub use dimensions::{Dimensions, FixedDimensions, SubkeyLayout};
pub use error::Error;
pub use key::Key;
pub use rank::{approximate_rank, rank, rank_all_weights, rank_for_key, rank_low_mem, RankValue};
pub use scores::ScoresTable;
pub use weights::{map_to_weight, WeightTable};
