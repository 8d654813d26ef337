use serde::Serialize;
use std::{
    fmt::{Debug, Display},
    ops::Add,
};

use crate::errors::{AlignError, Result};

/// A numeric type usable as a gap or mismatch penalty.
///
/// Penalties are signed additive terms: the aligner minimizes their sum, and never inspects
/// their sign or magnitude.
pub trait Penalty:
    Copy + PartialOrd + Add<Output = Self> + Default + Debug + Display + Serialize
{
    /// The additive identity, used as the score of a match and of the empty alignment.
    fn zero() -> Self;

    /// The penalty multiplied by a count, e.g. `i * gap_penalty` for a boundary cell.
    fn times(self, count: usize) -> Self;

    /// False for NaN and infinite values.
    fn is_finite(self) -> bool;

    /// The magnitude of the penalty multiplied by a count, or `None` if it does not fit in the
    /// type.
    fn checked_bound(self, count: usize) -> Option<Self>;
}

macro_rules! impl_integer_penalty {
    ($($t:ty),*) => {
        $(
            impl Penalty for $t {
                #[inline(always)]
                fn zero() -> Self {
                    0
                }

                #[inline(always)]
                fn times(self, count: usize) -> Self {
                    self * count as $t
                }

                #[inline(always)]
                fn is_finite(self) -> bool {
                    true
                }

                fn checked_bound(self, count: usize) -> Option<Self> {
                    self.checked_abs()?.checked_mul(<$t>::try_from(count).ok()?)
                }
            }
        )*
    };
}

macro_rules! impl_float_penalty {
    ($($t:ty),*) => {
        $(
            impl Penalty for $t {
                #[inline(always)]
                fn zero() -> Self {
                    0.0
                }

                #[inline(always)]
                fn times(self, count: usize) -> Self {
                    self * count as $t
                }

                #[inline(always)]
                fn is_finite(self) -> bool {
                    <$t>::is_finite(self)
                }

                fn checked_bound(self, count: usize) -> Option<Self> {
                    let bound = self.abs() * count as $t;
                    <$t>::is_finite(bound).then_some(bound)
                }
            }
        )*
    };
}

impl_integer_penalty!(i32, i64);
impl_float_penalty!(f32, f64);

/// Details of scoring are encapsulated in this structure.
///
/// A linear gap model is used: a gap of length `k` costs `k * gap_penalty`.  Aligned symbols
/// cost nothing when equal, and `mismatch_penalty` otherwise.
#[derive(Copy, Clone, PartialEq, Debug, Serialize)]
pub struct Scoring<P: Penalty> {
    pub gap_penalty: P,
    pub mismatch_penalty: P,
}

impl<P: Penalty> Scoring<P> {
    /// Create a new Scoring instance, rejecting penalties that are not finite numbers.
    ///
    /// # Arguments
    ///
    /// * `gap_penalty` - the cost of aligning a symbol against a gap
    /// * `mismatch_penalty` - the cost of aligning two different symbols
    pub fn new(gap_penalty: P, mismatch_penalty: P) -> Result<Self> {
        check_finite("gap penalty", gap_penalty)?;
        check_finite("mismatch penalty", mismatch_penalty)?;
        Ok(Self {
            gap_penalty,
            mismatch_penalty,
        })
    }

    /// Checks that no cell of the matrix for sequences of lengths `m` and `n` can overflow.
    ///
    /// A cell `(i, j)` never exceeds `(i + j)` times the largest penalty in magnitude, so it is
    /// enough that `(m + n) * max(|gap|, |mismatch|)` fits in the penalty type.
    pub fn check_bound(&self, m: usize, n: usize) -> Result<()> {
        let fits = m
            .checked_add(n)
            .and_then(|count| {
                let gap = self.gap_penalty.checked_bound(count)?;
                let mismatch = self.mismatch_penalty.checked_bound(count)?;
                Some((gap, mismatch))
            })
            .is_some();
        if fits {
            Ok(())
        } else {
            Err(AlignError::PenaltyOverflow {
                xlen: m,
                ylen: n,
                gap_penalty: self.gap_penalty.to_string(),
                mismatch_penalty: self.mismatch_penalty.to_string(),
            })
        }
    }

    #[inline(always)]
    pub fn match_score<T: Eq>(&self, a: &T, b: &T) -> P {
        if a == b {
            P::zero()
        } else {
            self.mismatch_penalty
        }
    }
}

fn check_finite<P: Penalty>(name: &'static str, value: P) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(AlignError::InvalidPenalty {
            name,
            value: value.to_string(),
        })
    }
}
