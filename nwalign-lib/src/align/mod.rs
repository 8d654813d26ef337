pub mod aligners;
pub mod alignment;
pub mod io;
pub mod scoring;
pub mod traceback;

pub use aligners::{
    constants::{AlignmentOperation, TieBreak, DEFAULT_GAP_CHAR},
    Aligner, Builder,
};
pub use alignment::{Alignment, AlignmentRecord};
pub use scoring::{Penalty, Scoring};
pub use traceback::{Cell, Move, Traceback};

use crate::errors::Result;

/// Computes the optimal global alignment of `x` and `y` with the default tie-break, failing if
/// either penalty is not a finite number.
///
/// ```
/// let alignment = nwalign::align(b"PALETTE", b"PALATE", 2, 1).unwrap();
/// assert_eq!(alignment.score, 3);
/// assert_eq!(alignment.cigar(), "3=1X1=1I1=");
/// ```
pub fn align<T: Eq, P: Penalty>(
    x: &[T],
    y: &[T],
    gap_penalty: P,
    mismatch_penalty: P,
) -> Result<Alignment<P>> {
    Aligner::new(gap_penalty, mismatch_penalty)?.align(x, y)
}
