pub mod constants;

use derive_builder::Builder;
use itertools::Itertools;

use crate::{
    align::{
        alignment::{Alignment, AlignmentRecord},
        scoring::{Penalty, Scoring},
        traceback::Traceback,
    },
    errors::{AlignError, Result},
};
use constants::{TieBreak, DEFAULT_GAP_CHAR};

/// Options for building an [`Aligner`].  Both penalties are required; use [`Builder`] to set
/// them.
#[derive(Copy, Clone, Debug, Builder)]
#[builder(name = "Builder", build_fn(name = "build_options", error = "AlignError"))]
pub struct Options<P: Penalty> {
    gap_penalty: P,
    mismatch_penalty: P,
    #[builder(default)]
    tie_break: TieBreak,
    #[builder(default = "DEFAULT_GAP_CHAR")]
    gap_char: char,
}

impl<P: Penalty> Builder<P> {
    /// Builds the aligner, rejecting missing or non-finite penalties.
    pub fn build_aligner(&self) -> Result<Aligner<P>> {
        let opts = self.build_options()?;
        let scoring = Scoring::new(opts.gap_penalty, opts.mismatch_penalty)?;
        Ok(Aligner {
            scoring,
            tie_break: opts.tie_break,
            gap_char: opts.gap_char,
        })
    }
}

/// A Needleman-Wunsch global aligner with a linear gap penalty and a single mismatch penalty
/// (matches cost nothing).  The lowest total penalty is optimal.
///
/// The aligner holds only its configuration: every call builds its own matrix, so one aligner
/// may be shared freely across threads.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aligner<P: Penalty> {
    scoring: Scoring<P>,
    tie_break: TieBreak,
    gap_char: char,
}

impl<P: Penalty> Aligner<P> {
    /// Create a new aligner with the default tie-break and gap character.
    pub fn new(gap_penalty: P, mismatch_penalty: P) -> Result<Self> {
        Builder::default()
            .gap_penalty(gap_penalty)
            .mismatch_penalty(mismatch_penalty)
            .build_aligner()
    }

    pub fn scoring(&self) -> &Scoring<P> {
        &self.scoring
    }

    pub fn tie_break(&self) -> TieBreak {
        self.tie_break
    }

    pub fn gap_char(&self) -> char {
        self.gap_char
    }

    /// Fills the full `(x.len() + 1) x (y.len() + 1)` matrix without tracing back.
    pub fn fill<T: Eq>(&self, x: &[T], y: &[T]) -> Result<Traceback<P>> {
        Traceback::fill(x, y, &self.scoring, self.tie_break)
    }

    /// Computes the optimal global alignment of `x` and `y`.
    pub fn align<T: Eq>(&self, x: &[T], y: &[T]) -> Result<Alignment<P>> {
        self.fill(x, y)?.traceback(x, y)
    }

    /// Aligns two strings symbol by symbol (Unicode scalar values) and renders the result,
    /// marking gaps with the configured gap character.
    pub fn align_str(&self, x: &str, y: &str) -> Result<AlignmentRecord<P>> {
        let xs = x.chars().collect_vec();
        let ys = y.chars().collect_vec();
        self.align(&xs, &ys)?.record(x, y, self.gap_char)
    }
}
