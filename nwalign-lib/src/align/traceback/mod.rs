use std::fmt::{self, Display};

use log::debug;
use serde::{Deserialize, Serialize};

use super::{
    aligners::constants::{AlignmentOperation, TieBreak},
    alignment::Alignment,
    scoring::{Penalty, Scoring},
};
use crate::errors::{AlignError, Result};

/// The move that led to a cell of the traceback matrix.
#[derive(Default, Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub enum Move {
    /// Placeholder for cell (0, 0), which has no predecessor.
    #[default]
    Start,
    /// From (i-1, j-1): x[i-1] aligned to y[j-1].
    Diagonal,
    /// From (i-1, j): x[i-1] aligned to a gap.
    Up,
    /// From (i, j-1): y[j-1] aligned to a gap.
    Left,
}

impl Move {
    fn symbol(self) -> char {
        match self {
            Move::Start => '*',
            Move::Diagonal => '\\',
            Move::Up => '^',
            Move::Left => '<',
        }
    }
}

/// One cell of the traceback matrix: the best cumulative penalty for aligning the prefixes
/// `x[..i]` and `y[..j]`, and the move that achieved it.
#[derive(Default, Copy, Clone, PartialEq, Debug, Serialize)]
pub struct Cell<P: Penalty> {
    pub score: P,
    pub mv: Move,
}

impl TieBreak {
    /// Returns the minimum of the three candidate scores along with the move chosen for it.
    #[inline(always)]
    pub fn choose<P: Penalty>(self, diag: P, up: P, left: P) -> (P, Move) {
        match self {
            TieBreak::Chained => {
                let mut best = diag;
                let mut mv = Move::Diagonal;
                if up < best {
                    best = up;
                    mv = Move::Up;
                } else if up == best {
                    mv = Move::Up;
                }
                if left < best {
                    best = left;
                    mv = Move::Left;
                } else if left == best && mv != Move::Up {
                    mv = Move::Left;
                }
                (best, mv)
            }
            TieBreak::DiagonalFirst => {
                if diag <= up && diag <= left {
                    (diag, Move::Diagonal)
                } else if up <= left {
                    (up, Move::Up)
                } else {
                    (left, Move::Left)
                }
            }
        }
    }
}

/// The filled dynamic programming matrix, with `rows = m + 1` and `cols = n + 1` for sequences of
/// length `m` (x) and `n` (y), stored in row-major order.
#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct Traceback<P: Penalty> {
    rows: usize,
    cols: usize,
    matrix: Vec<Cell<P>>,
}

impl<P: Penalty> Traceback<P> {
    fn with_capacity(m: usize, n: usize) -> Self {
        let rows = m + 1;
        let cols = n + 1;
        Traceback {
            rows,
            cols,
            matrix: Vec::with_capacity(rows * cols),
        }
    }

    /// Resets the matrix to `(m + 1) x (n + 1)` and fills in the first row and column, which hold
    /// the cost of aligning a prefix against nothing.
    fn init(&mut self, m: usize, n: usize, scoring: &Scoring<P>) {
        self.matrix.clear();
        self.rows = m + 1;
        self.cols = n + 1;
        self.matrix.resize(self.rows * self.cols, Cell::default());
        self.set(
            0,
            0,
            Cell {
                score: P::zero(),
                mv: Move::Start,
            },
        );
        for i in 1..=m {
            let score = scoring.gap_penalty.times(i);
            self.set(i, 0, Cell { score, mv: Move::Up });
        }
        for j in 1..=n {
            let score = scoring.gap_penalty.times(j);
            self.set(0, j, Cell { score, mv: Move::Left });
        }
    }

    /// Builds and fills the matrix for `x` against `y`, row by row and left to right.  Fails if
    /// the penalties could overflow a cell for sequences of these lengths.
    pub fn fill<T: Eq>(
        x: &[T],
        y: &[T],
        scoring: &Scoring<P>,
        tie_break: TieBreak,
    ) -> Result<Self> {
        let m = x.len();
        let n = y.len();
        scoring.check_bound(m, n)?;
        debug!("Filling a {}x{} traceback matrix", m + 1, n + 1);
        let mut traceback = Self::with_capacity(m, n);
        traceback.init(m, n, scoring);
        for i in 1..=m {
            for j in 1..=n {
                let diag = traceback.get(i - 1, j - 1).score
                    + scoring.match_score(&x[i - 1], &y[j - 1]);
                let up = traceback.get(i - 1, j).score + scoring.gap_penalty;
                let left = traceback.get(i, j - 1).score + scoring.gap_penalty;
                let (score, mv) = tie_break.choose(diag, up, left);
                traceback.set(i, j, Cell { score, mv });
            }
        }
        Ok(traceback)
    }

    #[inline(always)]
    fn set(&mut self, i: usize, j: usize, v: Cell<P>) {
        debug_assert!(i < self.rows);
        debug_assert!(j < self.cols);
        self.matrix[i * self.cols + j] = v;
    }

    #[inline(always)]
    pub fn get(&self, i: usize, j: usize) -> &Cell<P> {
        debug_assert!(i < self.rows);
        debug_assert!(j < self.cols);
        &self.matrix[i * self.cols + j]
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// The score of the full alignment, found in the bottom-right cell.
    pub fn score(&self) -> P {
        self.get(self.rows - 1, self.cols - 1).score
    }

    /// Walks the moves back from the bottom-right cell to `(0, 0)`, returning the alignment they
    /// describe.  `x` and `y` must be the sequences the matrix was filled with.
    ///
    /// Along the first row only a left move is possible, and along the first column only an up
    /// move, whatever the cell holds.
    pub fn traceback<T: Eq>(&self, x: &[T], y: &[T]) -> Result<Alignment<P>> {
        if x.len() + 1 != self.rows || y.len() + 1 != self.cols {
            return Err(AlignError::LengthMismatch {
                xlen: x.len(),
                ylen: y.len(),
                expected_xlen: self.rows - 1,
                expected_ylen: self.cols - 1,
            });
        }
        let mut i = x.len();
        let mut j = y.len();
        let mut operations: Vec<AlignmentOperation> = Vec::with_capacity(i + j);
        while i > 0 || j > 0 {
            let mv = if i == 0 {
                Move::Left
            } else if j == 0 {
                Move::Up
            } else {
                self.get(i, j).mv
            };
            match mv {
                Move::Diagonal => {
                    if x[i - 1] == y[j - 1] {
                        operations.push(AlignmentOperation::Match);
                    } else {
                        operations.push(AlignmentOperation::Subst);
                    }
                    i -= 1;
                    j -= 1;
                }
                Move::Up => {
                    operations.push(AlignmentOperation::Ins);
                    i -= 1;
                }
                Move::Left => {
                    operations.push(AlignmentOperation::Del);
                    j -= 1;
                }
                Move::Start => unreachable!("Bug: interior cell ({i}, {j}) has no move"),
            }
        }
        operations.reverse();

        Ok(Alignment {
            score: self.score(),
            xlen: x.len(),
            ylen: y.len(),
            operations,
        })
    }

    /// Writes the matrix as a table with `x` down the side and `y` across the top.  Each cell
    /// shows its score followed by its move: `\` diagonal, `^` up, `<` left, `*` start.
    pub fn render<W: fmt::Write, T: Display>(
        &self,
        out: &mut W,
        x: &[T],
        y: &[T],
    ) -> fmt::Result {
        let labels_x: Vec<String> = x.iter().map(ToString::to_string).collect();
        let labels_y: Vec<String> = y.iter().map(ToString::to_string).collect();
        let cells: Vec<String> = self
            .matrix
            .iter()
            .map(|cell| format!("{}{}", cell.score, cell.mv.symbol()))
            .collect();
        let width = cells
            .iter()
            .chain(labels_y.iter())
            .map(|s| s.chars().count())
            .max()
            .unwrap_or(1);
        let label_width = labels_x.iter().map(|s| s.chars().count()).max().unwrap_or(1);

        write!(out, "{:label_width$} {:>width$}", "", "")?;
        for label in &labels_y {
            write!(out, " {label:>width$}")?;
        }
        writeln!(out)?;
        for i in 0..self.rows {
            let label = match i {
                0 => "",
                _ => labels_x.get(i - 1).map_or("", String::as_str),
            };
            write!(out, "{label:label_width$}")?;
            for j in 0..self.cols {
                write!(out, " {:>width$}", cells[i * self.cols + j])?;
            }
            writeln!(out)?;
        }
        Ok(())
    }
}

impl<P: Penalty> Display for Traceback<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.rows {
            for j in 0..self.cols {
                let cell = self.get(i, j);
                if j > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{}{}", cell.score, cell.mv.symbol())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub mod tests {
    use itertools::Itertools;
    use proptest::prelude::*;
    use rstest::rstest;

    use super::{Move, Traceback};
    use crate::{
        align::{aligners::constants::TieBreak, scoring::Scoring},
        errors::AlignError,
    };

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect_vec()
    }

    /// The minimum cost over every possible global alignment of `x` and `y`, by exhaustive
    /// recursion.  Only usable on very short inputs.
    fn brute_force(x: &[char], y: &[char], gap: i32, mismatch: i32) -> i32 {
        match (x.split_last(), y.split_last()) {
            (None, None) => 0,
            (Some(_), None) => gap * x.len() as i32,
            (None, Some(_)) => gap * y.len() as i32,
            (Some((a, xs)), Some((b, ys))) => {
                let sub = if a == b { 0 } else { mismatch };
                let diag = brute_force(xs, ys, gap, mismatch) + sub;
                let up = brute_force(xs, y, gap, mismatch) + gap;
                let left = brute_force(x, ys, gap, mismatch) + gap;
                diag.min(up).min(left)
            }
        }
    }

    #[rstest]
    // all three tied: up wins
    #[case(TieBreak::Chained, 4, 4, 4, 4, Move::Up)]
    // diagonal and up tied: up wins
    #[case(TieBreak::Chained, 4, 4, 5, 4, Move::Up)]
    // diagonal and left tied: left wins
    #[case(TieBreak::Chained, 4, 5, 4, 4, Move::Left)]
    // up and left tied below diagonal: up wins
    #[case(TieBreak::Chained, 5, 4, 4, 4, Move::Up)]
    #[case(TieBreak::Chained, 3, 4, 4, 3, Move::Diagonal)]
    #[case(TieBreak::Chained, 5, 6, 4, 4, Move::Left)]
    #[case(TieBreak::DiagonalFirst, 4, 4, 4, 4, Move::Diagonal)]
    #[case(TieBreak::DiagonalFirst, 4, 4, 5, 4, Move::Diagonal)]
    #[case(TieBreak::DiagonalFirst, 4, 5, 4, 4, Move::Diagonal)]
    #[case(TieBreak::DiagonalFirst, 5, 4, 4, 4, Move::Up)]
    #[case(TieBreak::DiagonalFirst, 5, 6, 4, 4, Move::Left)]
    fn test_choose(
        #[case] tie_break: TieBreak,
        #[case] diag: i32,
        #[case] up: i32,
        #[case] left: i32,
        #[case] expected_score: i32,
        #[case] expected_move: Move,
    ) {
        assert_eq!(
            tie_break.choose(diag, up, left),
            (expected_score, expected_move)
        );
    }

    #[rstest]
    fn test_boundaries() {
        let scoring = Scoring::new(3, 1).unwrap();
        let traceback =
            Traceback::fill(&chars("AC"), &chars("GTA"), &scoring, TieBreak::Chained).unwrap();
        assert_eq!(traceback.rows(), 3);
        assert_eq!(traceback.cols(), 4);
        assert_eq!(traceback.get(0, 0).mv, Move::Start);
        assert_eq!(traceback.get(0, 0).score, 0);
        for i in 1..3 {
            assert_eq!(traceback.get(i, 0).score, 3 * i as i32);
            assert_eq!(traceback.get(i, 0).mv, Move::Up);
        }
        for j in 1..4 {
            assert_eq!(traceback.get(0, j).score, 3 * j as i32);
            assert_eq!(traceback.get(0, j).mv, Move::Left);
        }
    }

    /// Every cell of PALETTE vs PALATE with gap 2 and mismatch 1, worked out by hand.
    #[rstest]
    fn test_palette_palate_matrix() {
        let scoring = Scoring::new(2, 1).unwrap();
        let traceback = Traceback::fill(
            &chars("PALETTE"),
            &chars("PALATE"),
            &scoring,
            TieBreak::Chained,
        )
        .unwrap();
        let expected = [
            "0* 2< 4< 6< 8< 10< 12<",
            "2^ 0\\ 2< 4< 6< 8< 10<",
            "4^ 2^ 0\\ 2< 4< 6< 8<",
            "6^ 4^ 2^ 0\\ 2< 4< 6<",
            "8^ 6^ 4^ 2^ 1\\ 3< 4\\",
            "10^ 8^ 6^ 4^ 3^ 1\\ 3<",
            "12^ 10^ 8^ 6^ 5^ 3^ 2\\",
            "14^ 12^ 10^ 8^ 7^ 5^ 3\\",
        ];
        assert_eq!(traceback.to_string(), expected.iter().join("\n") + "\n");
        assert_eq!(traceback.score(), 3);
    }

    #[rstest]
    fn test_tie_breaks_agree_on_scores() {
        let scoring = Scoring::new(2, 1).unwrap();
        let x = chars("GATTACAGATTACA");
        let y = chars("GCATGCTTACA");
        let chained = Traceback::fill(&x, &y, &scoring, TieBreak::Chained).unwrap();
        let diagonal = Traceback::fill(&x, &y, &scoring, TieBreak::DiagonalFirst).unwrap();
        for i in 0..chained.rows() {
            for j in 0..chained.cols() {
                assert_eq!(chained.get(i, j).score, diagonal.get(i, j).score, "cell ({i}, {j})");
            }
        }
    }

    #[rstest]
    fn test_traceback_forces_moves_on_the_boundary() {
        let scoring = Scoring::new(1, 1).unwrap();
        let x = chars("AAA");
        let y: Vec<char> = Vec::new();
        let traceback = Traceback::fill(&x, &y, &scoring, TieBreak::Chained).unwrap();
        let alignment = traceback.traceback(&x, &y).unwrap();
        assert_eq!(alignment.cigar(), "3I");
        assert_eq!(alignment.score, 3);

        let traceback = Traceback::fill(&y, &x, &scoring, TieBreak::Chained).unwrap();
        let alignment = traceback.traceback(&y, &x).unwrap();
        assert_eq!(alignment.cigar(), "3D");
    }

    #[rstest]
    fn test_traceback_rejects_other_sequences() {
        let scoring = Scoring::new(1, 1).unwrap();
        let traceback =
            Traceback::fill(&chars("AC"), &chars("A"), &scoring, TieBreak::Chained).unwrap();
        assert!(traceback.traceback(&chars("ACG"), &chars("A")).is_err());
    }

    #[rstest]
    fn test_render() {
        let scoring = Scoring::new(2, 5).unwrap();
        let x = chars("A");
        let y = chars("T");
        let traceback = Traceback::fill(&x, &y, &scoring, TieBreak::Chained).unwrap();
        let mut table = String::new();
        traceback.render(&mut table, &x, &y).unwrap();
        assert_eq!(table, "      T\n  0* 2<\nA 2^ 4^\n");
    }

    #[rstest]
    fn test_fill_rejects_overflowing_penalties() {
        let scoring = Scoring::new(i32::MAX, 0).unwrap();
        let x = chars("AB");
        let result = Traceback::fill(&x, &[], &scoring, TieBreak::Chained);
        assert!(matches!(
            result,
            Err(AlignError::PenaltyOverflow { xlen: 2, ylen: 0, .. })
        ));
        assert!(Traceback::fill(&chars("A"), &[], &scoring, TieBreak::Chained).is_ok());
    }

    proptest! {
        #[test]
        fn test_matrix_score_is_optimal(
            x in "[ACGT]{0,6}",
            y in "[ACGT]{0,6}",
            gap in -3i32..4,
            mismatch in -3i32..6,
        ) {
            let x = chars(&x);
            let y = chars(&y);
            let scoring = Scoring::new(gap, mismatch).unwrap();
            let expected = brute_force(&x, &y, gap, mismatch);
            for tie_break in [TieBreak::Chained, TieBreak::DiagonalFirst] {
                let traceback = Traceback::fill(&x, &y, &scoring, tie_break).unwrap();
                prop_assert_eq!(traceback.score(), expected);
            }
        }
    }
}
