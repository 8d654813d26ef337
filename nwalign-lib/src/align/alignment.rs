use std::fmt;

use derive_getters::Getters;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use super::{
    aligners::constants::AlignmentOperation::{self, Del, Ins, Match, Subst},
    scoring::{Penalty, Scoring},
};
use crate::errors::{AlignError, Result};

/// A global alignment between two sequences x and y, consisting of a score, the lengths of x and
/// y, and the alignment edit operations.  Every symbol of both sequences is consumed by exactly
/// one operation.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Alignment<P: Penalty> {
    /// The total penalty of the alignment (lower is better)
    pub score: P,

    /// Length of the first sequence
    pub xlen: usize,

    /// Length of the second sequence
    pub ylen: usize,

    /// Vector of alignment operations, from the start of both sequences to their end
    pub operations: Vec<AlignmentOperation>,
}

/// The result handed back to callers: the score and the two gapped sequences, column by column.
///
/// Serializes with the field names `score`, `alignedSeq1` and `alignedSeq2`.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct AlignmentRecord<P> {
    score: P,
    aligned_seq1: String,
    aligned_seq2: String,
}

impl<P: Penalty> Alignment<P> {
    /// The number of alignment columns.
    pub fn length(&self) -> usize {
        self.operations.len()
    }

    pub fn num_matches(&self) -> usize {
        self.operations.iter().filter(|op| **op == Match).count()
    }

    pub fn num_mismatches(&self) -> usize {
        self.operations.iter().filter(|op| **op == Subst).count()
    }

    pub fn num_gaps(&self) -> usize {
        self.operations.iter().filter(|op| op.is_gap()).count()
    }

    /// Validates that the operations consume exactly `xlen` and `ylen` symbols.
    pub fn validate(&self) -> Result<()> {
        let xend: usize = self.operations.iter().map(AlignmentOperation::length_on_x).sum();
        let yend: usize = self.operations.iter().map(AlignmentOperation::length_on_y).sum();
        if xend != self.xlen || yend != self.ylen {
            return Err(AlignError::InvalidAlignment(format!(
                "operations consume ({xend}, {yend}) symbols but the sequences have lengths ({}, {})",
                self.xlen, self.ylen
            )));
        }
        Ok(())
    }

    /// Recomputes the total penalty of the operations against the given sequences, checking that
    /// every `Match` pairs equal symbols and every `Subst` pairs different ones.
    pub fn score_with<T: Eq>(&self, x: &[T], y: &[T], scoring: &Scoring<P>) -> Result<P> {
        self.check_lengths(x.len(), y.len())?;
        self.validate()?;
        let mut score = P::zero();
        let mut i = 0;
        let mut j = 0;
        for op in &self.operations {
            match op {
                Match | Subst => {
                    let equal = x[i] == y[j];
                    if equal != (*op == Match) {
                        return Err(AlignError::InvalidAlignment(format!(
                            "{op:?} at x[{i}] and y[{j}] does not agree with the symbols"
                        )));
                    }
                    score = score + scoring.match_score(&x[i], &y[j]);
                }
                Ins | Del => score = score + scoring.gap_penalty,
            }
            i += op.length_on_x();
            j += op.length_on_y();
        }
        Ok(score)
    }

    /// Run-length encodes the operations, e.g. `3=1X1=1I1=`.
    pub fn cigar(&self) -> String {
        let mut cigar = String::new();
        for (op, group) in &self.operations.iter().group_by(|op| **op) {
            cigar.push_str(&format!("{}{}", group.count(), op.as_string()));
        }
        cigar
    }

    /// The matrix coordinates `(i, j)` visited by the alignment, from `(0, 0)` to
    /// `(xlen, ylen)` inclusive.
    pub fn path(&self) -> Vec<(usize, usize)> {
        let mut path = Vec::with_capacity(self.operations.len() + 1);
        let mut i = 0;
        let mut j = 0;
        path.push((i, j));
        for op in &self.operations {
            i += op.length_on_x();
            j += op.length_on_y();
            path.push((i, j));
        }
        path
    }

    /// The alignment with the roles of the two sequences exchanged.
    pub fn swapped(&self) -> Self {
        Self {
            score: self.score,
            xlen: self.ylen,
            ylen: self.xlen,
            operations: self.operations.iter().map(AlignmentOperation::swapped).collect(),
        }
    }

    /// Lays out both sequences column by column, with `None` standing for a gap.  The two
    /// returned vectors always have the same length.
    pub fn aligned<T: Clone>(
        &self,
        x: &[T],
        y: &[T],
    ) -> Result<(Vec<Option<T>>, Vec<Option<T>>)> {
        self.check_lengths(x.len(), y.len())?;
        self.validate()?;
        let mut aligned_x = Vec::with_capacity(self.operations.len());
        let mut aligned_y = Vec::with_capacity(self.operations.len());
        let mut i = 0;
        let mut j = 0;
        for op in &self.operations {
            match op {
                Match | Subst => {
                    aligned_x.push(Some(x[i].clone()));
                    aligned_y.push(Some(y[j].clone()));
                }
                Ins => {
                    aligned_x.push(Some(x[i].clone()));
                    aligned_y.push(None);
                }
                Del => {
                    aligned_x.push(None);
                    aligned_y.push(Some(y[j].clone()));
                }
            }
            i += op.length_on_x();
            j += op.length_on_y();
        }
        Ok((aligned_x, aligned_y))
    }

    /// Renders both sequences as text, writing `gap` where a symbol is absent.
    pub fn aligned_strings(&self, x: &str, y: &str, gap: char) -> Result<(String, String)> {
        let x = x.chars().collect_vec();
        let y = y.chars().collect_vec();
        let (aligned_x, aligned_y) = self.aligned(&x, &y)?;
        let render = |column: Vec<Option<char>>| -> String {
            column.into_iter().map(|c| c.unwrap_or(gap)).collect()
        };
        Ok((render(aligned_x), render(aligned_y)))
    }

    /// Packages the score and the rendered sequences for the caller.
    pub fn record(&self, x: &str, y: &str, gap: char) -> Result<AlignmentRecord<P>> {
        let (aligned_seq1, aligned_seq2) = self.aligned_strings(x, y, gap)?;
        Ok(AlignmentRecord {
            score: self.score,
            aligned_seq1,
            aligned_seq2,
        })
    }

    fn check_lengths(&self, xlen: usize, ylen: usize) -> Result<()> {
        if xlen != self.xlen || ylen != self.ylen {
            return Err(AlignError::LengthMismatch {
                xlen,
                ylen,
                expected_xlen: self.xlen,
                expected_ylen: self.ylen,
            });
        }
        Ok(())
    }
}

impl<P: Penalty> fmt::Display for Alignment<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "score: {} xlen: {} ylen: {} cigar: {}",
            self.score,
            self.xlen,
            self.ylen,
            self.cigar()
        )
    }
}

// Tests
#[cfg(test)]
pub mod tests {
    use rstest::rstest;

    use super::{Alignment, AlignmentRecord};
    use crate::{
        align::{
            aligners::constants::AlignmentOperation::{Del, Ins, Match, Subst},
            scoring::Scoring,
        },
        errors::AlignError,
    };

    fn empty_alignment() -> Alignment<i32> {
        Alignment {
            score: 0,
            xlen: 0,
            ylen: 0,
            operations: Vec::new(),
        }
    }

    /// PALETTE vs PALAT-E
    fn palette_alignment() -> Alignment<i32> {
        Alignment {
            score: 3,
            xlen: 7,
            ylen: 6,
            operations: vec![Match, Match, Match, Subst, Match, Ins, Match],
        }
    }

    /// -A vs T-
    fn all_gaps_alignment() -> Alignment<i32> {
        Alignment {
            score: 4,
            xlen: 1,
            ylen: 1,
            operations: vec![Del, Ins],
        }
    }

    #[rstest]
    #[case(&empty_alignment(), "")]
    #[case(&palette_alignment(), "3=1X1=1I1=")]
    #[case(&all_gaps_alignment(), "1D1I")]
    fn test_cigar(#[case] alignment: &Alignment<i32>, #[case] cigar: &str) {
        assert_eq!(alignment.cigar(), cigar);
    }

    #[rstest]
    #[case(&empty_alignment())]
    #[case(&palette_alignment())]
    #[case(&all_gaps_alignment())]
    fn test_valid_alignments(#[case] alignment: &Alignment<i32>) {
        assert!(alignment.validate().is_ok(), "{alignment}");
        assert!(alignment.swapped().validate().is_ok(), "{alignment}");
    }

    #[rstest]
    fn test_invalid_alignment() {
        let mut alignment = palette_alignment();
        alignment.operations.pop();
        assert!(matches!(
            alignment.validate(),
            Err(AlignError::InvalidAlignment(_))
        ));
        assert!(alignment.aligned(&[0; 7], &[0; 6]).is_err());
    }

    #[rstest]
    fn test_counts() {
        let alignment = palette_alignment();
        assert_eq!(alignment.length(), 7);
        assert_eq!(alignment.num_matches(), 5);
        assert_eq!(alignment.num_mismatches(), 1);
        assert_eq!(alignment.num_gaps(), 1);
    }

    #[rstest]
    fn test_path() {
        assert_eq!(empty_alignment().path(), vec![(0, 0)]);
        assert_eq!(all_gaps_alignment().path(), vec![(0, 0), (0, 1), (1, 1)]);
        let path = palette_alignment().path();
        assert_eq!(path.first(), Some(&(0, 0)));
        assert_eq!(path.last(), Some(&(7, 6)));
        assert_eq!(path[5], (5, 5));
        assert_eq!(path[6], (6, 5));
    }

    #[rstest]
    fn test_aligned_strings() {
        let alignment = palette_alignment();
        let (x, y) = alignment.aligned_strings("PALETTE", "PALATE", '-').unwrap();
        assert_eq!(x, "PALETTE");
        assert_eq!(y, "PALAT-E");

        let (x, y) = all_gaps_alignment().aligned_strings("A", "T", '.').unwrap();
        assert_eq!(x, ".A");
        assert_eq!(y, "T.");
    }

    #[rstest]
    fn test_aligned_generic_symbols() {
        let x = ["the", "quick", "fox"];
        let y = ["the", "fox"];
        let alignment: Alignment<i32> = Alignment {
            score: 1,
            xlen: 3,
            ylen: 2,
            operations: vec![Match, Ins, Match],
        };
        let (aligned_x, aligned_y) = alignment.aligned(&x, &y).unwrap();
        assert_eq!(aligned_x, vec![Some("the"), Some("quick"), Some("fox")]);
        assert_eq!(aligned_y, vec![Some("the"), None, Some("fox")]);
    }

    #[rstest]
    fn test_aligned_rejects_other_sequences() {
        let result = palette_alignment().aligned_strings("PALETTE", "PALATES", '-');
        assert_eq!(
            result,
            Err(AlignError::LengthMismatch {
                xlen: 7,
                ylen: 7,
                expected_xlen: 7,
                expected_ylen: 6
            })
        );
    }

    #[rstest]
    fn test_score_with() {
        let scoring = Scoring::new(2, 1).unwrap();
        let x: Vec<char> = "PALETTE".chars().collect();
        let y: Vec<char> = "PALATE".chars().collect();
        assert_eq!(palette_alignment().score_with(&x, &y, &scoring), Ok(3));
        assert_eq!(
            palette_alignment().swapped().score_with(&y, &x, &scoring),
            Ok(3)
        );
        // the fourth column pairs E with A, so it cannot be a match
        let mut alignment = palette_alignment();
        alignment.operations[3] = Match;
        assert!(alignment.score_with(&x, &y, &scoring).is_err());
    }

    #[rstest]
    fn test_record_serializes_with_camel_case_names() {
        let record: AlignmentRecord<i32> =
            palette_alignment().record("PALETTE", "PALATE", '-').unwrap();
        assert_eq!(*record.score(), 3);
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"score":3,"alignedSeq1":"PALETTE","alignedSeq2":"PALAT-E"}"#
        );
        let parsed: AlignmentRecord<i32> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }
}
