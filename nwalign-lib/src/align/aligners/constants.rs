use anyhow::{anyhow, Error};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

/// The symbol used to mark a gap when rendering an alignment as text.
pub const DEFAULT_GAP_CHAR: char = '-';

/// Alignment operations supported are match, substitution, insertion and deletion.  We consider
/// an alignment between two sequences x and y, where x is the first sequence (rows of the
/// traceback matrix) and y is the second (columns).
#[derive(Eq, PartialEq, Debug, Copy, Clone, Hash, Serialize, Deserialize)]
pub enum AlignmentOperation {
    Match, // Consumes one x and one y symbol that are equal
    Subst, // Consumes one x and one y symbol that differ
    Ins,   // Consumes a single x symbol, aligned to a gap in y
    Del,   // Consumes a single y symbol, aligned to a gap in x
}

impl AlignmentOperation {
    pub fn as_string(&self) -> &'static str {
        match *self {
            AlignmentOperation::Match => "=",
            AlignmentOperation::Subst => "X",
            AlignmentOperation::Ins => "I",
            AlignmentOperation::Del => "D",
        }
    }

    pub fn length_on_x(&self) -> usize {
        use AlignmentOperation::{Del, Ins, Match, Subst};
        match *self {
            Match | Subst | Ins => 1,
            Del => 0,
        }
    }

    pub fn length_on_y(&self) -> usize {
        use AlignmentOperation::{Del, Ins, Match, Subst};
        match *self {
            Match | Subst | Del => 1,
            Ins => 0,
        }
    }

    pub fn is_gap(&self) -> bool {
        matches!(self, AlignmentOperation::Ins | AlignmentOperation::Del)
    }

    /// The same operation with the roles of x and y exchanged.
    pub fn swapped(&self) -> Self {
        match *self {
            AlignmentOperation::Ins => AlignmentOperation::Del,
            AlignmentOperation::Del => AlignmentOperation::Ins,
            op => op,
        }
    }
}

/// How to pick the predecessor of a cell when more than one move reaches the minimum score.
///
/// Both strategies produce identical scores in every cell; they only differ in which of several
/// optimal alignments the traceback returns.
#[derive(Default, Debug, PartialEq, Eq, Copy, Clone, Hash, Serialize, Deserialize)]
pub enum TieBreak {
    /// Starts from the diagonal move, then compares up and left in turn:
    /// - up replaces the current choice when it is lower *or equal*;
    /// - left replaces the current choice when it is lower, or equal while the choice is not up.
    ///
    /// On ties the effective priority is therefore up, then left, then diagonal.
    #[default]
    Chained,
    /// Diagonal when it is no worse than up and left, then up when it is no worse than left,
    /// otherwise left.
    DiagonalFirst,
}

impl Display for TieBreak {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Chained => write!(f, "chained"),
            Self::DiagonalFirst => write!(f, "diagonal-first"),
        }
    }
}

impl FromStr for TieBreak {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chained" | "chain" | "reference" => Ok(TieBreak::Chained),
            "diagonal-first" | "diagonal_first" | "diagonalfirst" | "diagonal" => {
                Ok(TieBreak::DiagonalFirst)
            }
            _ => Err(anyhow!("Invalid tie-break strategy: {}", s)),
        }
    }
}
