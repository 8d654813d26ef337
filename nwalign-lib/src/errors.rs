//! Errors raised by the aligner.
use derive_builder::UninitializedFieldError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AlignError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AlignError {
    /// A penalty was NaN or infinite.  The value is kept as a string so the error stays
    /// independent of the penalty type.
    #[error("Invalid {name}: expected a finite number, found {value}")]
    InvalidPenalty { name: &'static str, value: String },

    /// The penalties are too large for the matrix of sequences of these lengths to be scored
    /// without overflowing the penalty type.
    #[error("Penalties (gap {gap_penalty}, mismatch {mismatch_penalty}) overflow the score type for sequences of lengths ({xlen}, {ylen})")]
    PenaltyOverflow {
        xlen: usize,
        ylen: usize,
        gap_penalty: String,
        mismatch_penalty: String,
    },

    /// A required aligner option was not set on the builder.
    #[error("Missing aligner option: {0}")]
    UninitializedField(String),

    #[error("Invalid alignment: {0}")]
    InvalidAlignment(String),

    #[error("Sequence lengths ({xlen}, {ylen}) do not match the aligned lengths ({expected_xlen}, {expected_ylen})")]
    LengthMismatch {
        xlen: usize,
        ylen: usize,
        expected_xlen: usize,
        expected_ylen: usize,
    },
}

impl From<UninitializedFieldError> for AlignError {
    fn from(e: UninitializedFieldError) -> Self {
        AlignError::UninitializedField(e.field_name().to_string())
    }
}
