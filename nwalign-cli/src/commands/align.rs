use super::command::{Command, ValueEnum};
use anyhow::{Context, Result};
use clap::{
    builder::{PossibleValuesParser, TypedValueParser as _},
    Parser,
};
use itertools::Itertools;
use log::info;
use nwalign::{
    align::{
        io::{read_sequence_pair, SequenceRecord},
        Penalty, DEFAULT_GAP_CHAR,
    },
    Builder, TieBreak,
};
use std::{
    io::{self, Write},
    path::PathBuf,
};

impl ValueEnum for TieBreak {
    fn variants<'a>() -> &'a [Self] {
        &[Self::Chained, Self::DiagonalFirst]
    }
}

/// 2^53, above which not every integer has an exact `f64` representation.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Returns the penalty as an integer when it has no fractional part.
fn as_integer(value: f64) -> Option<i64> {
    if value.fract() == 0.0 && value.abs() <= MAX_EXACT_INTEGER {
        Some(value as i64)
    } else {
        None
    }
}

/// Returns both penalties as integers when both are integral and no cell of the matrix for
/// sequences with `num_symbols` symbols in total can overflow an `i64`.
fn integral_penalties(gap: f64, mismatch: f64, num_symbols: usize) -> Option<(i64, i64)> {
    let gap = as_integer(gap)?;
    let mismatch = as_integer(mismatch)?;
    let count = i64::try_from(num_symbols).ok()?;
    gap.abs().max(mismatch.abs()).checked_mul(count)?;
    Some((gap, mismatch))
}

/// Computes the optimal global alignment of two sequences.
///
/// Every symbol of both sequences is aligned, either against a symbol of the other sequence or
/// against a gap.  Equal symbols cost nothing, different symbols cost `--mismatch-penalty`, and
/// each gap position costs `--gap-penalty`.  The alignment with the lowest total penalty is
/// reported.
///
/// The sequences are given either as the two positional arguments, or as the first two records
/// of a FASTA file with `--fasta`.
///
/// The output is a single JSON object on standard output with the fields `score`,
/// `alignedSeq1`, and `alignedSeq2`.  With `--table` the filled dynamic programming matrix is
/// also written to standard error, each cell annotated with the move that reached it:
/// `\` diagonal, `^` up (gap in the second sequence), `<` left (gap in the first sequence).
///
/// ## Ties
///
/// When more than one move reaches the lowest penalty, `--tie-break` picks between them:
/// - chained: prefers up, then left, then the diagonal.
/// - diagonal-first: prefers the diagonal, then up, then left.
///
/// Both produce the same score.
#[derive(Parser, Debug, Clone)]
#[clap(term_width = 0)]
pub struct Align {
    /// The first sequence (rows of the matrix).
    #[clap(required_unless_present = "fasta", conflicts_with = "fasta")]
    seq1: Option<String>,

    /// The second sequence (columns of the matrix).
    #[clap(required_unless_present = "fasta", conflicts_with = "fasta")]
    seq2: Option<String>,

    /// Read the sequences from the first two records of this FASTA file (`-` for standard input).
    #[clap(long, short = 'f', display_order = 1)]
    fasta: Option<PathBuf>,

    /// Assume an unrecognized input (based on file extension) is GZIP compressed.
    #[clap(long, short = 'z', default_value = "false", display_order = 2)]
    decompress: bool,

    /// Penalty for aligning a symbol against a gap.
    #[clap(
        long,
        short = 'g',
        default_value = "2",
        allow_hyphen_values = true,
        display_order = 3
    )]
    gap_penalty: f64,

    /// Penalty for aligning two different symbols.
    #[clap(
        long,
        short = 'x',
        default_value = "1",
        allow_hyphen_values = true,
        display_order = 4
    )]
    mismatch_penalty: f64,

    /// How to choose between moves with equal penalties:
    /// - chained: up, then left, then diagonal.
    /// - diagonal-first: diagonal, then up, then left.
    #[clap(
        long,
        short = 't',
        value_parser = PossibleValuesParser::new(TieBreak::possible_values())
            .map(|s| s.parse::<TieBreak>().unwrap()),
        default_value_t = TieBreak::Chained,
        ignore_case = true,
        display_order = 5,
        verbatim_doc_comment
    )]
    tie_break: TieBreak,

    /// The character used to mark gaps in the aligned sequences.
    #[clap(long, short = 'c', default_value_t = DEFAULT_GAP_CHAR, display_order = 6)]
    gap_char: char,

    /// Also write the filled matrix to standard error.
    #[clap(long, default_value = "false", display_order = 7)]
    table: bool,

    /// Pretty-print the JSON output.
    #[clap(long, short = 'p', default_value = "false", display_order = 8)]
    pretty: bool,
}

impl Align {
    /// Executes the align command
    pub fn execute(&self) -> Result<()> {
        let (seq1, seq2) = self.sequences()?;
        let mut stdout = io::stdout().lock();
        self.write_alignment(&seq1, &seq2, &mut stdout)
    }

    /// Aligns the sequences and writes the JSON record to `out`, scoring with integers when the
    /// penalties allow it.
    fn write_alignment<W: Write>(&self, seq1: &str, seq2: &str, out: &mut W) -> Result<()> {
        let len1 = seq1.chars().count();
        let len2 = seq2.chars().count();
        info!("Aligning sequences of length {} and {}", len1, len2);

        match integral_penalties(self.gap_penalty, self.mismatch_penalty, len1 + len2) {
            Some((gap_penalty, mismatch_penalty)) => {
                self.run(seq1, seq2, gap_penalty, mismatch_penalty, out)
            }
            None => self.run(seq1, seq2, self.gap_penalty, self.mismatch_penalty, out),
        }
    }

    /// The pair of sequences to align, from the command line or the FASTA file.
    fn sequences(&self) -> Result<(String, String)> {
        match (&self.fasta, &self.seq1, &self.seq2) {
            (Some(fasta), _, _) => {
                info!("Reading sequences from {}", fasta.display());
                let (first, second) = read_sequence_pair(fasta, self.decompress)?;
                let to_string = |record: &SequenceRecord| {
                    String::from_utf8(record.seq().clone()).with_context(|| {
                        format!("Sequence {} is not valid UTF-8", record.name())
                    })
                };
                let seq1 = to_string(&first)?;
                let seq2 = to_string(&second)?;
                Ok((seq1, seq2))
            }
            (None, Some(seq1), Some(seq2)) => Ok((seq1.clone(), seq2.clone())),
            _ => anyhow::bail!("Either two sequences or --fasta must be given"),
        }
    }

    fn run<P: Penalty, W: Write>(
        &self,
        seq1: &str,
        seq2: &str,
        gap_penalty: P,
        mismatch_penalty: P,
        out: &mut W,
    ) -> Result<()> {
        let aligner = Builder::default()
            .gap_penalty(gap_penalty)
            .mismatch_penalty(mismatch_penalty)
            .tie_break(self.tie_break)
            .gap_char(self.gap_char)
            .build_aligner()
            .context("Invalid aligner options")?;

        if self.table {
            let x = seq1.chars().collect_vec();
            let y = seq2.chars().collect_vec();
            let mut table = String::new();
            aligner.fill(&x, &y)?.render(&mut table, &x, &y)?;
            io::stderr().lock().write_all(table.as_bytes())?;
        }

        let record = aligner.align_str(seq1, seq2)?;
        info!("Alignment score: {}", record.score());

        if self.pretty {
            serde_json::to_writer_pretty(&mut *out, &record)?;
        } else {
            serde_json::to_writer(&mut *out, &record)?;
        }
        writeln!(out)?;
        out.flush()?;
        Ok(())
    }
}

impl Command for Align {
    fn execute(&self) -> anyhow::Result<()> {
        Align::execute(self)
    }
}
