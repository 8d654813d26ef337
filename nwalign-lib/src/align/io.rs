use anyhow::{ensure, Context, Result};
use derive_getters::Getters;
use flate2::bufread::MultiGzDecoder;
use log::debug;
use seq_io::fasta::{Reader as FastaReader, Record, RefRecord as FastaRefRecord};
use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use crate::util::io::{is_fasta_path, is_gzip_path};

/// 128 KB default buffer size, same as pigz.
pub const GZ_BUFSIZE: usize = 64 * (1 << 10) * 2;

/// A named sequence read from a FASTA file.
#[derive(Clone, Debug, PartialEq, Eq, Getters)]
pub struct SequenceRecord {
    /// The first whitespace-delimited token of the header line
    name: String,
    seq: Vec<u8>,
}

impl SequenceRecord {
    pub fn from_fasta(record: &FastaRefRecord) -> Self {
        let head = String::from_utf8_lossy(record.head());
        let name = head.split_whitespace().next().unwrap_or_default().to_string();
        Self {
            name,
            seq: record.full_seq().into_owned(),
        }
    }
}

/// Opens the file, or standard input when the path is `-`, buffered and decompressed when the
/// path has a GZIP extension or `decompress` is set for a path without a FASTA extension.
pub fn open_reader<P: AsRef<Path>>(path: &P, decompress: bool) -> Result<Box<dyn Read>> {
    let path = path.as_ref();
    let raw_handle = if path.as_os_str() == "-" {
        Box::new(std::io::stdin()) as Box<dyn Read>
    } else {
        let handle = File::open(path)
            .with_context(|| format!("Error opening input: {}", path.display()))?;
        Box::new(handle) as Box<dyn Read>
    };
    let buf_handle = BufReader::with_capacity(GZ_BUFSIZE, raw_handle);
    let is_gzip = is_gzip_path(&path) || (!is_fasta_path(&path) && decompress);
    if is_gzip {
        Ok(Box::new(MultiGzDecoder::new(buf_handle)))
    } else {
        Ok(Box::new(buf_handle))
    }
}

/// Reads the first two records of a FASTA file, ignoring any that follow.
pub fn read_sequence_pair<P: AsRef<Path>>(
    path: &P,
    decompress: bool,
) -> Result<(SequenceRecord, SequenceRecord)> {
    let path = path.as_ref();
    let mut reader = FastaReader::with_capacity(open_reader(&path, decompress)?, GZ_BUFSIZE);
    let mut records = Vec::with_capacity(2);
    while records.len() < 2 {
        match reader.next() {
            Some(record) => {
                let record = record
                    .with_context(|| format!("Error reading FASTA record from {}", path.display()))?;
                records.push(SequenceRecord::from_fasta(&record));
            }
            None => break,
        }
    }
    ensure!(
        records.len() == 2,
        "Expected at least two FASTA records in {}, found {}",
        path.display(),
        records.len()
    );
    let second = records.pop().context("missing second record")?;
    let first = records.pop().context("missing first record")?;
    debug!(
        "Read {} ({} bp) and {} ({} bp) from {}",
        first.name,
        first.seq.len(),
        second.name,
        second.seq.len(),
        path.display()
    );
    Ok((first, second))
}
