//! Result-log parsing.
//!
//! This module turns the harness's execution log into per-mutant count data:
//! - Scanning each line for the mutant, input vector and count literal
//! - Folding records into mutant -> input -> counts
//! - Writing one JSON section per mutant next to the log

pub mod aggregate;
pub mod error;
pub mod line;
pub mod literal;
pub mod merge;
pub mod writer;

pub use aggregate::CountsByMutant;
pub use error::{LineError, LiteralError, LiteralErrorKind, ResultsError};
pub use merge::{LastWriteWins, MergePolicy, MergePolicyKind, SumCounts};

use crate::config::{ParserConfig, UnmatchedLinePolicy};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Outcome label (e.g. a measured bitstring) -> number of times it was observed.
pub type OutcomeTable = BTreeMap<String, u64>;

/// Input vector -> outcome table, for a single mutant.
pub type CountsByInput = BTreeMap<String, OutcomeTable>;

/// One execution result as read from a log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRecord {
    /// Path-like name of the mutant circuit
    pub mutant: String,
    /// Input vector the mutant was executed on, verbatim
    pub input: String,
    pub counts: OutcomeTable,
}

/// Aggregated counts plus bookkeeping from reading a log.
#[derive(Debug, Clone, Default)]
pub struct ReadOutcome {
    pub counts: CountsByMutant,
    pub lines_read: usize,
    pub records: usize,
    pub skipped: usize,
}

/// Summary of a completed parse run.
#[derive(Debug, Clone)]
pub struct ParseReport {
    pub output_dir: PathBuf,
    pub files: Vec<PathBuf>,
    pub lines_read: usize,
    pub records: usize,
    pub skipped: usize,
    pub mutants: usize,
}

/// Parse a result log with the default settings.
pub fn parse(log_path: &Path) -> Result<ParseReport, ResultsError> {
    parse_with(log_path, &ParserConfig::default())
}

/// Parse a result log and write one JSON file per mutant next to it.
pub fn parse_with(log_path: &Path, config: &ParserConfig) -> Result<ParseReport, ResultsError> {
    let ReadOutcome {
        counts,
        lines_read,
        records,
        skipped,
    } = read_log(log_path, config)?;

    let files = writer::write_sections(&counts, log_path, &config.output_dir_name)?;

    Ok(ParseReport {
        output_dir: writer::output_dir_for(log_path, &config.output_dir_name),
        files,
        lines_read,
        records,
        skipped,
        mutants: counts.len(),
    })
}

/// Read and fold a log without writing anything.
pub fn read_log(log_path: &Path, config: &ParserConfig) -> Result<ReadOutcome, ResultsError> {
    let file = File::open(log_path).map_err(|e| ResultsError::io(log_path, e))?;
    let policy = config.merge_policy.policy();

    let mut outcome = ReadOutcome::default();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| ResultsError::io(log_path, e))?;
        let line_number = idx + 1;
        outcome.lines_read += 1;

        match line::parse_line(&line) {
            Ok(Some(record)) => {
                outcome.counts.fold(record, policy);
                outcome.records += 1;
            }
            Ok(None) => {}
            Err(source)
                if source.is_shape_error()
                    && config.unmatched_lines == UnmatchedLinePolicy::Skip =>
            {
                tracing::warn!("Skipping line {}: {}", line_number, source);
                outcome.skipped += 1;
            }
            Err(source) => return Err(ResultsError::Line { line_number, source }),
        }
    }

    Ok(outcome)
}
