//! Converts quantum mutation-testing result logs into per-mutant count data.
//!
//! Each log line records one mutant executed on one input vector, together with
//! the measured outcome counts. [`results::parse`] folds those lines into
//! mutant -> input -> counts and writes one JSON file per mutant to a
//! `json_results` directory next to the log.

pub mod config;
pub mod results;

pub use results::{parse, parse_with, ParseReport, ResultsError};
