//! Error taxonomy for result-log parsing.

use std::path::PathBuf;
use thiserror::Error;

/// What went wrong inside a count literal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LiteralErrorKind {
    #[error("unexpected end of input")]
    UnexpectedEnd,
    #[error("unexpected character {0:?}")]
    UnexpectedChar(char),
    #[error("expected '{{'")]
    ExpectedOpenBrace,
    #[error("expected ':' after key")]
    ExpectedColon,
    #[error("expected ',' or '}}'")]
    ExpectedCommaOrClose,
    #[error("unterminated string")]
    UnterminatedString,
    #[error("invalid escape sequence")]
    InvalidEscape,
    #[error("counts must be non-negative")]
    NegativeCount,
    #[error("counts must be integers")]
    NonIntegerCount,
    #[error("leading zeros in a non-zero integer")]
    LeadingZeros,
    #[error("count does not fit in 64 bits")]
    CountOverflow,
}

/// A malformed count literal, with the byte offset (relative to the opening brace)
/// where parsing stopped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at offset {offset}")]
pub struct LiteralError {
    pub offset: usize,
    pub kind: LiteralErrorKind,
}

impl LiteralError {
    pub(crate) fn new(offset: usize, kind: LiteralErrorKind) -> Self {
        Self { offset, kind }
    }
}

/// A line that does not have the shape of an execution result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineError {
    #[error("missing \"The result of \" marker")]
    MissingPrefix,
    #[error("missing \" with input \" marker")]
    MissingInputMarker,
    #[error("empty mutant identity")]
    EmptyMutant,
    #[error("missing bracketed input vector")]
    MissingInputVector,
    #[error("missing count literal")]
    MissingCounts,
    #[error("malformed count literal: {0}")]
    MalformedCounts(#[source] LiteralError),
}

impl LineError {
    /// Shape errors may be skipped by policy; a corrupt literal never is.
    pub fn is_shape_error(&self) -> bool {
        !matches!(self, Self::MalformedCounts(_))
    }
}

/// Errors surfaced by a parse run.
#[derive(Debug, Error)]
pub enum ResultsError {
    #[error("line {line_number}: {source}")]
    Line {
        line_number: usize,
        #[source]
        source: LineError,
    },

    #[error("output directory already exists: {}", .0.display())]
    OutputDirExists(PathBuf),

    #[error("output file already exists: {}", .0.display())]
    OutputFileExists(PathBuf),

    #[error("output directory name {name:?} must be a single plain directory name")]
    InvalidOutputDirName { name: String },

    #[error("mutant {mutant:?} has no usable file name")]
    InvalidMutantName { mutant: String },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize {}: {source}", .path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ResultsError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
