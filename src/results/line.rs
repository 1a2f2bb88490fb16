//! Scanner for a single result-log line.
//!
//! A result line has the shape
//!
//! ```text
//! The result of <mutant> with input [<input>] is ... {<label>: <count>, ...}
//! ```
//!
//! Only the two markers, the bracket pair and the brace pair are significant;
//! any other wording around them is ignored.

use super::error::LineError;
use super::literal::parse_counts;
use super::ResultRecord;

const RESULT_PREFIX: &str = "The result of ";
const INPUT_MARKER: &str = " with input ";

/// Parse one log line into a record.
///
/// Blank lines yield `Ok(None)`. Lines that are missing any anchor are reported
/// with the specific anchor that could not be found.
pub fn parse_line(line: &str) -> Result<Option<ResultRecord>, LineError> {
    if line.trim().is_empty() {
        return Ok(None);
    }

    let mutant_start = line
        .find(RESULT_PREFIX)
        .map(|i| i + RESULT_PREFIX.len())
        .ok_or(LineError::MissingPrefix)?;
    let rest = &line[mutant_start..];

    let mutant_len = rest.find(INPUT_MARKER).ok_or(LineError::MissingInputMarker)?;
    if mutant_len == 0 {
        return Err(LineError::EmptyMutant);
    }
    let mutant = &rest[..mutant_len];
    let rest = &rest[mutant_len + INPUT_MARKER.len()..];

    let (input, rest) = bracketed(rest).ok_or(LineError::MissingInputVector)?;

    let counts_start = rest.find('{').ok_or(LineError::MissingCounts)?;
    let (counts, _) = parse_counts(&rest[counts_start..]).map_err(LineError::MalformedCounts)?;

    Ok(Some(ResultRecord {
        mutant: mutant.to_string(),
        input: input.to_string(),
        counts,
    }))
}

/// Split `text` around its first `[...]` pair, returning the inside and the tail.
fn bracketed(text: &str) -> Option<(&str, &str)> {
    let open = text.find('[')?;
    let inner = &text[open + 1..];
    let close = inner.find(']')?;
    Some((&inner[..close], &inner[close + 1..]))
}
