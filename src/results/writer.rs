//! Persisting aggregated counts as one JSON file per mutant.

use super::aggregate::CountsByMutant;
use super::error::ResultsError;
use super::CountsByInput;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};

/// Directory created next to the log when no other name is configured.
pub const DEFAULT_OUTPUT_DIR_NAME: &str = "json_results";

const INDENT: &[u8] = b"    ";

/// Output directory for a log: a sibling of the log file named `dir_name`.
pub fn output_dir_for(log_path: &Path, dir_name: &str) -> PathBuf {
    let parent = log_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    parent.join(dir_name)
}

/// Check that `dir_name` is a single plain directory name.
///
/// Separators, `.`/`..`, roots and prefixes would move the output away from the log.
pub fn validate_output_dir_name(dir_name: &str) -> Result<(), ResultsError> {
    let mut components = Path::new(dir_name).components();
    let single_normal = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if single_normal && !dir_name.contains(['/', '\\']) {
        Ok(())
    } else {
        Err(ResultsError::InvalidOutputDirName {
            name: dir_name.to_string(),
        })
    }
}

/// File stem for a mutant: its base name up to the first `.`.
///
/// Only `/` separates directories; a backslash is part of the name.
/// Returns `None` when that leaves nothing (e.g. `.hidden` or `dir/`).
pub fn section_stem(mutant: &str) -> Option<&str> {
    let base = mutant.rsplit('/').next()?;
    let stem = base.split('.').next()?;
    (!stem.is_empty()).then_some(stem)
}

/// Serialize one mutant's section: sorted keys, four-space indent, no trailing newline.
pub fn render_section(by_input: &CountsByInput) -> Result<Vec<u8>, serde_json::Error> {
    let mut out = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(INDENT));
    by_input.serialize(&mut serializer)?;
    Ok(out)
}

/// Create the output directory and write every mutant's section into it.
///
/// Fails without writing anything if the directory already exists. Files are
/// created exclusively; a failure part-way leaves earlier files in place.
pub fn write_sections(
    counts: &CountsByMutant,
    log_path: &Path,
    dir_name: &str,
) -> Result<Vec<PathBuf>, ResultsError> {
    validate_output_dir_name(dir_name)?;
    let output_dir = output_dir_for(log_path, dir_name);

    fs::create_dir(&output_dir).map_err(|e| match e.kind() {
        ErrorKind::AlreadyExists => ResultsError::OutputDirExists(output_dir.clone()),
        _ => ResultsError::io(&output_dir, e),
    })?;
    tracing::debug!("Created output directory {}", output_dir.display());

    let mut written = Vec::with_capacity(counts.len());
    for (mutant, by_input) in counts.iter() {
        let stem = section_stem(mutant).ok_or_else(|| ResultsError::InvalidMutantName {
            mutant: mutant.clone(),
        })?;
        let path = output_dir.join(format!("{stem}.json"));

        let bytes = render_section(by_input).map_err(|source| ResultsError::Serialize {
            path: path.clone(),
            source,
        })?;
        write_new_file(&path, &bytes)?;

        tracing::debug!(
            "Wrote {} input(s) for {} to {}",
            by_input.len(),
            mutant,
            path.display()
        );
        written.push(path);
    }

    Ok(written)
}

fn write_new_file(path: &Path, bytes: &[u8]) -> Result<(), ResultsError> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => ResultsError::OutputFileExists(path.to_path_buf()),
            _ => ResultsError::io(path, e),
        })?;
    file.write_all(bytes)
        .and_then(|()| file.flush())
        .map_err(|e| ResultsError::io(path, e))
}
