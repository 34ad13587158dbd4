//! End-of-run digest printed after a comparison.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use cmptree_core::CompareError;

/// Number of error lines shown in the digest.
pub const DIGEST_LINES: usize = 5;

/// Message printed when no discrepancy was found.
pub const COMPARE_OK: &str = "Compare ok.";

/// Summarize the error log at `err_log`: a header naming the file, then
/// its first [`DIGEST_LINES`] lines.
pub fn error_digest(err_log: &Path) -> Result<String, CompareError> {
    let sink_error = |source| CompareError::Sink {
        path: err_log.to_path_buf(),
        source,
    };
    let reader = BufReader::new(File::open(err_log).map_err(sink_error)?);

    let mut shown = Vec::with_capacity(DIGEST_LINES);
    let mut total = 0usize;
    for line in reader.lines() {
        let line = line.map_err(sink_error)?;
        total += 1;
        if shown.len() < DIGEST_LINES {
            shown.push(line);
        }
    }

    let header = if total > DIGEST_LINES {
        format!(
            "Compare errors - First {DIGEST_LINES} lines below (for all {total} lines see file '{}'):",
            err_log.display()
        )
    } else {
        format!(
            "Compare errors (find them as well in file '{}'):",
            err_log.display()
        )
    };
    Ok(format!("{header}\n{}", shown.join("\n")))
}

/// Digest for a finished run: [`COMPARE_OK`] on success, the error digest
/// otherwise.
pub fn run_digest(ok: bool, err_log: &Path) -> Result<String, CompareError> {
    if ok {
        Ok(COMPARE_OK.to_string())
    } else {
        error_digest(err_log)
    }
}
