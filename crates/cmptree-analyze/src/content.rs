//! Content comparison of matched file pairs.
//!
//! Two modes:
//! - Shallow: equal signature (file type, size, modification time) means
//!   equal content; nothing is read.
//! - Deep: sizes must match, then both files are read side by side in
//!   fixed-size chunks until the first differing chunk.
//!
//! Entries that are not regular files on both sides never compare equal.

use std::fs::{self, File, Metadata};
use std::io::{self, Read};
use std::path::Path;
use std::time::SystemTime;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use cmptree_core::{current_username, permission_comment};
use cmptree_scan::FilePair;

const CHUNK_SIZE: usize = 8 * 1024;

/// Result of comparing one file pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentOutcome {
    Same,
    Differs,
    /// Either file could not be read; carries the report comment.
    NoAccess(String),
}

/// Outcome plus the number of reference bytes read to reach it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub outcome: ContentOutcome,
    pub bytes_read: u64,
}

/// Compares file pairs by content or by signature.
#[derive(Debug, Clone)]
pub struct ContentComparer {
    shallow: bool,
    chunk_size: usize,
}

impl ContentComparer {
    pub fn new(shallow: bool) -> Self {
        Self {
            shallow,
            chunk_size: CHUNK_SIZE,
        }
    }

    /// Compare one pair of files.
    pub fn compare(&self, reference: &Path, candidate: &Path) -> Comparison {
        match self.try_compare(reference, candidate) {
            Ok(comparison) => comparison,
            Err(err) => {
                let comment = match err.kind() {
                    io::ErrorKind::PermissionDenied => permission_comment(None),
                    _ => format!("OSError {err} as user {}", current_username()),
                };
                tracing::debug!(
                    reference = %reference.display(),
                    candidate = %candidate.display(),
                    "Content comparison failed: {err}"
                );
                Comparison {
                    outcome: ContentOutcome::NoAccess(comment),
                    bytes_read: 0,
                }
            }
        }
    }

    /// Compare a batch of pairs, in parallel unless `pool` is `None`.
    ///
    /// Results keep the order of `pairs`.
    pub fn compare_batch(
        &self,
        pairs: &[FilePair],
        pool: Option<&rayon::ThreadPool>,
    ) -> Vec<Comparison> {
        match pool {
            Some(pool) => pool.install(|| {
                pairs
                    .par_iter()
                    .map(|pair| self.compare(&pair.reference, &pair.candidate))
                    .collect()
            }),
            None => pairs
                .iter()
                .map(|pair| self.compare(&pair.reference, &pair.candidate))
                .collect(),
        }
    }

    fn try_compare(&self, reference: &Path, candidate: &Path) -> io::Result<Comparison> {
        let ref_meta = fs::metadata(reference)?;
        let cand_meta = fs::metadata(candidate)?;

        let differs = Comparison {
            outcome: ContentOutcome::Differs,
            bytes_read: 0,
        };
        if !ref_meta.is_file() || !cand_meta.is_file() {
            return Ok(differs);
        }
        if self.shallow {
            return Ok(if Signature::of(&ref_meta) == Signature::of(&cand_meta) {
                Comparison {
                    outcome: ContentOutcome::Same,
                    bytes_read: 0,
                }
            } else {
                differs
            });
        }
        if ref_meta.len() != cand_meta.len() {
            return Ok(differs);
        }

        self.compare_bytes(File::open(reference)?, File::open(candidate)?)
    }

    fn compare_bytes(&self, mut reference: File, mut candidate: File) -> io::Result<Comparison> {
        let mut ref_buf = vec![0u8; self.chunk_size];
        let mut cand_buf = vec![0u8; self.chunk_size];
        let mut bytes_read = 0u64;

        loop {
            let n = read_full(&mut reference, &mut ref_buf)?;
            let m = read_full(&mut candidate, &mut cand_buf)?;
            bytes_read += n as u64;

            if n != m || ref_buf[..n] != cand_buf[..m] {
                return Ok(Comparison {
                    outcome: ContentOutcome::Differs,
                    bytes_read,
                });
            }
            if n == 0 {
                return Ok(Comparison {
                    outcome: ContentOutcome::Same,
                    bytes_read,
                });
            }
        }
    }
}

impl Default for ContentComparer {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Shallow identity of a regular file.
#[derive(Debug, PartialEq, Eq)]
struct Signature {
    size: u64,
    modified: Option<SystemTime>,
}

impl Signature {
    fn of(meta: &Metadata) -> Self {
        Self {
            size: meta.len(),
            modified: meta.modified().ok(),
        }
    }
}

/// Read until `buf` is full or the reader is exhausted.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}
