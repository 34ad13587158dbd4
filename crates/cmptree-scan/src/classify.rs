//! Per-entry classification.
//!
//! Given a name that exists in the reference tree, decide what the
//! traversal does with it: report it, queue it for content comparison,
//! descend into it, or skip it.

use std::path::{Path, PathBuf};

use cmptree_core::{EntryKind, ErrorKind, ProbeError, Side};

use crate::probe;

/// The same name resolved under both roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPair {
    pub reference: PathBuf,
    pub candidate: PathBuf,
}

impl EntryPair {
    pub fn new(reference: impl Into<PathBuf>, candidate: impl Into<PathBuf>) -> Self {
        Self {
            reference: reference.into(),
            candidate: candidate.into(),
        }
    }

    /// Path of this entry on the given side.
    pub fn on(&self, side: Side) -> &Path {
        match side {
            Side::Reference => &self.reference,
            Side::Candidate => &self.candidate,
        }
    }
}

/// What the traversal does with one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Nothing to report, nothing to descend into.
    Skip,
    /// Both sides match; no further work.
    Matched(EntryKind),
    /// Matching real directories; report ok and descend.
    Descend,
    /// Matching real files; content still has to be compared.
    CompareContent,
    /// A discrepancy, reported on the path of `side`.
    Mismatch {
        error: ErrorKind,
        kind: EntryKind,
        side: Side,
        comment: Option<&'static str>,
    },
}

impl Disposition {
    fn mismatch(error: ErrorKind, kind: EntryKind) -> Self {
        Self::Mismatch {
            error,
            kind,
            side: Side::Reference,
            comment: None,
        }
    }
}

/// Classify one reference entry against its candidate counterpart.
///
/// `list_kind` is the kind of the listing the name came from (directories
/// or files), `in_candidate_listing` tells whether the candidate level
/// holds the name, and `candidate_excluded` is consulted only
/// when the name is absent from the candidate listing.
pub fn classify(
    pair: &EntryPair,
    list_kind: EntryKind,
    in_candidate_listing: bool,
    candidate_excluded: impl FnOnce() -> bool,
) -> Result<Disposition, ProbeError> {
    match probe::entry_kind(&pair.reference)? {
        Some(EntryKind::Symlink) => classify_symlink(pair, list_kind),
        _ => classify_real(pair, list_kind, in_candidate_listing, candidate_excluded),
    }
}

fn classify_symlink(pair: &EntryPair, list_kind: EntryKind) -> Result<Disposition, ProbeError> {
    let target = probe::read_link(&pair.reference)?;

    let disposition = match probe::entry_kind(&pair.candidate)? {
        None => Disposition::mismatch(ErrorKind::NotExistInCandidate, list_kind),
        Some(EntryKind::Symlink) => {
            if probe::read_link(&pair.candidate)? == target {
                Disposition::Matched(EntryKind::Symlink)
            } else {
                Disposition::mismatch(ErrorKind::ContentDiffers, EntryKind::Symlink)
            }
        }
        Some(_) => Disposition::mismatch(ErrorKind::TypeMismatch, EntryKind::Symlink),
    };
    Ok(disposition)
}

fn classify_real(
    pair: &EntryPair,
    list_kind: EntryKind,
    in_candidate_listing: bool,
    candidate_excluded: impl FnOnce() -> bool,
) -> Result<Disposition, ProbeError> {
    if !in_candidate_listing {
        return Ok(if candidate_excluded() {
            Disposition::Skip
        } else {
            Disposition::mismatch(ErrorKind::NotExistInCandidate, list_kind)
        });
    }

    if probe::entry_kind(&pair.candidate)? == Some(EntryKind::Symlink) {
        return Ok(Disposition::Mismatch {
            error: ErrorKind::TypeMismatch,
            kind: list_kind,
            side: Side::Candidate,
            comment: Some("FS2 entry is symlink"),
        });
    }

    Ok(match list_kind {
        EntryKind::Directory => Disposition::Descend,
        _ => Disposition::CompareContent,
    })
}
