//! Entry and error kinds, and the error text shown in reports.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// Which of the two compared trees a path belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum Side {
    /// The source of truth ("FS1").
    #[strum(to_string = "FS1")]
    Reference,
    /// The tree validated against the reference ("FS2").
    #[strum(to_string = "FS2")]
    Candidate,
}

/// Kind of a directory entry as seen on one side.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, Serialize, Deserialize,
)]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
    /// The entry could not be classified (e.g. its listing failed).
    Unknown,
}

/// Kind of discrepancy between the two trees.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, Serialize, Deserialize,
)]
pub enum ErrorKind {
    /// Present in the candidate tree only.
    NotExistInReference,
    /// Present in the reference tree only.
    NotExistInCandidate,
    /// File content or symlink target differs.
    ContentDiffers,
    /// The candidate node has a different type.
    TypeMismatch,
    /// The entry could not be read.
    NoAccess,
}

impl ErrorKind {
    /// The kind reported when the two roots are swapped.
    pub fn mirrored(self) -> Self {
        match self {
            Self::NotExistInReference => Self::NotExistInCandidate,
            Self::NotExistInCandidate => Self::NotExistInReference,
            other => other,
        }
    }
}

/// Human-readable description of an error for a given entry kind.
///
/// This text is part of the log line format and must stay stable.
pub fn error_text(error: ErrorKind, kind: EntryKind) -> String {
    match (error, kind) {
        (ErrorKind::NotExistInReference, kind) => format!("{kind} does not exist in FS1"),
        (ErrorKind::NotExistInCandidate, kind) => format!("{kind} does not exist in FS2"),
        (ErrorKind::ContentDiffers, EntryKind::File) => "Content is different".to_string(),
        (ErrorKind::ContentDiffers, EntryKind::Symlink) => "Symlink target is different".to_string(),
        (ErrorKind::ContentDiffers, kind) => format!("{kind} is different"),
        (ErrorKind::TypeMismatch, kind) => format!("Node type in FS2 is not {kind}"),
        (ErrorKind::NoAccess, kind) => format!("No access to {kind} (e.g. file permissions)"),
    }
}
