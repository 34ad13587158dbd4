//! Error types for comparison runs and filesystem probes.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors that stop a comparison run.
///
/// Discrepancies between the trees are never errors; they are reported as
/// [`ReportEvent`](crate::ReportEvent)s and the run continues.
#[derive(Debug, Error)]
pub enum CompareError {
    /// A tree root does not exist or is not a directory.
    #[error("Invalid tree root {}: {reason}", path.display())]
    InvalidRoot { path: PathBuf, reason: String },

    /// An exclusion pattern failed to compile.
    #[error("Invalid exclusion pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },

    /// The traverse list could not be read.
    #[error("Cannot read traverse list {}: {source}", path.display())]
    TraverseList {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A report could not be written.
    #[error("Cannot write report to {}: {source}", path.display())]
    Sink {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    Config { message: String },
}

/// Failure to inspect a single filesystem entry.
///
/// Access denial is expected while walking real filesystems and is kept
/// apart from other I/O faults. A missing entry is not a probe error.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Permission denied.
    #[error("Permission denied: {}", path.display())]
    AccessDenied { path: PathBuf },

    /// Any other I/O error.
    #[error("I/O error at {}: {source}", path.display())]
    Unexpected {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ProbeError {
    /// Classify an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            io::ErrorKind::PermissionDenied => Self::AccessDenied { path },
            _ => Self::Unexpected { path, source },
        }
    }

    /// Whether this is an expected access denial.
    pub fn is_access_denied(&self) -> bool {
        matches!(self, Self::AccessDenied { .. })
    }

    /// Path the probe failed on.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::AccessDenied { path } | Self::Unexpected { path, .. } => path,
        }
    }

    /// Report comment describing this failure.
    pub fn comment(&self) -> String {
        match self {
            Self::AccessDenied { .. } => permission_comment(None),
            Self::Unexpected { source, .. } => format!("UNEXPECTED {source}"),
        }
    }
}

/// Name of the user running the comparison, for diagnostics.
pub fn current_username() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}

/// Comment attached to permission failures, optionally with error details.
pub fn permission_comment(details: Option<&io::Error>) -> String {
    match details {
        Some(err) => format!("PermissionError {err} as user {}", current_username()),
        None => format!("PermissionError as user {}", current_username()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_error_io() {
        let err = ProbeError::io(
            "/test/path",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.is_access_denied());
        assert!(err.comment().starts_with("PermissionError as user "));

        let err = ProbeError::io("/test/path", io::Error::other("disk on fire"));
        assert!(!err.is_access_denied());
        assert_eq!(err.comment(), "UNEXPECTED disk on fire");
        assert_eq!(err.path(), std::path::Path::new("/test/path"));
    }

    #[test]
    fn test_compare_error_display() {
        let err = CompareError::InvalidRoot {
            path: PathBuf::from("/nope"),
            reason: "not a directory".into(),
        };
        assert_eq!(err.to_string(), "Invalid tree root /nope: not a directory");
    }
}
