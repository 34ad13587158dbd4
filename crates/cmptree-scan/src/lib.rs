//! Structural comparison engine for cmptree.
//!
//! This crate walks a reference tree and a candidate tree side by side and
//! reports every structural discrepancy between them.
//!
//! # Overview
//!
//! `cmptree-scan` is phase one of a comparison run. Key features:
//!
//! - **Mirrored-list reduction** deciding per directory level what is
//!   reported, skipped, or descended into
//! - **Exclusion patterns** via globset, anchored at either tree top
//! - **Explicit probes** separating access denial from other I/O faults
//! - **Progress updates** via broadcast channels
//!
//! Matching regular files are not read here; they are returned as a
//! worklist of [`FilePair`]s for the content phase.
//!
//! # Example
//!
//! ```rust,no_run
//! use cmptree_core::{MemorySink, Reporter};
//! use cmptree_scan::{ExclusionMatcher, TreeWalker};
//!
//! let matcher = ExclusionMatcher::new("/fs1", "/fs2", &[], false).unwrap();
//! let mut walker = TreeWalker::new("/fs1", "/fs2", matcher);
//! let mut reporter = Reporter::new(MemorySink::new(), false);
//!
//! let worklist = walker.walk(&mut reporter).unwrap();
//! println!("{} file pairs to compare", worklist.len());
//! println!("Structure ok: {}", reporter.summary().is_ok());
//! ```

mod classify;
mod matcher;
pub mod probe;
mod progress;
mod walker;

pub use classify::{Disposition, EntryPair, classify};
pub use matcher::ExclusionMatcher;
pub use probe::Listing;
pub use progress::{ComparePhase, CompareProgress, ProgressTracker};
pub use walker::{FilePair, TreeWalker, parse_traverse_list};

// Re-export core types for convenience
pub use cmptree_core::{
    CompareConfig, CompareError, EntryKind, ErrorKind, ProbeError, ReportEvent, ReportSink,
    Reporter, Side,
};
