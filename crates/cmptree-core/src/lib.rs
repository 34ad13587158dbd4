//! Core types and traits for cmptree.
//!
//! This crate provides the value types shared by the traversal and
//! comparison crates: entry and error kinds, report events and sinks,
//! the run configuration, and the built-in exclusion pattern lists.

mod config;
mod entry;
mod error;
pub mod patterns;
mod report;

pub use config::{CompareConfig, CompareConfigBuilder};
pub use entry::{EntryKind, ErrorKind, Side, error_text};
pub use error::{CompareError, ProbeError, current_username, permission_comment};
pub use report::{CompareSummary, MemorySink, ReportEvent, ReportSink, Reporter, RunResult};
