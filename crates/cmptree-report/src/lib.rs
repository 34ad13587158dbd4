//! File-backed reporting for cmptree.
//!
//! This crate writes report events to log files and produces the digest
//! printed at the end of a run:
//!
//! - [`LogFile`] - append-only log, created on its first line, with the
//!   previous run's file moved to `<name>.bak`
//! - [`LogFileSink`] - a [`ReportSink`](cmptree_core::ReportSink) writing
//!   errors to `cmp-err.log` and matching entries to `cmp-ok.log`
//! - [`run_digest`] - `Compare ok.` or the first lines of the error log

mod digest;
mod log_file;
mod sink;

pub use digest::{COMPARE_OK, DIGEST_LINES, error_digest, run_digest};
pub use log_file::{ERR_LOG_DEFAULT_NAME, LOG_BACKUP_EXT, LogFile, OK_LOG_DEFAULT_NAME};
pub use sink::LogFileSink;
