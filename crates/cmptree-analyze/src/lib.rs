//! Content comparison and run orchestration for cmptree.
//!
//! This crate provides:
//!
//! - **Content comparison** - Shallow (signature) or deep (byte) comparison
//!   of matched file pairs, fanned out on a rayon pool
//! - **Tree comparison** - [`TreeComparer`] runs the structural walk, then
//!   the content phase, reporting into a [`ReportSink`](cmptree_core::ReportSink)
//! - **Log analytics** - Frequencies of error texts and comments in logs of
//!   previous runs
//!
//! # Comparing Trees
//!
//! ```rust,no_run
//! use cmptree_analyze::TreeComparer;
//! use cmptree_core::{CompareConfig, MemorySink};
//!
//! let config = CompareConfig::builder()
//!     .reference("/Volumes/Source")
//!     .candidate("/Volumes/Backup")
//!     .standard_exclusions(false)
//!     .build()
//!     .unwrap();
//!
//! let comparer = TreeComparer::new(config).unwrap();
//! let (sink, summary) = comparer.run(MemorySink::new()).unwrap();
//!
//! for line in sink.error_lines(false) {
//!     println!("{line}");
//! }
//! println!("Compare ok: {}", summary.is_ok());
//! ```
//!
//! # Log Analytics
//!
//! ```rust,no_run
//! use cmptree_analyze::LogAnalytics;
//!
//! let text = std::fs::read_to_string("cmp-err.log").unwrap();
//! let report = LogAnalytics::from_text(&text).report(3);
//! print!("{}", report.render_text());
//! ```

mod comparer;
mod content;
pub mod log_stats;

pub use comparer::TreeComparer;
pub use content::{Comparison, ContentComparer, ContentOutcome};
pub use log_stats::{Frequency, FrequencyReport, LogAnalytics, LogLine, MalformedLine};

pub use cmptree_scan::{ComparePhase, CompareProgress};
