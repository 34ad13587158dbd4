//! Report events, sinks, and run result aggregation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::entry::{EntryKind, ErrorKind, error_text};
use crate::error::CompareError;

/// A single outcome of the comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportEvent {
    /// The entry matches.
    Ok {
        kind: EntryKind,
        /// Absolute path of the entry.
        path: PathBuf,
        /// Path relative to the root of the tree `path` lives in.
        rel: PathBuf,
        comment: Option<String>,
    },
    /// The entry differs or could not be examined.
    Error {
        error: ErrorKind,
        kind: EntryKind,
        path: PathBuf,
        rel: PathBuf,
        comment: Option<String>,
    },
}

impl ReportEvent {
    /// Create an ok event.
    pub fn ok(kind: EntryKind, path: impl Into<PathBuf>, rel: impl Into<PathBuf>) -> Self {
        Self::Ok {
            kind,
            path: path.into(),
            rel: rel.into(),
            comment: None,
        }
    }

    /// Create an error event.
    pub fn error(
        error: ErrorKind,
        kind: EntryKind,
        path: impl Into<PathBuf>,
        rel: impl Into<PathBuf>,
    ) -> Self {
        Self::Error {
            error,
            kind,
            path: path.into(),
            rel: rel.into(),
            comment: None,
        }
    }

    /// Attach a free-text comment.
    pub fn with_comment(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        let slot = match &mut self {
            Self::Ok { comment, .. } | Self::Error { comment, .. } => comment,
        };
        *slot = if text.is_empty() { None } else { Some(text) };
        self
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// The error kind, for error events.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Error { error, .. } => Some(*error),
            Self::Ok { .. } => None,
        }
    }

    pub fn entry_kind(&self) -> EntryKind {
        match self {
            Self::Ok { kind, .. } | Self::Error { kind, .. } => *kind,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Ok { path, .. } | Self::Error { path, .. } => path,
        }
    }

    pub fn rel(&self) -> &Path {
        match self {
            Self::Ok { rel, .. } | Self::Error { rel, .. } => rel,
        }
    }

    pub fn comment(&self) -> Option<&str> {
        match self {
            Self::Ok { comment, .. } | Self::Error { comment, .. } => comment.as_deref(),
        }
    }

    /// Render the event as a report line.
    ///
    /// Errors: `Error: <text> | <path>[ || REL: /<rel>][ || COMMENT: <comment>]`.
    /// Ok entries use the same layout without the `Error: <text> | ` prefix.
    pub fn to_line(&self, show_relative: bool) -> String {
        let mut line = match self {
            Self::Error { error, kind, .. } => {
                format!("Error: {} | {}", error_text(*error, *kind), self.path().display())
            }
            Self::Ok { .. } => self.path().display().to_string(),
        };
        if show_relative {
            line.push_str(&format!(" || REL: /{}", self.rel().display()));
        }
        if let Some(comment) = self.comment() {
            line.push_str(" || COMMENT: ");
            line.push_str(comment);
        }
        line
    }
}

/// Receiver of report events.
///
/// Sinks are written by a single logical writer, in report order.
pub trait ReportSink {
    /// Record one event.
    fn report(&mut self, event: &ReportEvent) -> Result<(), CompareError>;

    /// Record a matching entry.
    fn report_ok(
        &mut self,
        kind: EntryKind,
        path: &Path,
        rel: &Path,
        comment: Option<&str>,
    ) -> Result<(), CompareError> {
        let event = ReportEvent::ok(kind, path, rel).with_comment(comment.unwrap_or_default());
        self.report(&event)
    }

    /// Record a discrepancy.
    fn report_error(
        &mut self,
        error: ErrorKind,
        kind: EntryKind,
        path: &Path,
        rel: &Path,
        comment: Option<&str>,
    ) -> Result<(), CompareError> {
        let event =
            ReportEvent::error(error, kind, path, rel).with_comment(comment.unwrap_or_default());
        self.report(&event)
    }
}

impl<S: ReportSink + ?Sized> ReportSink for &mut S {
    fn report(&mut self, event: &ReportEvent) -> Result<(), CompareError> {
        (**self).report(event)
    }
}

impl<S: ReportSink + ?Sized> ReportSink for Box<S> {
    fn report(&mut self, event: &ReportEvent) -> Result<(), CompareError> {
        (**self).report(event)
    }
}

/// Sink that keeps every event in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub events: Vec<ReportEvent>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All error events, in report order.
    pub fn errors(&self) -> impl Iterator<Item = &ReportEvent> {
        self.events.iter().filter(|e| e.is_error())
    }

    /// All ok events, in report order.
    pub fn oks(&self) -> impl Iterator<Item = &ReportEvent> {
        self.events.iter().filter(|e| !e.is_error())
    }

    /// Number of errors of the given kind.
    pub fn count(&self, kind: ErrorKind) -> usize {
        self.errors().filter(|e| e.error_kind() == Some(kind)).count()
    }

    /// Rendered lines of all error events.
    pub fn error_lines(&self, show_relative: bool) -> Vec<String> {
        self.errors().map(|e| e.to_line(show_relative)).collect()
    }
}

impl ReportSink for MemorySink {
    fn report(&mut self, event: &ReportEvent) -> Result<(), CompareError> {
        self.events.push(event.clone());
        Ok(())
    }
}

/// Single writer that folds events into a [`CompareSummary`] and forwards
/// them to a sink.
///
/// Ok events only reach the sink when `report_identical` is set; they are
/// always counted.
#[derive(Debug)]
pub struct Reporter<S> {
    sink: S,
    summary: CompareSummary,
    report_identical: bool,
}

impl<S: ReportSink> Reporter<S> {
    pub fn new(sink: S, report_identical: bool) -> Self {
        Self {
            sink,
            summary: CompareSummary::new(),
            report_identical,
        }
    }

    /// Record one event.
    pub fn emit(&mut self, event: ReportEvent) -> Result<(), CompareError> {
        self.summary.record(&event);
        if event.is_error() || self.report_identical {
            self.sink.report(&event)?;
        }
        Ok(())
    }

    pub fn summary(&self) -> &CompareSummary {
        &self.summary
    }

    pub fn summary_mut(&mut self) -> &mut CompareSummary {
        &mut self.summary
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Consume the reporter, returning the sink and the final summary.
    pub fn into_parts(self) -> (S, CompareSummary) {
        (self.sink, self.summary)
    }
}

/// Overall outcome of a run.
///
/// Starts successful and becomes permanently failed on the first error event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    ok: bool,
}

impl RunResult {
    pub fn new() -> Self {
        Self { ok: true }
    }

    /// Fold an event into the result.
    pub fn record(&mut self, event: &ReportEvent) {
        if event.is_error() {
            self.ok = false;
        }
    }

    pub fn is_ok(&self) -> bool {
        self.ok
    }
}

impl Default for RunResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Counters collected over a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompareSummary {
    /// Overall success flag.
    pub result: RunResult,
    /// Number of errors per kind.
    pub error_counts: BTreeMap<ErrorKind, u64>,
    /// Number of ok events (reported or not).
    pub ok_count: u64,
    /// Number of directory levels compared.
    pub dirs_walked: u64,
    /// Number of file pairs examined in the content phase.
    pub files_compared: u64,
    /// Bytes read from the reference tree in the content phase.
    pub bytes_compared: u64,
    /// Wall-clock duration of the run.
    pub duration: Duration,
}

impl CompareSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold an event into the counters and the run result.
    pub fn record(&mut self, event: &ReportEvent) {
        self.result.record(event);
        match event.error_kind() {
            Some(kind) => *self.error_counts.entry(kind).or_insert(0) += 1,
            None => self.ok_count += 1,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// Number of errors of the given kind.
    pub fn error_count(&self, kind: ErrorKind) -> u64 {
        self.error_counts.get(&kind).copied().unwrap_or(0)
    }

    /// Total number of errors.
    pub fn total_errors(&self) -> u64 {
        self.error_counts.values().sum()
    }

    /// Error counts as they would be seen with the roots swapped.
    pub fn mirrored_error_counts(&self) -> BTreeMap<ErrorKind, u64> {
        self.error_counts
            .iter()
            .map(|(kind, count)| (kind.mirrored(), *count))
            .collect()
    }
}
