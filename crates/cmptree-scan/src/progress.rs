//! Comparison progress reporting.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use strum::Display;
use tokio::sync::broadcast;

/// Phase of a comparison run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ComparePhase {
    /// Structural traversal of both trees.
    #[strum(serialize = "walk")]
    Walk,
    /// Content comparison of matched file pairs.
    #[strum(serialize = "content")]
    Content,
}

/// Progress information during a comparison.
#[derive(Debug, Clone)]
pub struct CompareProgress {
    pub phase: ComparePhase,
    /// Entries classified (walk) or file pairs compared (content).
    pub entries_processed: u64,
    /// Directory levels compared so far.
    pub dirs_walked: u64,
    /// File pairs queued for content comparison.
    pub files_queued: u64,
    /// Entry most recently examined.
    pub current_path: PathBuf,
    /// Number of discrepancies reported so far.
    pub errors_count: u64,
    /// Time elapsed since the run started.
    pub elapsed: Duration,
}

impl CompareProgress {
    /// Create initial progress state.
    pub fn new() -> Self {
        Self {
            phase: ComparePhase::Walk,
            entries_processed: 0,
            dirs_walked: 0,
            files_queued: 0,
            current_path: PathBuf::new(),
            errors_count: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Processing rate in entries per second.
    pub fn entries_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.entries_processed as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }
}

impl Default for CompareProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Progress counters with timing, published every `PUBLISH_EVERY` entries.
#[derive(Debug)]
pub struct ProgressTracker {
    tx: Option<broadcast::Sender<CompareProgress>>,
    start_time: Instant,
    phase: ComparePhase,
    entries_processed: u64,
    dirs_walked: u64,
    files_queued: u64,
    errors_count: u64,
    current_path: PathBuf,
}

impl ProgressTracker {
    const PUBLISH_EVERY: u64 = 1000;

    /// Create a tracker; without a sender, nothing is published.
    pub fn new(tx: Option<broadcast::Sender<CompareProgress>>) -> Self {
        Self {
            tx,
            start_time: Instant::now(),
            phase: ComparePhase::Walk,
            entries_processed: 0,
            dirs_walked: 0,
            files_queued: 0,
            errors_count: 0,
            current_path: PathBuf::new(),
        }
    }

    /// Switch phase and restart the entry counter.
    pub fn set_phase(&mut self, phase: ComparePhase) {
        self.phase = phase;
        self.entries_processed = 0;
        self.publish();
    }

    pub fn record_entry(&mut self, path: PathBuf) {
        self.entries_processed += 1;
        self.current_path = path;
        if self.entries_processed % Self::PUBLISH_EVERY == 0 {
            self.publish();
        }
    }

    pub fn record_dir(&mut self) {
        self.dirs_walked += 1;
    }

    pub fn record_queued(&mut self) {
        self.files_queued += 1;
    }

    pub fn record_error(&mut self) {
        self.errors_count += 1;
    }

    pub fn snapshot(&self) -> CompareProgress {
        CompareProgress {
            phase: self.phase,
            entries_processed: self.entries_processed,
            dirs_walked: self.dirs_walked,
            files_queued: self.files_queued,
            current_path: self.current_path.clone(),
            errors_count: self.errors_count,
            elapsed: self.start_time.elapsed(),
        }
    }

    /// Send the current state to subscribers, if any.
    pub fn publish(&self) {
        if let Some(tx) = &self.tx {
            // No receivers is fine
            let _ = tx.send(self.snapshot());
        }
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new(None)
    }
}
