//! Run orchestration: structural walk, then content comparison.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tokio::sync::broadcast;

use cmptree_core::{
    CompareConfig, CompareError, CompareSummary, EntryKind, ErrorKind, ReportEvent, ReportSink,
    Reporter,
};
use cmptree_scan::{
    ComparePhase, CompareProgress, ExclusionMatcher, FilePair, TreeWalker, parse_traverse_list,
};

use crate::content::{ContentComparer, ContentOutcome};

/// File pairs handed to the worker pool at once.
const BATCH_SIZE: usize = 256;

/// One comparison run over a pair of trees.
///
/// Consumed by [`TreeComparer::run`], so every run starts from fresh
/// exclusion and result state.
#[derive(Debug)]
pub struct TreeComparer {
    config: CompareConfig,
    reference: PathBuf,
    candidate: PathBuf,
    matcher: ExclusionMatcher,
    progress_tx: broadcast::Sender<CompareProgress>,
}

impl TreeComparer {
    /// Validate the configuration and prepare a run.
    ///
    /// Both roots must be existing directories and every exclusion pattern
    /// must compile.
    pub fn new(config: CompareConfig) -> Result<Self, CompareError> {
        let reference = validate_root(&config.reference)?;
        let candidate = validate_root(&config.candidate)?;
        let matcher = ExclusionMatcher::new(
            &reference,
            &candidate,
            &config.exclude_patterns,
            config.relative_fs_top,
        )?;
        let (progress_tx, _) = broadcast::channel(100);

        Ok(Self {
            config,
            reference,
            candidate,
            matcher,
            progress_tx,
        })
    }

    /// Subscribe to progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<CompareProgress> {
        self.progress_tx.subscribe()
    }

    pub fn config(&self) -> &CompareConfig {
        &self.config
    }

    /// Canonical reference root.
    pub fn reference(&self) -> &Path {
        &self.reference
    }

    /// Canonical candidate root.
    pub fn candidate(&self) -> &Path {
        &self.candidate
    }

    /// Compare the trees, reporting into `sink`.
    ///
    /// Returns the sink together with the run summary. Discrepancies never
    /// fail the run; only configuration and sink errors do.
    pub fn run<S: ReportSink>(self, sink: S) -> Result<(S, CompareSummary), CompareError> {
        let start = Instant::now();
        let Self {
            config,
            reference,
            candidate,
            matcher,
            progress_tx,
        } = self;

        let mut reporter = Reporter::new(sink, config.report_identical);
        let mut walker = TreeWalker::new(&reference, &candidate, matcher)
            .structure_only(config.structure_only)
            .ignore_missing_in_reference(config.ignore_missing_in_reference)
            .with_progress(progress_tx);

        tracing::debug!(
            reference = %reference.display(),
            candidate = %candidate.display(),
            "Phase 1: comparing tree structure"
        );
        let worklist = match &config.traverse_list {
            Some(list) => {
                let text = fs::read_to_string(list).map_err(|source| {
                    CompareError::TraverseList {
                        path: list.clone(),
                        source,
                    }
                })?;
                let entries = parse_traverse_list(&text);
                tracing::debug!(entries = entries.len(), "Traversing listed entries only");
                walker.walk_listed(&entries, &mut reporter)?
            }
            None => walker.walk(&mut reporter)?,
        };
        tracing::debug!(
            used = ?walker.matcher().used_patterns(),
            "Exclusion patterns used"
        );

        if !worklist.is_empty() {
            tracing::debug!(files = worklist.len(), "Phase 2: comparing file content");
            compare_content(&config, &worklist, &mut walker, &mut reporter)?;
        }

        let (sink, mut summary) = reporter.into_parts();
        summary.duration = start.elapsed();
        tracing::info!(
            ok = summary.is_ok(),
            errors = summary.total_errors(),
            dirs = summary.dirs_walked,
            files = summary.files_compared,
            "Comparison finished in {:.2?}",
            summary.duration
        );
        Ok((sink, summary))
    }
}

fn compare_content<S: ReportSink>(
    config: &CompareConfig,
    worklist: &[FilePair],
    walker: &mut TreeWalker,
    reporter: &mut Reporter<S>,
) -> Result<(), CompareError> {
    let pool = match config.jobs {
        1 => None,
        jobs => Some(
            rayon::ThreadPoolBuilder::new()
                .num_threads(jobs)
                .build()
                .map_err(|e| CompareError::Config {
                    message: format!("cannot start worker pool: {e}"),
                })?,
        ),
    };
    let comparer = ContentComparer::new(config.shallow);
    walker.progress_mut().set_phase(ComparePhase::Content);

    for batch in worklist.chunks(BATCH_SIZE) {
        let results = comparer.compare_batch(batch, pool.as_ref());

        for (pair, result) in batch.iter().zip(results) {
            let summary = reporter.summary_mut();
            summary.files_compared += 1;
            summary.bytes_compared += result.bytes_read;

            let event = match result.outcome {
                ContentOutcome::Same => ReportEvent::ok(EntryKind::File, &pair.reference, &pair.rel),
                ContentOutcome::Differs => ReportEvent::error(
                    ErrorKind::ContentDiffers,
                    EntryKind::File,
                    &pair.reference,
                    &pair.rel,
                ),
                ContentOutcome::NoAccess(comment) => {
                    ReportEvent::error(ErrorKind::NoAccess, EntryKind::File, &pair.reference, &pair.rel)
                        .with_comment(comment)
                }
            };

            let progress = walker.progress_mut();
            if event.is_error() {
                progress.record_error();
            }
            progress.record_entry(pair.reference.clone());
            reporter.emit(event)?;
        }
    }

    walker.progress_mut().publish();
    Ok(())
}

/// Canonicalize a tree root, requiring an existing directory.
fn validate_root(root: &Path) -> Result<PathBuf, CompareError> {
    let path = root.canonicalize().map_err(|e| CompareError::InvalidRoot {
        path: root.to_path_buf(),
        reason: e.to_string(),
    })?;
    if !path.is_dir() {
        return Err(CompareError::InvalidRoot {
            path: root.to_path_buf(),
            reason: "not a directory".to_string(),
        });
    }
    Ok(path)
}
