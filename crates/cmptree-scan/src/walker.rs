//! Structural traversal of the reference tree against the candidate tree.
//!
//! The walk is depth-first pre-order over the reference tree with names
//! sorted. Each directory level is reduced twice, once for its
//! subdirectories and once for everything else. The reduction reports
//! discrepancies, queues matching file pairs for content comparison and
//! returns the subdirectories that matched on both sides; only those are
//! descended into.

use std::collections::BTreeSet;
use std::ffi::{OsStr, OsString};
use std::path::{Component, Path, PathBuf};

use cmptree_core::{
    CompareError, EntryKind, ErrorKind, ProbeError, ReportEvent, ReportSink, Reporter, Side,
};
use indexmap::IndexSet;
use tokio::sync::broadcast;

use crate::classify::{Disposition, EntryPair, classify};
use crate::matcher::ExclusionMatcher;
use crate::probe::{self, Listing};
use crate::progress::{CompareProgress, ProgressTracker};

/// Matching regular files queued for content comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePair {
    pub reference: PathBuf,
    pub candidate: PathBuf,
    /// Path relative to both roots.
    pub rel: PathBuf,
}

/// Phase-one walker over a pair of trees.
#[derive(Debug)]
pub struct TreeWalker {
    reference: PathBuf,
    candidate: PathBuf,
    matcher: ExclusionMatcher,
    structure_only: bool,
    ignore_missing_in_reference: bool,
    progress: ProgressTracker,
}

impl TreeWalker {
    /// Create a walker for two existing directory roots.
    pub fn new(
        reference: impl Into<PathBuf>,
        candidate: impl Into<PathBuf>,
        matcher: ExclusionMatcher,
    ) -> Self {
        Self {
            reference: reference.into(),
            candidate: candidate.into(),
            matcher,
            structure_only: false,
            ignore_missing_in_reference: false,
            progress: ProgressTracker::default(),
        }
    }

    /// Report matching files as ok instead of queueing them.
    pub fn structure_only(mut self, enabled: bool) -> Self {
        self.structure_only = enabled;
        self
    }

    /// Do not report entries that exist only in the candidate tree.
    pub fn ignore_missing_in_reference(mut self, enabled: bool) -> Self {
        self.ignore_missing_in_reference = enabled;
        self
    }

    /// Publish progress on the given channel.
    pub fn with_progress(mut self, tx: broadcast::Sender<CompareProgress>) -> Self {
        self.progress = ProgressTracker::new(Some(tx));
        self
    }

    pub fn matcher(&self) -> &ExclusionMatcher {
        &self.matcher
    }

    pub fn progress_mut(&mut self) -> &mut ProgressTracker {
        &mut self.progress
    }

    /// Walk both trees from their roots.
    pub fn walk<S: ReportSink>(
        &mut self,
        reporter: &mut Reporter<S>,
    ) -> Result<Vec<FilePair>, CompareError> {
        let mut worklist = Vec::new();
        self.walk_from(PathBuf::new(), reporter, &mut worklist)?;
        self.progress.publish();
        Ok(worklist)
    }

    /// Compare only the listed entries, given relative to both roots.
    ///
    /// Listed directories that match are walked completely.
    pub fn walk_listed<S: ReportSink>(
        &mut self,
        entries: &[PathBuf],
        reporter: &mut Reporter<S>,
    ) -> Result<Vec<FilePair>, CompareError> {
        let mut worklist = Vec::new();
        for rel in entries {
            self.compare_listed(rel, reporter, &mut worklist)?;
        }
        self.progress.publish();
        Ok(worklist)
    }

    fn walk_from<S: ReportSink>(
        &mut self,
        start: PathBuf,
        reporter: &mut Reporter<S>,
        worklist: &mut Vec<FilePair>,
    ) -> Result<(), CompareError> {
        let mut stack = vec![start];
        while let Some(rel) = stack.pop() {
            let retained = self.compare_level(&rel, reporter, worklist)?;
            // Reverse push keeps sorted pre-order
            stack.extend(retained.iter().rev().map(|name| rel.join(name)));
        }
        Ok(())
    }

    /// Compare one directory level; returns the subdirectories to descend into.
    fn compare_level<S: ReportSink>(
        &mut self,
        rel: &Path,
        reporter: &mut Reporter<S>,
        worklist: &mut Vec<FilePair>,
    ) -> Result<BTreeSet<OsString>, CompareError> {
        let ref_dir = resolve(&self.reference, rel);
        let cand_dir = resolve(&self.candidate, rel);

        let ref_listing = match probe::list_dir(&ref_dir) {
            Ok(listing) => listing,
            Err(err) => {
                self.listing_failed(&err, rel, reporter)?;
                return Ok(BTreeSet::new());
            }
        };

        match probe::entry_kind(&cand_dir) {
            Ok(Some(EntryKind::Directory)) => {}
            Ok(None) => {
                let event = ReportEvent::error(
                    ErrorKind::NotExistInCandidate,
                    EntryKind::Directory,
                    &ref_dir,
                    rel,
                );
                self.emit(reporter, event)?;
                return Ok(BTreeSet::new());
            }
            Ok(Some(kind)) => {
                let mut event =
                    ReportEvent::error(ErrorKind::TypeMismatch, EntryKind::Directory, &cand_dir, rel);
                if kind == EntryKind::Symlink {
                    event = event.with_comment("FS2 entry is symlink");
                }
                self.emit(reporter, event)?;
                return Ok(BTreeSet::new());
            }
            Err(err) => {
                self.listing_failed(&err, rel, reporter)?;
                return Ok(BTreeSet::new());
            }
        }

        let mut candidates = match probe::list_dir(&cand_dir) {
            Ok(listing) => listing,
            Err(err) => {
                self.listing_failed(&err, rel, reporter)?;
                return Ok(BTreeSet::new());
            }
        };

        self.progress.record_dir();
        reporter.summary_mut().dirs_walked += 1;

        let retained = self.reduce(
            rel,
            &ref_listing.subdirs,
            &mut candidates,
            EntryKind::Directory,
            reporter,
            worklist,
        )?;
        self.reduce(
            rel,
            &ref_listing.files,
            &mut candidates,
            EntryKind::File,
            reporter,
            worklist,
        )?;
        self.report_extras(rel, candidates, reporter)?;
        Ok(retained)
    }

    /// Reduce one half of a reference level against the candidate level.
    ///
    /// Every reference name is classified and taken out of `candidates`;
    /// names left over once both halves are reduced exist only in the
    /// candidate tree.
    fn reduce<S: ReportSink>(
        &mut self,
        rel_dir: &Path,
        snapshot: &BTreeSet<OsString>,
        candidates: &mut Listing,
        kind: EntryKind,
        reporter: &mut Reporter<S>,
        worklist: &mut Vec<FilePair>,
    ) -> Result<BTreeSet<OsString>, CompareError> {
        let mut retained = BTreeSet::new();

        for name in snapshot {
            let rel = rel_dir.join(name);
            let pair = EntryPair::new(self.reference.join(&rel), self.candidate.join(&rel));
            let in_candidate = take_candidate(candidates, kind, name, &pair);

            if self.matcher.is_excluded_rel(&rel, Side::Reference) {
                continue;
            }

            self.progress.record_entry(pair.reference.clone());

            let matcher = &mut self.matcher;
            let disposition = classify(&pair, kind, in_candidate, || {
                matcher.is_excluded_rel(&rel, Side::Candidate)
            });

            match disposition {
                Ok(Disposition::Skip) => {}
                Ok(Disposition::Matched(matched)) => {
                    self.emit(reporter, ReportEvent::ok(matched, &pair.reference, &rel))?;
                }
                Ok(Disposition::Descend) => {
                    let event = ReportEvent::ok(EntryKind::Directory, &pair.reference, &rel);
                    self.emit(reporter, event)?;
                    retained.insert(name.clone());
                }
                Ok(Disposition::CompareContent) if self.structure_only => {
                    self.emit(reporter, ReportEvent::ok(EntryKind::File, &pair.reference, &rel))?;
                }
                Ok(Disposition::CompareContent) => {
                    self.progress.record_queued();
                    worklist.push(FilePair {
                        reference: pair.reference,
                        candidate: pair.candidate,
                        rel,
                    });
                }
                Ok(Disposition::Mismatch {
                    error,
                    kind: reported,
                    side,
                    comment,
                }) => {
                    let event = ReportEvent::error(error, reported, pair.on(side), &rel)
                        .with_comment(comment.unwrap_or_default());
                    self.emit(reporter, event)?;
                }
                Err(err) => {
                    tracing::debug!(path = %err.path().display(), "Probe failed: {err}");
                    let candidate = probe::entry_kind(&pair.candidate);
                    let event = access_failure(&pair, &rel, kind, &err, &candidate);
                    self.emit(reporter, event)?;
                }
            }
        }

        Ok(retained)
    }

    /// Report the names of a level that exist only in the candidate tree.
    fn report_extras<S: ReportSink>(
        &mut self,
        rel_dir: &Path,
        extras: Listing,
        reporter: &mut Reporter<S>,
    ) -> Result<(), CompareError> {
        if self.ignore_missing_in_reference {
            return Ok(());
        }
        let Listing { subdirs, files } = extras;
        for (kind, names) in [(EntryKind::Directory, subdirs), (EntryKind::File, files)] {
            for name in names {
                let rel = rel_dir.join(&name);
                if self.matcher.is_excluded_rel(&rel, Side::Candidate) {
                    continue;
                }
                let path = self.candidate.join(&rel);
                self.progress.record_entry(path.clone());
                let event = ReportEvent::error(ErrorKind::NotExistInReference, kind, path, rel);
                self.emit(reporter, event)?;
            }
        }
        Ok(())
    }

    fn compare_listed<S: ReportSink>(
        &mut self,
        rel: &Path,
        reporter: &mut Reporter<S>,
        worklist: &mut Vec<FilePair>,
    ) -> Result<(), CompareError> {
        let (Some(parent), Some(name)) = (rel.parent(), rel.file_name()) else {
            // The tree top itself
            return self.walk_from(rel.to_path_buf(), reporter, worklist);
        };

        let ref_path = self.reference.join(rel);
        let cand_path = self.candidate.join(rel);

        match probe::entry_kind(&ref_path) {
            Ok(Some(_)) => {}
            Ok(None) => {
                let kind = match probe::entry_kind(&cand_path) {
                    Ok(Some(_)) if probe::is_dir_following(&cand_path) => EntryKind::Directory,
                    Ok(Some(_)) => EntryKind::File,
                    _ => EntryKind::Unknown,
                };
                let event = ReportEvent::error(ErrorKind::NotExistInReference, kind, cand_path, rel)
                    .with_comment("listed entry");
                return self.emit(reporter, event);
            }
            Err(err) => {
                let event = ReportEvent::error(ErrorKind::NoAccess, EntryKind::Unknown, ref_path, rel)
                    .with_comment(err.comment());
                return self.emit(reporter, event);
            }
        }

        let kind = if probe::is_dir_following(&ref_path) {
            EntryKind::Directory
        } else {
            EntryKind::File
        };
        let cand_kind = match probe::entry_kind(&cand_path) {
            Ok(None) => None,
            Ok(Some(_)) if probe::is_dir_following(&cand_path) => Some(EntryKind::Directory),
            Ok(Some(_)) => Some(EntryKind::File),
            // Let classification surface the failure
            Err(_) => Some(kind),
        };

        let name = name.to_os_string();
        let snapshot = BTreeSet::from([name.clone()]);
        let mut candidates = Listing::default();
        match cand_kind {
            Some(EntryKind::Directory) => {
                candidates.subdirs.insert(name.clone());
            }
            Some(_) => {
                candidates.files.insert(name.clone());
            }
            None => {}
        }

        let retained = self.reduce(parent, &snapshot, &mut candidates, kind, reporter, worklist)?;
        self.report_extras(parent, candidates, reporter)?;
        if retained.contains(&name) {
            self.walk_from(rel.to_path_buf(), reporter, worklist)?;
        }
        Ok(())
    }

    /// Report a directory that could not be listed on one side.
    fn listing_failed<S: ReportSink>(
        &mut self,
        err: &ProbeError,
        rel: &Path,
        reporter: &mut Reporter<S>,
    ) -> Result<(), CompareError> {
        tracing::debug!(path = %err.path().display(), "Cannot list directory: {err}");
        let kind = if probe::is_dir_following(err.path()) {
            EntryKind::Directory
        } else {
            EntryKind::Unknown
        };
        let event = ReportEvent::error(ErrorKind::NoAccess, kind, err.path(), rel)
            .with_comment(err.comment());
        self.emit(reporter, event)
    }

    fn emit<S: ReportSink>(
        &mut self,
        reporter: &mut Reporter<S>,
        event: ReportEvent,
    ) -> Result<(), CompareError> {
        if event.is_error() {
            self.progress.record_error();
        }
        reporter.emit(event)
    }
}

/// Take `name` out of the candidate level.
///
/// A name the two sides list under different kinds still counts as present
/// when either entry is a symlink; a real directory facing a real file does
/// not.
fn take_candidate(
    candidates: &mut Listing,
    kind: EntryKind,
    name: &OsStr,
    pair: &EntryPair,
) -> bool {
    if candidates.take(kind, name) {
        return true;
    }
    if !candidates.holds_crossed(kind, name) {
        return false;
    }
    let is_symlink = |path: &Path| matches!(probe::entry_kind(path), Ok(Some(EntryKind::Symlink)));
    if is_symlink(&pair.reference) || is_symlink(&pair.candidate) {
        candidates.take_crossed(kind, name)
    } else {
        false
    }
}

/// Single NoAccess report for an entry whose classification failed.
///
/// `candidate` is the outcome of probing the candidate entry; it picks the
/// comment when the reference entry was denied.
fn access_failure(
    pair: &EntryPair,
    rel: &Path,
    kind: EntryKind,
    err: &ProbeError,
    candidate: &Result<Option<EntryKind>, ProbeError>,
) -> ReportEvent {
    let (path, comment) = match err {
        ProbeError::AccessDenied { path } if *path == pair.reference => {
            let comment = match candidate {
                Err(other) if other.is_access_denied() => "entry not accessible in FS1 and FS2",
                _ => "FS1 entry not accessible",
            };
            (pair.reference.as_path(), comment.to_string())
        }
        ProbeError::AccessDenied { .. } => {
            (pair.candidate.as_path(), "FS2 entry not accessible".to_string())
        }
        ProbeError::Unexpected { path, .. } => (path.as_path(), err.comment()),
    };
    ReportEvent::error(ErrorKind::NoAccess, kind, path, rel).with_comment(comment)
}

fn resolve(root: &Path, rel: &Path) -> PathBuf {
    if rel.as_os_str().is_empty() {
        root.to_path_buf()
    } else {
        root.join(rel)
    }
}

/// Parse a traverse list: one path per line relative to the tree tops.
///
/// Blank lines and `#` comments are skipped, a leading `./` or `/` is
/// ignored, and duplicates keep their first position.
pub fn parse_traverse_list(text: &str) -> Vec<PathBuf> {
    let mut entries = IndexSet::new();
    for line in text.lines() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let rel: PathBuf = Path::new(line)
            .components()
            .filter(|c| matches!(c, Component::Normal(_)))
            .collect();
        entries.insert(rel);
    }
    entries.into_iter().collect()
}
