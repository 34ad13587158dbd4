use cmptree_core::{ErrorKind, MemorySink, Reporter};
use cmptree_scan::{ExclusionMatcher, FilePair, TreeWalker};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Two identical trees under `<temp>/a` and `<temp>/b`.
fn create_tree_pair() -> TempDir {
    let temp = TempDir::new().unwrap();
    for side in ["a", "b"] {
        let root = temp.path().join(side);
        fs::create_dir_all(root.join("docs/2024")).unwrap();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("README"), "readme").unwrap();
        fs::write(root.join("docs/index.md"), "# index").unwrap();
        fs::write(root.join("docs/2024/report.md"), "report").unwrap();
        fs::write(root.join("src/main.c"), "int main() {}").unwrap();
    }
    temp
}

fn walk_with(
    reference: &Path,
    candidate: &Path,
    patterns: &[&str],
    structure_only: bool,
) -> (Vec<FilePair>, MemorySink, bool) {
    let patterns: Vec<String> = patterns.iter().map(|p| p.to_string()).collect();
    let matcher = ExclusionMatcher::new(reference, candidate, &patterns, false).unwrap();
    let mut walker = TreeWalker::new(reference, candidate, matcher).structure_only(structure_only);
    let mut reporter = Reporter::new(MemorySink::new(), true);
    let worklist = walker.walk(&mut reporter).unwrap();
    let (sink, summary) = reporter.into_parts();
    (worklist, sink, summary.is_ok())
}

/// Walk in both directions and return error counts keyed by kind.
fn error_counts_both_ways(temp: &TempDir) -> (Vec<(ErrorKind, usize)>, Vec<(ErrorKind, usize)>) {
    let a = temp.path().join("a");
    let b = temp.path().join("b");
    let counts = |sink: &MemorySink| {
        [
            ErrorKind::NotExistInReference,
            ErrorKind::NotExistInCandidate,
            ErrorKind::ContentDiffers,
            ErrorKind::TypeMismatch,
            ErrorKind::NoAccess,
        ]
        .into_iter()
        .map(|kind| (kind, sink.count(kind)))
        .collect::<Vec<_>>()
    };
    let (_, forward, _) = walk_with(&a, &b, &[], false);
    let (_, backward, _) = walk_with(&b, &a, &[], false);
    (counts(&forward), counts(&backward))
}

fn assert_symmetric(temp: &TempDir) {
    let (forward, backward) = error_counts_both_ways(temp);
    let mirrored: Vec<_> = backward
        .into_iter()
        .map(|(kind, count)| (kind.mirrored(), count))
        .collect();
    for (kind, count) in &forward {
        let other = mirrored.iter().find(|(k, _)| k == kind).map(|(_, c)| *c);
        assert_eq!(Some(*count), other, "asymmetric count for {kind:?}");
    }
}

#[test]
fn test_identical_trees() {
    let temp = create_tree_pair();
    let (worklist, sink, ok) = walk_with(&temp.path().join("a"), &temp.path().join("b"), &[], false);

    assert!(ok);
    assert_eq!(sink.errors().count(), 0);
    assert_eq!(worklist.len(), 4);
    for pair in &worklist {
        assert_eq!(pair.reference, temp.path().join("a").join(&pair.rel));
        assert_eq!(pair.candidate, temp.path().join("b").join(&pair.rel));
    }
}

#[test]
fn test_missing_directory_reported_once() {
    let temp = create_tree_pair();
    fs::remove_dir_all(temp.path().join("b/docs/2024")).unwrap();

    let (worklist, sink, ok) = walk_with(&temp.path().join("a"), &temp.path().join("b"), &[], false);
    assert!(!ok);
    assert_eq!(sink.errors().count(), 1);
    assert_eq!(sink.count(ErrorKind::NotExistInCandidate), 1);
    // Nothing below the missing directory is reported or queued
    assert!(worklist.iter().all(|p| !p.rel.starts_with("docs/2024")));
    assert_symmetric(&temp);
}

#[test]
fn test_structure_only_never_queues() {
    let temp = create_tree_pair();
    fs::write(temp.path().join("b/src/main.c"), "int main() { return 1; }").unwrap();

    let (worklist, sink, ok) = walk_with(&temp.path().join("a"), &temp.path().join("b"), &[], true);
    assert!(ok);
    assert!(worklist.is_empty());
    assert_eq!(sink.errors().count(), 0);
    // 3 directories, 4 files
    assert_eq!(sink.oks().count(), 7);
}

#[test]
fn test_exclusion_blocks_reports_and_descent() {
    let temp = create_tree_pair();
    fs::remove_file(temp.path().join("b/docs/2024/report.md")).unwrap();
    fs::write(temp.path().join("b/docs/._index.md"), "resource fork").unwrap();

    let a = temp.path().join("a");
    let b = temp.path().join("b");
    let (worklist, sink, ok) = walk_with(&a, &b, &["2024", "._*"], false);

    assert!(ok);
    assert!(sink.events.iter().all(|e| !e.rel().starts_with("docs/2024")));
    assert!(sink.events.iter().all(|e| !e.path().ends_with("._index.md")));
    assert!(worklist.iter().all(|p| !p.rel.starts_with("docs/2024")));
}

#[test]
fn test_anchored_pattern_only_at_top() {
    let temp = create_tree_pair();
    fs::remove_file(temp.path().join("b/README")).unwrap();
    fs::create_dir(temp.path().join("a/src/README")).unwrap();

    let a = temp.path().join("a");
    let b = temp.path().join("b");
    let (_, sink, ok) = walk_with(&a, &b, &["/README"], false);

    // The top-level README is excluded, the nested one is not
    assert!(!ok);
    assert_eq!(sink.errors().count(), 1);
    let event = sink.errors().next().unwrap();
    assert_eq!(event.rel(), Path::new("src/README"));
}

#[test]
fn test_recursion_gating() {
    let temp = create_tree_pair();
    // Replace a directory by a file of the same name on the candidate side
    fs::remove_dir_all(temp.path().join("b/src")).unwrap();
    fs::write(temp.path().join("b/src"), "file").unwrap();

    let (worklist, sink, _) = walk_with(&temp.path().join("a"), &temp.path().join("b"), &[], false);
    assert!(sink.events.iter().all(|e| !e.rel().starts_with("src/")));
    assert!(worklist.iter().all(|p| !p.rel.starts_with("src")));
    assert_symmetric(&temp);
}

#[test]
fn test_idempotent() {
    let temp = create_tree_pair();
    fs::write(temp.path().join("b/extra"), "x").unwrap();
    fs::remove_file(temp.path().join("b/docs/index.md")).unwrap();

    let a = temp.path().join("a");
    let b = temp.path().join("b");
    let (first_list, first, _) = walk_with(&a, &b, &[], false);
    let (second_list, second, _) = walk_with(&a, &b, &[], false);
    assert_eq!(first.events, second.events);
    assert_eq!(first_list, second_list);
}

#[cfg(unix)]
#[test]
fn test_directory_symlinks() {
    use std::os::unix::fs::symlink;

    let temp = create_tree_pair();
    symlink("docs", temp.path().join("a/docs-link")).unwrap();
    symlink("docs", temp.path().join("b/docs-link")).unwrap();

    let a = temp.path().join("a");
    let b = temp.path().join("b");
    let (worklist, sink, ok) = walk_with(&a, &b, &[], false);
    assert!(ok);
    // Symlinked directories are compared by target, never followed
    assert!(worklist.iter().all(|p| !p.rel.starts_with("docs-link")));
    assert!(sink.oks().any(|e| e.rel() == Path::new("docs-link")));

    fs::remove_file(temp.path().join("b/docs-link")).unwrap();
    symlink("src", temp.path().join("b/docs-link")).unwrap();
    let (_, sink, ok) = walk_with(&a, &b, &[], false);
    assert!(!ok);
    assert_eq!(sink.count(ErrorKind::ContentDiffers), 1);
    assert_eq!(
        sink.error_lines(false)[0],
        format!("Error: Symlink target is different | {}", a.join("docs-link").display())
    );
    assert_symmetric(&temp);
}

#[cfg(unix)]
#[test]
fn test_candidate_symlink_replacing_file() {
    use std::os::unix::fs::symlink;

    let temp = create_tree_pair();
    fs::remove_file(temp.path().join("b/README")).unwrap();
    symlink("docs/index.md", temp.path().join("b/README")).unwrap();

    let a = temp.path().join("a");
    let b = temp.path().join("b");
    let (worklist, sink, ok) = walk_with(&a, &b, &[], false);
    assert!(!ok);
    assert_eq!(sink.errors().count(), 1);
    assert_eq!(sink.count(ErrorKind::TypeMismatch), 1);
    let event = sink.errors().next().unwrap();
    assert_eq!(event.path(), b.join("README"));
    assert_eq!(event.comment(), Some("FS2 entry is symlink"));
    assert!(worklist.iter().all(|p| p.rel != PathBuf::from("README")));
    assert_symmetric(&temp);
}

#[cfg(unix)]
#[test]
fn test_unreadable_directory_single_report() {
    use std::os::unix::fs::PermissionsExt;

    let temp = create_tree_pair();
    let locked_a = temp.path().join("a/docs/2024");
    let locked_b = temp.path().join("b/docs/2024");
    fs::set_permissions(&locked_a, fs::Permissions::from_mode(0o000)).unwrap();
    fs::set_permissions(&locked_b, fs::Permissions::from_mode(0o000)).unwrap();

    // Privileged users bypass file modes
    let bypassed = fs::read_dir(&locked_a).is_ok();
    let result = (!bypassed)
        .then(|| walk_with(&temp.path().join("a"), &temp.path().join("b"), &[], false));

    fs::set_permissions(&locked_a, fs::Permissions::from_mode(0o755)).unwrap();
    fs::set_permissions(&locked_b, fs::Permissions::from_mode(0o755)).unwrap();

    let Some((_, sink, ok)) = result else {
        return;
    };
    assert!(!ok);
    assert_eq!(sink.errors().count(), 1);
    let event = sink.errors().next().unwrap();
    assert_eq!(event.error_kind(), Some(ErrorKind::NoAccess));
    assert_eq!(event.path(), locked_a);
    assert!(event.comment().unwrap().starts_with("PermissionError as user "));
}
