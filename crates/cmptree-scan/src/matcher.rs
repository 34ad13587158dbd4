//! Exclusion pattern matching.
//!
//! Every pattern is matched against the path of an entry measured from the
//! root of the tree it lives in, written with a leading `/`
//! (`/Library/Caches`). A pattern starting with `/` is anchored and only
//! matches from the root; any other pattern matches at any depth. Wildcards
//! follow shell conventions: `*` also crosses `/`, `?`, `[...]` and `[!...]`
//! are supported, and backslashes are literal.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use cmptree_core::{CompareError, Side};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use indexmap::IndexSet;

/// Compiled exclusion patterns for both trees of a run.
#[derive(Debug)]
pub struct ExclusionMatcher {
    reference: PathBuf,
    candidate: PathBuf,
    patterns: Vec<String>,
    set: GlobSet,
    /// Indices of patterns that matched at least once, in first-use order.
    used: IndexSet<usize>,
}

impl ExclusionMatcher {
    /// Compile `patterns` for the given tree roots.
    ///
    /// With `relative_fs_top`, anchored patterns match at any depth like
    /// unanchored ones.
    pub fn new(
        reference: impl Into<PathBuf>,
        candidate: impl Into<PathBuf>,
        patterns: &[String],
        relative_fs_top: bool,
    ) -> Result<Self, CompareError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = GlobBuilder::new(&match_expression(pattern, relative_fs_top))
                .literal_separator(false)
                .backslash_escape(false)
                .build()
                .map_err(|e| CompareError::Pattern {
                    pattern: pattern.clone(),
                    message: e.kind().to_string(),
                })?;
            builder.add(glob);
        }
        let set = builder.build().map_err(|e| CompareError::Pattern {
            pattern: e.glob().unwrap_or_default().to_string(),
            message: e.kind().to_string(),
        })?;

        Ok(Self {
            reference: reference.into(),
            candidate: candidate.into(),
            patterns: patterns.to_vec(),
            set,
            used: IndexSet::new(),
        })
    }

    /// Whether `path`, located under the root of `side`, is excluded.
    ///
    /// Paths outside that root are never excluded.
    pub fn is_excluded(&mut self, path: &Path, side: Side) -> bool {
        let root = match side {
            Side::Reference => &self.reference,
            Side::Candidate => &self.candidate,
        };
        match path.strip_prefix(root) {
            Ok(rel) => self.is_excluded_rel(rel, side),
            Err(_) => false,
        }
    }

    /// Whether the root-relative path `rel` is excluded on `side`.
    pub fn is_excluded_rel(&mut self, rel: &Path, side: Side) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        let mut from_top = OsString::from("/");
        from_top.push(rel.as_os_str());

        let Some(first) = self.set.matches(&from_top).into_iter().min() else {
            return false;
        };
        if self.used.insert(first) {
            tracing::debug!(
                pattern = %self.patterns[first],
                side = %side,
                "Pattern '{}' used (1st time for '{}')",
                self.patterns[first],
                Path::new(&from_top).display()
            );
        }
        true
    }

    /// Patterns that excluded at least one entry, in order of first use.
    pub fn used_patterns(&self) -> Vec<&str> {
        self.used.iter().map(|&i| self.patterns[i].as_str()).collect()
    }

    /// All patterns, in evaluation order.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

/// Glob expression evaluated against `/`-prefixed root-relative paths.
fn match_expression(pattern: &str, relative_fs_top: bool) -> String {
    match pattern.strip_prefix('/') {
        Some(body) if !relative_fs_top => format!("/{body}"),
        Some(body) => format!("*/{body}"),
        None => format!("*/{pattern}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(patterns: &[&str], relative_fs_top: bool) -> ExclusionMatcher {
        let patterns: Vec<String> = patterns.iter().map(|p| p.to_string()).collect();
        ExclusionMatcher::new("/fs1", "/fs2", &patterns, relative_fs_top).unwrap()
    }

    #[test]
    fn test_match_expression() {
        assert_eq!(match_expression("/.journal", false), "/.journal");
        assert_eq!(match_expression("/.journal", true), "*/.journal");
        assert_eq!(match_expression(".Trashes", false), "*/.Trashes");
    }

    #[test]
    fn test_anchored_matches_only_at_top() {
        let mut m = matcher(&["/.fseventsd"], false);
        assert!(m.is_excluded(Path::new("/fs1/.fseventsd"), Side::Reference));
        assert!(!m.is_excluded(Path::new("/fs1/nested/.fseventsd"), Side::Reference));
        assert!(m.is_excluded(Path::new("/fs2/.fseventsd"), Side::Candidate));
    }

    #[test]
    fn test_anchored_relaxed_matches_anywhere() {
        let mut m = matcher(&["/.fseventsd"], true);
        assert!(m.is_excluded(Path::new("/fs1/.fseventsd"), Side::Reference));
        assert!(m.is_excluded(Path::new("/fs1/nested/.fseventsd"), Side::Reference));
    }

    #[test]
    fn test_unanchored_matches_suffix_at_any_depth() {
        let mut m = matcher(&[".Trashes", "Library/Caches"], false);
        assert!(m.is_excluded_rel(Path::new(".Trashes"), Side::Reference));
        assert!(m.is_excluded_rel(Path::new("a/b/.Trashes"), Side::Reference));
        assert!(!m.is_excluded_rel(Path::new("a/b/.Trashes-not"), Side::Reference));
        assert!(m.is_excluded_rel(Path::new("Users/me/Library/Caches"), Side::Candidate));
        assert!(!m.is_excluded_rel(Path::new("Library"), Side::Candidate));
    }

    #[test]
    fn test_shell_wildcards() {
        let mut m = matcher(&["._*", "/Volumes/*", "file?.[ch]", "/private/var/folders/*/*/C"], false);
        assert!(m.is_excluded_rel(Path::new("dir/._resource"), Side::Reference));
        assert!(m.is_excluded_rel(Path::new("Volumes/Backup"), Side::Reference));
        // `*` crosses directory separators
        assert!(m.is_excluded_rel(Path::new("Volumes/Backup/deep/file"), Side::Reference));
        assert!(!m.is_excluded_rel(Path::new("Volumes"), Side::Reference));
        assert!(m.is_excluded_rel(Path::new("src/file1.c"), Side::Reference));
        assert!(!m.is_excluded_rel(Path::new("src/file1.rs"), Side::Reference));
        assert!(m.is_excluded_rel(Path::new("private/var/folders/xy/abc/C"), Side::Reference));
    }

    #[test]
    fn test_special_characters_are_literal() {
        let mut m = matcher(&["$Recycle.Bin", "/lost+found", ".HFS+ Private Directory Data*"], false);
        assert!(m.is_excluded_rel(Path::new("$Recycle.Bin"), Side::Reference));
        assert!(!m.is_excluded_rel(Path::new("xRecycle.Bin"), Side::Reference));
        assert!(m.is_excluded_rel(Path::new("lost+found"), Side::Reference));
        assert!(m.is_excluded_rel(Path::new(".HFS+ Private Directory Data\r"), Side::Reference));
    }

    #[test]
    fn test_used_patterns_record_first_use_once() {
        let mut m = matcher(&["a", "b", "c"], false);
        assert!(m.is_excluded_rel(Path::new("x/b"), Side::Reference));
        assert!(m.is_excluded_rel(Path::new("y/b"), Side::Candidate));
        assert!(m.is_excluded_rel(Path::new("a"), Side::Reference));
        assert!(!m.is_excluded_rel(Path::new("d"), Side::Reference));
        assert_eq!(m.used_patterns(), vec!["b", "a"]);
    }

    #[test]
    fn test_first_declared_pattern_wins() {
        let mut m = matcher(&["*.log", "debug.log"], false);
        assert!(m.is_excluded_rel(Path::new("debug.log"), Side::Reference));
        assert_eq!(m.used_patterns(), vec!["*.log"]);
    }

    #[test]
    fn test_outside_root_is_not_excluded() {
        let mut m = matcher(&["*"], false);
        assert!(!m.is_excluded(Path::new("/elsewhere/x"), Side::Reference));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = ExclusionMatcher::new("/fs1", "/fs2", &["broken[".to_string()], false).unwrap_err();
        assert!(matches!(err, CompareError::Pattern { ref pattern, .. } if pattern == "broken["));
    }

    #[test]
    fn test_no_patterns() {
        let mut m = matcher(&[], false);
        assert!(!m.is_excluded_rel(Path::new("anything"), Side::Reference));
        assert!(m.patterns().is_empty());
    }
}
