//! Comparison configuration types.

use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::patterns;

/// Configuration for one comparison run.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct CompareConfig {
    /// Root of the reference tree ("FS1").
    pub reference: PathBuf,

    /// Root of the candidate tree ("FS2").
    pub candidate: PathBuf,

    /// Exclusion patterns, in evaluation order.
    #[builder(default)]
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// Compare files by size and modification time only.
    #[builder(default = "false")]
    #[serde(default)]
    pub shallow: bool,

    /// Only validate the tree shape; never read file content.
    #[builder(default = "false")]
    #[serde(default)]
    pub structure_only: bool,

    /// Do not report entries that exist only in the candidate tree.
    #[builder(default = "false")]
    #[serde(default)]
    pub ignore_missing_in_reference: bool,

    /// Let anchored patterns match at any depth (roots that are not disk tops).
    #[builder(default = "false")]
    #[serde(default)]
    pub relative_fs_top: bool,

    /// Report matching entries to the sink as well.
    #[builder(default = "false")]
    #[serde(default)]
    pub report_identical: bool,

    /// Append the root-relative path to report lines.
    #[builder(default = "false")]
    #[serde(default)]
    pub show_relative: bool,

    /// Worker threads for content comparison (0 = auto-detect, 1 = sequential).
    #[builder(default = "0")]
    #[serde(default)]
    pub jobs: usize,

    /// Restrict the comparison to the entries listed in this file.
    #[builder(default, setter(into, strip_option))]
    #[serde(default)]
    pub traverse_list: Option<PathBuf>,
}

impl CompareConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        for (name, root) in [("Reference", &self.reference), ("Candidate", &self.candidate)] {
            match root {
                Some(root) if root.as_os_str().is_empty() => {
                    return Err(format!("{name} root cannot be empty"));
                }
                Some(_) => {}
                None => return Err(format!("{name} root is required")),
            }
        }
        Ok(())
    }

    /// Append the built-in exclusion lists to the configured patterns.
    pub fn standard_exclusions(&mut self, live_fs: bool) -> &mut Self {
        let patterns = self.exclude_patterns.get_or_insert_with(Vec::new);
        patterns.extend(patterns::standard_patterns(live_fs));
        self
    }
}

impl CompareConfig {
    /// Create a new config builder.
    pub fn builder() -> CompareConfigBuilder {
        CompareConfigBuilder::default()
    }

    /// Create a config comparing two roots with no exclusions.
    pub fn new(reference: impl Into<PathBuf>, candidate: impl Into<PathBuf>) -> Self {
        Self {
            reference: reference.into(),
            candidate: candidate.into(),
            exclude_patterns: Vec::new(),
            shallow: false,
            structure_only: false,
            ignore_missing_in_reference: false,
            relative_fs_top: false,
            report_identical: false,
            show_relative: false,
            jobs: 0,
            traverse_list: None,
        }
    }

    /// The same configuration with the two roots exchanged.
    pub fn swapped(&self) -> Self {
        let mut config = self.clone();
        std::mem::swap(&mut config.reference, &mut config.candidate);
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = CompareConfig::builder()
            .reference("/fs1")
            .candidate("/fs2")
            .shallow(true)
            .jobs(4usize)
            .traverse_list("/tmp/list.txt")
            .build()
            .unwrap();

        assert_eq!(config.reference, PathBuf::from("/fs1"));
        assert_eq!(config.candidate, PathBuf::from("/fs2"));
        assert!(config.shallow);
        assert!(!config.structure_only);
        assert_eq!(config.jobs, 4);
        assert_eq!(config.traverse_list, Some(PathBuf::from("/tmp/list.txt")));
    }

    #[test]
    fn test_config_builder_requires_roots() {
        let err = CompareConfig::builder().reference("/fs1").build().unwrap_err();
        assert!(err.to_string().contains("Candidate root is required"));

        let err = CompareConfig::builder()
            .reference("")
            .candidate("/fs2")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("cannot be empty"));
    }

    #[test]
    fn test_standard_exclusions_append() {
        let config = CompareConfig::builder()
            .reference("/fs1")
            .candidate("/fs2")
            .exclude_patterns(vec!["custom".to_string()])
            .standard_exclusions(false)
            .build()
            .unwrap();

        assert_eq!(config.exclude_patterns[0], "custom");
        assert!(config.exclude_patterns.iter().any(|p| p == ".Trashes"));
        assert!(!config.exclude_patterns.iter().any(|p| p == ".DS_Store"));
    }

    #[test]
    fn test_swapped() {
        let config = CompareConfig::new("/fs1", "/fs2").swapped();
        assert_eq!(config.reference, PathBuf::from("/fs2"));
        assert_eq!(config.candidate, PathBuf::from("/fs1"));
    }
}
