//! Append-only report log files.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use cmptree_core::CompareError;

/// Default name of the error log.
pub const ERR_LOG_DEFAULT_NAME: &str = "cmp-err.log";
/// Default name of the log of matching entries.
pub const OK_LOG_DEFAULT_NAME: &str = "cmp-ok.log";
/// Suffix given to the log of a previous run.
pub const LOG_BACKUP_EXT: &str = ".bak";

/// A log file that only comes into existence with its first line.
///
/// A file left at the same path by a previous run is renamed to
/// `<name>.bak` when the log is opened.
#[derive(Debug)]
pub struct LogFile {
    path: PathBuf,
    file: Option<File>,
    lines_written: u64,
}

impl LogFile {
    /// Open the log at the location selected by `output`.
    ///
    /// `output` may name an existing directory, in which case the log gets
    /// `default_name` inside it, or a file path whose parent directory
    /// exists. With `force_default` only the directory part of such a file
    /// path is used. Without `output` the current directory is used.
    pub fn open(
        output: Option<&Path>,
        default_name: &str,
        force_default: bool,
    ) -> Result<Self, CompareError> {
        Self::at(resolve_path(output, default_name, force_default)?)
    }

    /// Open the log at exactly `path`.
    pub fn at(path: impl Into<PathBuf>) -> Result<Self, CompareError> {
        let path = path.into();
        if path.is_file() {
            let backup = backup_path(&path);
            fs::rename(&path, &backup).map_err(|source| CompareError::Sink {
                path: path.clone(),
                source,
            })?;
            tracing::debug!(backup = %backup.display(), "Moved previous log aside");
        }
        Ok(Self {
            path,
            file: None,
            lines_written: 0,
        })
    }

    /// Append one line and flush it.
    pub fn write_line(&mut self, line: &str) -> Result<(), CompareError> {
        self.append(line).map_err(|source| CompareError::Sink {
            path: self.path.clone(),
            source,
        })?;
        self.lines_written += 1;
        Ok(())
    }

    fn append(&mut self, line: &str) -> io::Result<()> {
        let file = match &mut self.file {
            Some(file) => file,
            slot => slot.insert(OpenOptions::new().create(true).append(true).open(&self.path)?),
        };
        writeln!(file, "{line}")?;
        file.flush()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lines_written(&self) -> u64 {
        self.lines_written
    }

    /// Whether anything was written during this run.
    pub fn is_created(&self) -> bool {
        self.file.is_some()
    }

    /// Close the underlying file; a later line reopens it for appending.
    pub fn close(&mut self) {
        self.file = None;
    }
}

fn resolve_path(
    output: Option<&Path>,
    default_name: &str,
    force_default: bool,
) -> Result<PathBuf, CompareError> {
    let output = output.unwrap_or(Path::new("."));
    if output.is_dir() {
        return Ok(output.join(default_name));
    }

    let dir = match output.parent() {
        Some(parent) if parent.as_os_str().is_empty() => Path::new("."),
        Some(parent) => parent,
        None => Path::new("."),
    };
    if !dir.is_dir() {
        return Err(CompareError::Config {
            message: format!(
                "output path {} contains a non-existing directory",
                output.display()
            ),
        });
    }
    Ok(if force_default {
        dir.join(default_name)
    } else {
        output.to_path_buf()
    })
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(LOG_BACKUP_EXT);
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_directory_and_file() {
        let temp = TempDir::new().unwrap();

        let path = resolve_path(Some(temp.path()), ERR_LOG_DEFAULT_NAME, false).unwrap();
        assert_eq!(path, temp.path().join("cmp-err.log"));

        let named = temp.path().join("run1.log");
        let path = resolve_path(Some(&named), ERR_LOG_DEFAULT_NAME, false).unwrap();
        assert_eq!(path, named);

        let path = resolve_path(Some(&named), OK_LOG_DEFAULT_NAME, true).unwrap();
        assert_eq!(path, temp.path().join("cmp-ok.log"));
    }

    #[test]
    fn test_resolve_rejects_missing_directory() {
        let temp = TempDir::new().unwrap();
        let bad = temp.path().join("missing/run.log");
        let err = resolve_path(Some(&bad), ERR_LOG_DEFAULT_NAME, false).unwrap_err();
        assert!(err.to_string().contains("non-existing directory"));
    }

    #[test]
    fn test_created_lazily() {
        let temp = TempDir::new().unwrap();
        let mut log = LogFile::open(Some(temp.path()), ERR_LOG_DEFAULT_NAME, false).unwrap();
        assert!(!log.path().exists());
        assert!(!log.is_created());

        log.write_line("first").unwrap();
        log.write_line("second").unwrap();
        assert_eq!(fs::read_to_string(log.path()).unwrap(), "first\nsecond\n");
        assert_eq!(log.lines_written(), 2);

        log.close();
        log.write_line("third").unwrap();
        assert_eq!(fs::read_to_string(log.path()).unwrap(), "first\nsecond\nthird\n");
    }

    #[test]
    fn test_previous_log_is_backed_up() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(ERR_LOG_DEFAULT_NAME);
        fs::write(&path, "old run\n").unwrap();

        let log = LogFile::at(&path).unwrap();
        assert!(!log.path().exists());
        assert_eq!(
            fs::read_to_string(temp.path().join("cmp-err.log.bak")).unwrap(),
            "old run\n"
        );
    }
}
