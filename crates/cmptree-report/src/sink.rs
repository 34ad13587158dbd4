//! Report sink writing to the error and ok log files.

use std::path::Path;

use cmptree_core::{CompareError, ReportEvent, ReportSink};

use crate::log_file::{ERR_LOG_DEFAULT_NAME, LogFile, OK_LOG_DEFAULT_NAME};

/// Writes error events to the error log and ok events to the ok log.
#[derive(Debug)]
pub struct LogFileSink {
    err_log: LogFile,
    ok_log: LogFile,
    show_relative: bool,
}

impl LogFileSink {
    /// Open both logs at the location selected by `output`.
    ///
    /// When `output` names a file, the error log takes that name and the ok
    /// log keeps its default name next to it.
    pub fn open(output: Option<&Path>, show_relative: bool) -> Result<Self, CompareError> {
        Ok(Self {
            err_log: LogFile::open(output, ERR_LOG_DEFAULT_NAME, false)?,
            ok_log: LogFile::open(output, OK_LOG_DEFAULT_NAME, true)?,
            show_relative,
        })
    }

    pub fn err_log(&self) -> &LogFile {
        &self.err_log
    }

    pub fn ok_log(&self) -> &LogFile {
        &self.ok_log
    }

    /// Close both files.
    pub fn close(&mut self) {
        self.err_log.close();
        self.ok_log.close();
    }
}

impl ReportSink for LogFileSink {
    fn report(&mut self, event: &ReportEvent) -> Result<(), CompareError> {
        let line = event.to_line(self.show_relative);
        if event.is_error() {
            self.err_log.write_line(&line)
        } else {
            self.ok_log.write_line(&line)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmptree_core::{EntryKind, ErrorKind};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_events_split_by_kind() {
        let temp = TempDir::new().unwrap();
        let mut sink = LogFileSink::open(Some(temp.path()), true).unwrap();

        sink.report(&ReportEvent::ok(EntryKind::File, "/fs1/same", "same"))
            .unwrap();
        sink.report_error(
            ErrorKind::NotExistInReference,
            EntryKind::Directory,
            Path::new("/fs2/extra"),
            Path::new("extra"),
            None,
        )
        .unwrap();
        sink.close();

        assert_eq!(
            fs::read_to_string(temp.path().join("cmp-ok.log")).unwrap(),
            "/fs1/same || REL: /same\n"
        );
        assert_eq!(
            fs::read_to_string(temp.path().join("cmp-err.log")).unwrap(),
            "Error: Directory does not exist in FS1 | /fs2/extra || REL: /extra\n"
        );
    }

    #[test]
    fn test_named_error_log() {
        let temp = TempDir::new().unwrap();
        let named = temp.path().join("backup-check.txt");
        let sink = LogFileSink::open(Some(&named), false).unwrap();

        assert_eq!(sink.err_log().path(), named);
        assert_eq!(sink.ok_log().path(), temp.path().join("cmp-ok.log"));
    }
}
