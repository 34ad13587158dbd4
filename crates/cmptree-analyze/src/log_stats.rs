//! Analytics over error logs written by previous runs.
//!
//! Each line is split into error text, path information and comment:
//! `<error> | <path>[ || REL: /<rel>][ || COMMENT: <comment>]`. Lines that
//! do not follow this layout are recorded with the reason and, where
//! possible, still counted.

use std::io::{self, BufRead};

use indexmap::IndexMap;
use itertools::Itertools;
use serde::Serialize;

const FIELD_DIVIDER: &str = " | ";
const COMMENT_DIVIDER: &str = " || COMMENT: ";

/// One parsed log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogLine {
    pub error: String,
    pub path: String,
    pub comment: String,
}

/// A line that did not follow the log layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MalformedLine {
    pub reason: &'static str,
    pub line: String,
}

/// A value and how often it occurred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Frequency {
    pub value: String,
    pub count: usize,
}

/// Most frequent values of a loaded log.
#[derive(Debug, Clone, Serialize)]
pub struct FrequencyReport {
    pub lines: usize,
    pub errors: Vec<Frequency>,
    pub comments: Vec<Frequency>,
    pub malformed: Vec<MalformedLine>,
}

impl FrequencyReport {
    /// Plain-text rendering, one section per counted field.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for (title, values) in [
            ("Error frequency", &self.errors),
            ("Comment frequency", &self.comments),
        ] {
            out.push('\n');
            out.push_str(&format!("{}:\n", title.to_uppercase()));
            out.push_str(&"-".repeat(title.len()));
            out.push('\n');
            for freq in values {
                if freq.value.is_empty() {
                    out.push_str(&format!("EMPTY ({})\n", freq.count));
                } else {
                    out.push_str(&format!("'{}' ({})\n", freq.value, freq.count));
                }
            }
        }
        if !self.malformed.is_empty() {
            out.push_str(&format!("\n{} malformed line(s):\n", self.malformed.len()));
            for bad in &self.malformed {
                out.push_str(&format!("{}: {}\n", bad.reason, bad.line));
            }
        }
        out
    }
}

/// Frequency counters over the lines of an error log.
#[derive(Debug, Default)]
pub struct LogAnalytics {
    lines: Vec<LogLine>,
    malformed: Vec<MalformedLine>,
    error_freq: IndexMap<String, usize>,
    path_freq: IndexMap<String, usize>,
    comment_freq: IndexMap<String, usize>,
}

impl LogAnalytics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every line of `reader`.
    pub fn from_reader(reader: impl BufRead) -> io::Result<Self> {
        let mut analytics = Self::new();
        for line in reader.lines() {
            analytics.add_line(&line?);
        }
        Ok(analytics)
    }

    /// Load every line of `text`.
    pub fn from_text(text: &str) -> Self {
        let mut analytics = Self::new();
        for line in text.lines() {
            analytics.add_line(line);
        }
        analytics
    }

    /// Parse and count one line.
    pub fn add_line(&mut self, raw: &str) {
        let line = raw.trim();
        if line.is_empty() {
            return;
        }
        let Some(parsed) = self.parse_line(line) else {
            return;
        };

        *self.error_freq.entry(parsed.error.clone()).or_default() += 1;
        *self.path_freq.entry(parsed.path.clone()).or_default() += 1;
        *self.comment_freq.entry(parsed.comment.clone()).or_default() += 1;
        self.lines.push(parsed);
    }

    fn parse_line(&mut self, line: &str) -> Option<LogLine> {
        let fields: Vec<&str> = line.split(FIELD_DIVIDER).collect();
        if fields.len() < 2 {
            self.reject("No ' | ' dividers", line);
            return None;
        }
        if fields.len() > 2 {
            self.reject("Too many ' | ' dividers", line);
        }

        let info: Vec<&str> = fields[1].split(COMMENT_DIVIDER).collect();
        if info.len() > 2 {
            self.reject("Too many ' || ' dividers", line);
        }

        Some(LogLine {
            error: fields[0].to_string(),
            path: info[0].to_string(),
            comment: info.get(1).copied().unwrap_or_default().to_string(),
        })
    }

    fn reject(&mut self, reason: &'static str, line: &str) {
        self.malformed.push(MalformedLine {
            reason,
            line: line.to_string(),
        });
    }

    /// Parsed lines, in log order.
    pub fn lines(&self) -> &[LogLine] {
        &self.lines
    }

    pub fn malformed(&self) -> &[MalformedLine] {
        &self.malformed
    }

    /// The `n` most frequent error texts; ties keep first-seen order.
    pub fn top_errors(&self, n: usize) -> Vec<Frequency> {
        most_common(&self.error_freq, n)
    }

    /// The `n` most frequent paths.
    pub fn top_paths(&self, n: usize) -> Vec<Frequency> {
        most_common(&self.path_freq, n)
    }

    /// The `n` most frequent comments; an empty string counts lines without one.
    pub fn top_comments(&self, n: usize) -> Vec<Frequency> {
        most_common(&self.comment_freq, n)
    }

    pub fn report(&self, top: usize) -> FrequencyReport {
        FrequencyReport {
            lines: self.lines.len(),
            errors: self.top_errors(top),
            comments: self.top_comments(top),
            malformed: self.malformed.clone(),
        }
    }
}

fn most_common(freq: &IndexMap<String, usize>, n: usize) -> Vec<Frequency> {
    freq.iter()
        .sorted_by(|a, b| b.1.cmp(a.1))
        .take(n)
        .map(|(value, count)| Frequency {
            value: value.clone(),
            count: *count,
        })
        .collect()
}
