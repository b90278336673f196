use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Header written at the top of a new recovery log.
const FILE_HEADER: &str = "\
<!-- tasklist recovery log: task lists that could not be saved or loaded.
     View with: tl recovery
     Clear with: tl recovery clear
     Safe to delete once you have what you need. -->

---
";

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// Why an entry was written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecoveryCategory {
    /// A task-list write failed; the body is the unsaved list
    Write,
    /// The stored list did not parse and was replaced; the body is the old value
    Corrupt,
}

impl fmt::Display for RecoveryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryCategory::Write => write!(f, "write"),
            RecoveryCategory::Corrupt => write!(f, "corrupt"),
        }
    }
}

impl RecoveryCategory {
    pub fn parse_category(s: &str) -> Option<Self> {
        match s {
            "write" => Some(RecoveryCategory::Write),
            "corrupt" => Some(RecoveryCategory::Corrupt),
            _ => None,
        }
    }
}

/// A single entry in the recovery log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecoveryEntry {
    pub timestamp: DateTime<Utc>,
    pub category: RecoveryCategory,
    pub description: String,
    pub fields: Vec<(String, String)>,
    pub body: String,
}

/// Return the path to the recovery log file.
pub fn recovery_log_path(data_dir: &Path) -> PathBuf {
    data_dir.join(".recovery.log")
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

impl RecoveryEntry {
    pub fn new(category: RecoveryCategory, description: impl Into<String>, body: impl Into<String>) -> Self {
        RecoveryEntry {
            timestamp: Utc::now(),
            category,
            description: description.into(),
            fields: Vec::new(),
            body: body.into(),
        }
    }

    pub fn field(mut self, key: &str, value: impl Into<String>) -> Self {
        self.fields.push((key.to_string(), value.into()));
        self
    }

    /// Format this entry as a markdown block for the log.
    fn to_markdown(&self) -> String {
        let mut out = format!(
            "## {} [{}] {}\n\n",
            self.timestamp.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            self.category,
            self.description,
        );
        for (key, value) in &self.fields {
            out.push_str(&format!("{}: {}\n", key, value));
        }
        if !self.body.is_empty() {
            let fence = body_fence(&self.body);
            out.push_str(&format!("\n{}text\n", fence));
            out.push_str(&self.body);
            if !self.body.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&fence);
            out.push('\n');
        }
        out.push_str("\n---\n");
        out
    }
}

/// A backtick fence longer than any backtick run in `body`, so no body
/// line can close it early.
fn body_fence(body: &str) -> String {
    let longest = body
        .split(|c| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    "`".repeat((longest + 1).max(3))
}

/// Length of the backtick fence that opens a line, if any
fn fence_len(line: &str) -> Option<usize> {
    let n = line.len() - line.trim_start_matches('`').len();
    (n >= 3).then_some(n)
}

/// Append an entry to the log. Errors are reported on stderr and otherwise
/// ignored: the log is a last resort and must not turn into a new failure.
pub fn log_recovery(data_dir: &Path, entry: RecoveryEntry) {
    if let Err(e) = append_entry(data_dir, &entry) {
        tracing::warn!(error = %e, "could not write to recovery log");
        eprintln!("warning: could not write to recovery log: {}", e);
    }
}

fn append_entry(data_dir: &Path, entry: &RecoveryEntry) -> io::Result<()> {
    fs::create_dir_all(data_dir)?;
    let path = recovery_log_path(data_dir);
    let needs_header = fs::metadata(&path).map_or(true, |m| m.len() == 0);

    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    if needs_header {
        file.write_all(FILE_HEADER.as_bytes())?;
    }
    file.write_all(entry.to_markdown().as_bytes())
}

/// Delete the log. Returns the number of entries it held.
pub fn clear_recovery(data_dir: &Path) -> io::Result<usize> {
    let path = recovery_log_path(data_dir);
    let content = match fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };
    let count = parse_entries(&content).len();
    fs::remove_file(&path)?;
    Ok(count)
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Read entries, most recent first, keeping at most `limit`.
pub fn read_recovery_entries(data_dir: &Path, limit: Option<usize>) -> Vec<RecoveryEntry> {
    let Ok(content) = fs::read_to_string(recovery_log_path(data_dir)) else {
        return Vec::new();
    };
    let mut entries = parse_entries(&content);
    entries.reverse();
    if let Some(n) = limit {
        entries.truncate(n);
    }
    entries
}

/// Where the parser is inside one entry
enum Section {
    Fields,
    /// Inside a body opened by a fence of this many backticks
    Body(usize),
}

fn parse_entries(content: &str) -> Vec<RecoveryEntry> {
    let mut entries: Vec<RecoveryEntry> = Vec::new();
    // `None` between entries, or after a header that did not parse
    let mut current: Option<(RecoveryEntry, Section)> = None;

    for line in content.lines() {
        let mut finished = false;
        match current.as_mut() {
            None => {
                current = line
                    .strip_prefix("## ")
                    .and_then(parse_entry_header)
                    .map(|(timestamp, category, description)| {
                        let entry = RecoveryEntry {
                            timestamp,
                            category,
                            description,
                            fields: Vec::new(),
                            body: String::new(),
                        };
                        (entry, Section::Fields)
                    });
            }
            Some((entry, section)) => match *section {
                Section::Body(open) => {
                    if line.len() == open && fence_len(line) == Some(open) {
                        // every body line was pushed with a trailing newline
                        entry.body.pop();
                        *section = Section::Fields;
                    } else {
                        entry.body.push_str(line);
                        entry.body.push('\n');
                    }
                }
                Section::Fields => {
                    if line == "---" {
                        finished = true;
                    } else if let Some(n) = fence_len(line) {
                        *section = Section::Body(n);
                    } else if let Some((key, value)) = line.split_once(": ") {
                        entry.fields.push((key.to_string(), value.to_string()));
                    }
                }
            },
        }
        if finished {
            entries.extend(current.take().map(|(entry, _)| entry));
        }
    }
    // a final entry cut off before its `---` is still worth showing
    entries.extend(current.map(|(entry, _)| entry));
    entries
}

/// Parse `<timestamp> [<category>] <description>`
fn parse_entry_header(header: &str) -> Option<(DateTime<Utc>, RecoveryCategory, String)> {
    let (timestamp_str, rest) = header.split_once(" [")?;
    let (category_str, description) = rest.split_once("] ")?;
    let timestamp = DateTime::parse_from_rfc3339(timestamp_str)
        .ok()?
        .with_timezone(&Utc);
    let category = RecoveryCategory::parse_category(category_str)?;
    Some((timestamp, category, description.to_string()))
}
