use std::io::Write;

use serde::Serialize;

use crate::io::recovery::RecoveryEntry;
use crate::model::task::{Filter, Task};
use crate::model::theme::Theme;
use crate::ops::stats::{ListStats, TaskStats};
use crate::util::unicode::{display_width, pad_to_width, truncate_to_width};
use crate::view::{Notice, Presenter};

/// Widest the text column gets before truncation
pub const MAX_TEXT_WIDTH: usize = 48;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct ListJson<'a> {
    pub filter: Filter,
    pub theme: Theme,
    pub tasks: &'a [&'a Task],
}

#[derive(Serialize)]
pub struct ThemeJson {
    pub theme: Theme,
}

#[derive(Serialize)]
pub struct CategoriesJson<'a> {
    pub default: &'a str,
    pub categories: &'a [String],
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

/// One task as `[x] <id>  <text>  <category>`, with the text padded or
/// truncated to `text_width` cells.
pub fn format_task_line(task: &Task, text_width: usize) -> String {
    let check = if task.completed { 'x' } else { ' ' };
    let text = pad_to_width(&truncate_to_width(&task.text, text_width), text_width);
    format!("[{}] {}  {}  {}", check, task.id, text, task.category)
}

/// Header line plus one line per task
pub fn format_listing(tasks: &[&Task], filter: Filter) -> Vec<String> {
    let mut lines = vec![format!("Tasks: {} ({})", filter, tasks.len())];
    if tasks.is_empty() {
        lines.push("No tasks. Add something awesome!".to_string());
        return lines;
    }
    let text_width = tasks
        .iter()
        .map(|t| display_width(&t.text))
        .max()
        .unwrap_or(0)
        .min(MAX_TEXT_WIDTH);
    lines.extend(tasks.iter().map(|t| format_task_line(t, text_width)));
    lines
}

pub fn format_stats(stats: &ListStats) -> Vec<String> {
    let name_width = stats
        .categories
        .keys()
        .map(|k| display_width(k))
        .chain(std::iter::once(display_width("All")))
        .max()
        .unwrap_or(0);
    let row = |name: &str, s: &TaskStats| {
        format!(
            "{}  {:>3} total  {:>3} pending  {:>3} completed",
            pad_to_width(name, name_width),
            s.total,
            s.pending,
            s.completed
        )
    };

    let mut lines = vec![row("All", &stats.totals)];
    if !stats.categories.is_empty() {
        lines.push(String::new());
        for (name, s) in &stats.categories {
            lines.push(row(name, s));
        }
    }
    lines
}

pub fn format_recovery_entry(entry: &RecoveryEntry) -> Vec<String> {
    let mut lines = vec![format!(
        "{} [{}] {}",
        entry
            .timestamp
            .to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        entry.category,
        entry.description
    )];
    for (key, value) in &entry.fields {
        lines.push(format!("  {}: {}", key, value));
    }
    for line in entry.body.lines() {
        lines.push(format!("    {}", line));
    }
    lines
}

// ---------------------------------------------------------------------------
// Presenter
// ---------------------------------------------------------------------------

/// Writes the task list to a terminal stream as text or JSON.
///
/// With `show_list` off, `render` prints nothing; commands that change one
/// task print their own confirmation instead of the whole list.
pub struct TextPresenter<W> {
    out: W,
    json: bool,
    show_list: bool,
    notices: Vec<Notice>,
}

impl<W: Write> TextPresenter<W> {
    pub fn new(out: W, json: bool) -> Self {
        TextPresenter {
            out,
            json,
            show_list: true,
            notices: Vec::new(),
        }
    }

    pub fn silent(mut self) -> Self {
        self.show_list = false;
        self
    }

    /// Notices received so far
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_lines(&mut self, lines: &[String]) {
        for line in lines {
            // a closed stdout (e.g. piped into `head`) is not worth failing over
            let _ = writeln!(self.out, "{}", line);
        }
    }
}

impl<W: Write> Presenter for TextPresenter<W> {
    fn render(&mut self, tasks: &[&Task], filter: Filter, theme: Theme) {
        if !self.show_list {
            return;
        }
        if self.json {
            let doc = ListJson {
                filter,
                theme,
                tasks,
            };
            match serde_json::to_string_pretty(&doc) {
                Ok(json) => self.write_lines(&[json]),
                Err(e) => tracing::error!(error = %e, "could not serialize task list"),
            }
        } else {
            let lines = format_listing(tasks, filter);
            self.write_lines(&lines);
        }
    }

    fn notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}
