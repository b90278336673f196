use std::fmt;

use serde::{Deserialize, Serialize};

/// Category used when a task is added without one
pub const DEFAULT_CATEGORY: &str = "General";

/// A single to-do entry.
///
/// The serialized shape (`id`, `text`, `completed`, `category`) is the
/// persisted format and must stay stable across versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Opaque id like `t_3f9a0c21d4e8b7a6`, fixed at insertion
    pub id: String,
    /// Display text (trimmed, never empty)
    pub text: String,
    /// Completion flag
    pub completed: bool,
    /// Category label, fixed at insertion
    pub category: String,
}

impl Task {
    /// Create a new pending task
    pub fn new(id: String, text: String, category: String) -> Self {
        Task {
            id,
            text,
            completed: false,
            category,
        }
    }
}

/// View predicate over the task list. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    #[default]
    All,
    Pending,
    #[value(alias = "done")]
    Completed,
}

impl Filter {
    /// Whether `task` passes this filter
    pub fn matches(self, task: &Task) -> bool {
        match self {
            Filter::All => true,
            Filter::Pending => !task.completed,
            Filter::Completed => task.completed,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Filter::All => "all",
            Filter::Pending => "pending",
            Filter::Completed => "completed",
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
