use indexmap::IndexMap;
use serde::Serialize;

use crate::model::task::Task;

/// Completion counts for a set of tasks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskStats {
    pub total: usize,
    pub pending: usize,
    pub completed: usize,
}

impl TaskStats {
    fn count(&mut self, task: &Task) {
        self.total += 1;
        if task.completed {
            self.completed += 1;
        } else {
            self.pending += 1;
        }
    }
}

/// Totals plus a per-category breakdown. Categories appear in the order
/// they are first met walking the list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListStats {
    pub totals: TaskStats,
    pub categories: IndexMap<String, TaskStats>,
}

pub fn list_stats(tasks: &[Task]) -> ListStats {
    let mut stats = ListStats::default();
    for task in tasks {
        stats.totals.count(task);
        stats
            .categories
            .entry(task.category.clone())
            .or_default()
            .count(task);
    }
    stats
}
