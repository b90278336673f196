use std::collections::HashMap;

use tracing::debug;

use crate::model::task::{DEFAULT_CATEGORY, Filter, Task};
use crate::ops::id::generate_task_id;

/// Error type for task operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    #[error("task text cannot be empty")]
    EmptyText,
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

/// Add a task at the head of the list. Returns a copy of the new task.
///
/// Text and category are trimmed; an empty category falls back to
/// [`DEFAULT_CATEGORY`].
pub fn add_task(tasks: &mut Vec<Task>, text: &str, category: &str) -> Result<Task, TaskError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(TaskError::EmptyText);
    }
    let category = match category.trim() {
        "" => DEFAULT_CATEGORY,
        c => c,
    };
    let task = Task::new(generate_task_id(tasks), text.to_string(), category.to_string());
    debug!(id = %task.id, category = %task.category, "task added");
    tasks.insert(0, task.clone());
    Ok(task)
}

/// Flip the completion flag. Returns false if no task has this id.
pub fn toggle_task(tasks: &mut [Task], task_id: &str) -> bool {
    match find_task_mut(tasks, task_id) {
        Some(task) => {
            task.completed = !task.completed;
            true
        }
        None => false,
    }
}

/// Replace a task's text. An unknown id is a no-op whatever the text;
/// empty text on a known task is rejected and leaves it untouched.
pub fn edit_text(tasks: &mut [Task], task_id: &str, new_text: &str) -> Result<bool, TaskError> {
    let Some(task) = find_task_mut(tasks, task_id) else {
        return Ok(false);
    };
    let new_text = new_text.trim();
    if new_text.is_empty() {
        return Err(TaskError::EmptyText);
    }
    if task.text == new_text {
        return Ok(false);
    }
    task.text = new_text.to_string();
    Ok(true)
}

/// Remove a task, keeping the others in order. Returns false if absent.
pub fn remove_task(tasks: &mut Vec<Task>, task_id: &str) -> bool {
    let before = tasks.len();
    tasks.retain(|t| t.id != task_id);
    tasks.len() != before
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

/// Rebuild the list as: the tasks named in `ordered_ids`, in that order,
/// followed by every other task in its previous relative order.
///
/// `ordered_ids` is normally the visible subset under some filter, so the
/// hidden tasks end up after the reordered block. Unknown ids are skipped
/// and an id named twice is placed at its first mention.
pub fn reorder_tasks<S: AsRef<str>>(tasks: &mut Vec<Task>, ordered_ids: &[S]) {
    let index: HashMap<String, usize> = tasks
        .iter()
        .enumerate()
        .map(|(i, t)| (t.id.clone(), i))
        .collect();
    let mut slots: Vec<Option<Task>> = std::mem::take(tasks).into_iter().map(Some).collect();

    let mut ordered = Vec::with_capacity(slots.len());
    for id in ordered_ids {
        if let Some(&i) = index.get(id.as_ref())
            && let Some(task) = slots[i].take()
        {
            ordered.push(task);
        }
    }
    let placed = ordered.len();
    ordered.extend(slots.into_iter().flatten());
    debug!(placed, total = ordered.len(), "tasks reordered");
    *tasks = ordered;
}

/// Where a dragged task lands relative to the other visible tasks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertPosition {
    /// First visible position
    Top,
    /// Last visible position
    Bottom,
    /// Directly above the task with this ID
    Before(String),
    /// Directly below the task with this ID
    After(String),
}

/// Move `task_id` within an ordered id list. Returns false (leaving `ids`
/// unchanged) if the task or the anchor is not in the list, or if the task
/// is its own anchor.
pub fn move_in_order(ids: &mut Vec<String>, task_id: &str, position: &InsertPosition) -> bool {
    let anchor = match position {
        InsertPosition::Before(a) | InsertPosition::After(a) => Some(a.as_str()),
        _ => None,
    };
    if anchor == Some(task_id) {
        return false;
    }
    if let Some(a) = anchor
        && !ids.iter().any(|id| id == a)
    {
        return false;
    }
    let Some(from) = ids.iter().position(|id| id == task_id) else {
        return false;
    };
    let moved = ids.remove(from);

    let to = match position {
        InsertPosition::Top => 0,
        InsertPosition::Bottom => ids.len(),
        InsertPosition::Before(a) => ids.iter().position(|id| id == a).unwrap_or(0),
        InsertPosition::After(a) => ids
            .iter()
            .position(|id| id == a)
            .map_or(ids.len(), |i| i + 1),
    };
    ids.insert(to, moved);
    true
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Tasks passing `filter`, in list order
pub fn filter_tasks(tasks: &[Task], filter: Filter) -> impl Iterator<Item = &Task> + '_ {
    tasks.iter().filter(move |t| filter.matches(t))
}

/// Ids of the tasks passing `filter`, in list order
pub fn visible_ids(tasks: &[Task], filter: Filter) -> Vec<String> {
    filter_tasks(tasks, filter).map(|t| t.id.clone()).collect()
}

pub fn find_task<'a>(tasks: &'a [Task], task_id: &str) -> Option<&'a Task> {
    tasks.iter().find(|t| t.id == task_id)
}

pub fn find_task_mut<'a>(tasks: &'a mut [Task], task_id: &str) -> Option<&'a mut Task> {
    tasks.iter_mut().find(|t| t.id == task_id)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
