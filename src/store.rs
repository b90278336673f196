//! The task-list state manager.
//!
//! [`Store`] owns the ordered task list and the storage it is mirrored to.
//! Every mutation writes the whole list back before returning, so the
//! stored value never lags behind what a caller can observe. A failed
//! write does not roll anything back: the in-memory list stays the source
//! of truth and the failure is handed to the caller as
//! [`StoreError::Write`].

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::io::storage::{KeyValueStore, StorageError};
use crate::model::task::{Filter, Task};
use crate::model::theme::Theme;
use crate::ops::task_ops::{self, TaskError};

/// Storage key of the task list (JSON array of tasks)
pub const TASKS_KEY: &str = "advanced_todos_v1";
/// Storage key of the theme (`light` or `dark`)
pub const THEME_KEY: &str = "advanced_todos_theme";

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("task text cannot be empty")]
    EmptyText,
    #[error("change kept in memory but not saved: {0}")]
    Write(#[from] StorageError),
    #[error("could not serialize task list: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StoreError {
    /// Whether the in-memory state changed despite this error
    pub fn is_unsaved_change(&self) -> bool {
        matches!(self, StoreError::Write(_) | StoreError::Serialize(_))
    }
}

impl From<TaskError> for StoreError {
    fn from(e: TaskError) -> Self {
        match e {
            TaskError::EmptyText => StoreError::EmptyText,
        }
    }
}

/// Called with the damaged stored value just before the first save replaces it
pub type ReplaceHook = Box<dyn FnMut(&str)>;

pub struct Store<S> {
    storage: S,
    tasks: Vec<Task>,
    theme: Theme,
    /// Raw stored value that could not be loaded as is
    discarded: Option<String>,
    before_replace: Option<ReplaceHook>,
}

impl<S: KeyValueStore> Store<S> {
    /// Load the task list and theme from `storage`.
    ///
    /// A missing or malformed task list loads as empty; a missing or
    /// unrecognized theme loads as [`Theme::Light`]. Neither is an error.
    pub fn open(storage: S) -> Self {
        let (tasks, discarded) = load_tasks(&storage);
        let theme = load_theme(&storage);
        info!(tasks = tasks.len(), theme = %theme, "store opened");
        Store {
            storage,
            tasks,
            theme,
            discarded,
            before_replace: None,
        }
    }

    /// Run `hook` with the damaged stored value right before a save first
    /// overwrites it. Never runs if nothing was discarded at load, or if
    /// no save of the task list happens.
    pub fn before_replacing_discarded(mut self, hook: impl FnMut(&str) + 'static) -> Self {
        self.before_replace = Some(Box::new(hook));
        self
    }

    // --- Mutations ---

    /// Add a task at the head of the list and save.
    pub fn add(&mut self, text: &str, category: &str) -> Result<Task, StoreError> {
        let task = task_ops::add_task(&mut self.tasks, text, category)?;
        self.persist()?;
        Ok(task)
    }

    /// Flip a task's completion flag and save. Returns false, without
    /// writing, if no task has this id.
    pub fn toggle(&mut self, task_id: &str) -> Result<bool, StoreError> {
        if !task_ops::toggle_task(&mut self.tasks, task_id) {
            debug!(id = task_id, "toggle: no such task");
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    /// Replace a task's text and save. Empty text is rejected with
    /// [`StoreError::EmptyText`]; an unknown id returns false.
    pub fn edit(&mut self, task_id: &str, new_text: &str) -> Result<bool, StoreError> {
        if !task_ops::edit_text(&mut self.tasks, task_id, new_text)? {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    /// Delete a task and save. Returns false, without writing, if absent.
    pub fn remove(&mut self, task_id: &str) -> Result<bool, StoreError> {
        if !task_ops::remove_task(&mut self.tasks, task_id) {
            debug!(id = task_id, "remove: no such task");
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    /// Put the named tasks first, in the given order, followed by all the
    /// others in their previous order, then save.
    ///
    /// The id list is taken as given: it is not checked against any filter.
    pub fn reorder<I: AsRef<str>>(&mut self, ordered_ids: &[I]) -> Result<(), StoreError> {
        task_ops::reorder_tasks(&mut self.tasks, ordered_ids);
        self.persist()
    }

    pub fn set_theme(&mut self, theme: Theme) -> Result<(), StoreError> {
        self.theme = theme;
        debug!(theme = %theme, "saving theme");
        self.storage.set(THEME_KEY, theme.as_str())?;
        Ok(())
    }

    /// Switch between light and dark and save. Returns the new theme.
    pub fn toggle_theme(&mut self) -> Result<Theme, StoreError> {
        let next = self.theme.toggle();
        self.set_theme(next)?;
        Ok(next)
    }

    /// Serialize the whole task list to storage.
    pub fn persist(&mut self) -> Result<(), StoreError> {
        let json = self.serialized()?;
        if let Some(raw) = self.discarded.as_deref()
            && let Some(mut hook) = self.before_replace.take()
        {
            hook(raw);
        }
        match self.storage.set(TASKS_KEY, &json) {
            Ok(()) => {
                debug!(tasks = self.tasks.len(), "task list saved");
                self.discarded = None;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "task list not saved; keeping in-memory state");
                Err(e.into())
            }
        }
    }

    // --- Queries ---

    /// Tasks passing `filter`, in list order. Borrowed and recomputed on
    /// every call.
    pub fn list(&self, filter: Filter) -> impl Iterator<Item = &Task> + '_ {
        task_ops::filter_tasks(&self.tasks, filter)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, task_id: &str) -> Option<&Task> {
        task_ops::find_task(&self.tasks, task_id)
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// The stored value as it was, if it could not be loaded as is: it did
    /// not parse (the list loads empty) or repeated an id (later copies are
    /// dropped). Cleared once a save overwrites it.
    pub fn discarded(&self) -> Option<&str> {
        self.discarded.as_deref()
    }

    /// The task list in its stored form
    pub fn serialized(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.tasks)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }
}

/// Returns the loaded list, plus the raw value if it could not be kept as is
fn load_tasks<S: KeyValueStore>(storage: &S) -> (Vec<Task>, Option<String>) {
    let Some(raw) = storage.get(TASKS_KEY) else {
        return (Vec::new(), None);
    };
    match serde_json::from_str::<Vec<Task>>(&raw) {
        Ok(tasks) => {
            let total = tasks.len();
            let mut seen = HashSet::new();
            let unique: Vec<Task> = tasks
                .into_iter()
                .filter(|t| seen.insert(t.id.clone()))
                .collect();
            if unique.len() == total {
                return (unique, None);
            }
            warn!(
                dropped = total - unique.len(),
                "stored task list repeats ids; keeping the first of each"
            );
            (unique, Some(raw))
        }
        Err(e) => {
            warn!(error = %e, "stored task list is malformed; starting empty");
            (Vec::new(), Some(raw))
        }
    }
}

fn load_theme<S: KeyValueStore>(storage: &S) -> Theme {
    storage
        .get(THEME_KEY)
        .and_then(|raw| Theme::parse_stored(&raw))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::storage::MemoryStore;

    fn texts<'a>(tasks: impl Iterator<Item = &'a Task>) -> Vec<&'a str> {
        tasks.map(|t| t.text.as_str()).collect()
    }

    fn id_of(store: &Store<MemoryStore>, text: &str) -> String {
        store
            .tasks()
            .iter()
            .find(|t| t.text == text)
            .map(|t| t.id.clone())
            .unwrap()
    }

    #[test]
    fn open_empty_storage() {
        let store = Store::open(MemoryStore::new());
        assert!(store.tasks().is_empty());
        assert_eq!(store.theme(), Theme::Light);
    }

    #[test]
    fn open_malformed_storage_is_empty() {
        let storage = MemoryStore::new().with_entry(TASKS_KEY, "[{\"id\": oops");
        let store = Store::open(storage);
        assert!(store.tasks().is_empty());
        assert_eq!(store.discarded(), Some("[{\"id\": oops"));
    }

    #[test]
    fn open_wrong_shape_is_empty() {
        let storage = MemoryStore::new().with_entry(TASKS_KEY, r#"{"id":"t_1"}"#);
        assert!(Store::open(storage).tasks().is_empty());
    }

    #[test]
    fn add_persists() {
        let mut store = Store::open(MemoryStore::new());
        let task = store.add("Buy milk", "Home").unwrap();
        let raw = store.storage().get(TASKS_KEY).unwrap();
        let stored: Vec<Task> = serde_json::from_str(&raw).unwrap();
        assert_eq!(stored, vec![task]);
    }

    #[test]
    fn add_empty_text_does_not_write() {
        let mut store = Store::open(MemoryStore::new());
        assert!(matches!(store.add("  ", "Home"), Err(StoreError::EmptyText)));
        assert!(store.storage().get(TASKS_KEY).is_none());
    }

    #[test]
    fn missing_ids_are_silent_noops() {
        let mut store = Store::open(MemoryStore::new());
        store.add("Only", "General").unwrap();
        assert!(!store.toggle("t_missing").unwrap());
        assert!(!store.edit("t_missing", "New").unwrap());
        assert!(!store.edit("t_missing", "   ").unwrap());
        assert!(!store.remove("t_missing").unwrap());
        assert_eq!(texts(store.list(Filter::All)), vec!["Only"]);
    }

    #[test]
    fn edit_empty_reports_validation() {
        let mut store = Store::open(MemoryStore::new());
        store.add("Keep me", "General").unwrap();
        let id = id_of(&store, "Keep me");
        assert!(matches!(store.edit(&id, "   "), Err(StoreError::EmptyText)));
        assert_eq!(store.get(&id).unwrap().text, "Keep me");
    }

    #[test]
    fn scenario_milk_and_bob() {
        let mut store = Store::open(MemoryStore::new());
        store.add("Buy milk", "Home").unwrap();
        store.add("Call Bob", "Work").unwrap();
        let bob = id_of(&store, "Call Bob");
        assert!(store.toggle(&bob).unwrap());

        assert_eq!(texts(store.list(Filter::Completed)), vec!["Call Bob"]);
        assert_eq!(texts(store.list(Filter::Pending)), vec!["Buy milk"]);
        assert_eq!(texts(store.list(Filter::All)), vec!["Call Bob", "Buy milk"]);
    }

    #[test]
    fn write_failure_keeps_memory_state() {
        let mut store = Store::open(MemoryStore::with_quota(120));
        store.add("Short", "General").unwrap();

        let err = store
            .add("A much longer task text that pushes the list over quota", "General")
            .unwrap_err();
        assert!(err.is_unsaved_change());
        assert_eq!(store.tasks().len(), 2);

        // storage still holds the last successful write
        let raw = store.storage().get(TASKS_KEY).unwrap();
        let stored: Vec<Task> = serde_json::from_str(&raw).unwrap();
        assert_eq!(stored.len(), 1);
    }

    #[test]
    fn theme_toggle_persists() {
        let mut store = Store::open(MemoryStore::new());
        assert_eq!(store.toggle_theme().unwrap(), Theme::Dark);
        assert_eq!(store.storage().get(THEME_KEY).as_deref(), Some("dark"));

        let reopened = Store::open(store.into_storage());
        assert_eq!(reopened.theme(), Theme::Dark);
    }

    #[test]
    fn repeated_ids_keep_first_copy() {
        let raw = r#"[
            {"id":"t_1","text":"first","completed":false,"category":"Home"},
            {"id":"t_2","text":"other","completed":true,"category":"Work"},
            {"id":"t_1","text":"copy","completed":true,"category":"Home"}
        ]"#;
        let mut store = Store::open(MemoryStore::new().with_entry(TASKS_KEY, raw));
        assert_eq!(texts(store.list(Filter::All)), vec!["first", "other"]);
        assert_eq!(store.discarded(), Some(raw));

        store.reorder(&["t_2", "t_1"]).unwrap();
        assert_eq!(texts(store.list(Filter::All)), vec!["other", "first"]);
        assert!(store.discarded().is_none());
    }

    #[test]
    fn replace_hook_runs_once_and_only_on_save() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut store = Store::open(MemoryStore::new().with_entry(TASKS_KEY, "not json"))
            .before_replacing_discarded(move |raw| sink.borrow_mut().push(raw.to_string()));

        // no-ops and theme changes leave the stored list alone
        assert!(!store.toggle("t_missing").unwrap());
        assert!(!store.remove("t_missing").unwrap());
        store.toggle_theme().unwrap();
        assert!(seen.borrow().is_empty());
        assert_eq!(store.storage().get(TASKS_KEY).as_deref(), Some("not json"));

        store.add("Fresh", "General").unwrap();
        store.add("Again", "General").unwrap();
        assert_eq!(*seen.borrow(), vec!["not json".to_string()]);
        assert!(store.discarded().is_none());
    }

    #[test]
    fn replace_hook_silent_for_clean_data() {
        use std::cell::Cell;
        use std::rc::Rc;

        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let mut store = Store::open(MemoryStore::new())
            .before_replacing_discarded(move |_| counter.set(counter.get() + 1));
        store.add("Fresh", "General").unwrap();
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn unknown_theme_falls_back_to_light() {
        let storage = MemoryStore::new().with_entry(THEME_KEY, "sepia");
        assert_eq!(Store::open(storage).theme(), Theme::Light);
    }
}
