//! Presentation adapter: turns user gestures into [`Store`] calls and hands
//! the resulting state to a [`Presenter`].
//!
//! The filter lives here, not in the store. It is passed to
//! [`Store::list`] on every render.

use crate::io::storage::KeyValueStore;
use crate::model::task::{Filter, Task};
use crate::model::theme::Theme;
use crate::ops::task_ops::{self, InsertPosition};
use crate::store::{Store, StoreError};

/// A user action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gesture {
    Add { text: String, category: String },
    Toggle(String),
    Edit { id: String, text: String },
    Delete(String),
    /// Move one visible task relative to the others
    Drag { id: String, position: InsertPosition },
    /// The visible tasks as the user arranged them
    Drop(Vec<String>),
    SelectFilter(Filter),
    ToggleTheme,
}

/// Feedback for the user that is not part of the task list itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Add/edit was given blank text; nothing changed
    EmptyText,
    /// The change is visible but could not be saved
    Unsaved(String),
}

impl Notice {
    pub fn message(&self) -> String {
        match self {
            Notice::EmptyText => "Enter a task first!".to_string(),
            Notice::Unsaved(reason) => format!("changes not saved: {}", reason),
        }
    }
}

/// Something that can draw the task list
pub trait Presenter {
    fn render(&mut self, tasks: &[&Task], filter: Filter, theme: Theme);
    fn notice(&mut self, notice: Notice);
}

/// What a handled gesture did to the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A task was added
    Added(Task),
    /// The store changed (or was asked to reorder)
    Changed,
    /// Nothing changed: unknown id, blank text, or a view-only gesture
    Unchanged,
}

/// One store, one presenter, and the filter the presenter is showing
pub struct Session<S, P> {
    store: Store<S>,
    presenter: P,
    filter: Filter,
}

impl<S: KeyValueStore, P: Presenter> Session<S, P> {
    pub fn new(store: Store<S>, presenter: P) -> Self {
        Session {
            store,
            presenter,
            filter: Filter::default(),
        }
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn store(&self) -> &Store<S> {
        &self.store
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn into_parts(self) -> (Store<S>, P) {
        (self.store, self.presenter)
    }

    /// Draw the current state
    pub fn render(&mut self) {
        let visible: Vec<&Task> = self.store.list(self.filter).collect();
        self.presenter.render(&visible, self.filter, self.store.theme());
    }

    /// Apply a gesture, report any notice, and re-render.
    pub fn handle(&mut self, gesture: Gesture) -> Outcome {
        let outcome = match self.apply(gesture) {
            Ok(outcome) => outcome,
            Err(StoreError::EmptyText) => {
                self.presenter.notice(Notice::EmptyText);
                Outcome::Unchanged
            }
            Err(e) => {
                self.presenter.notice(Notice::Unsaved(e.to_string()));
                Outcome::Changed
            }
        };
        self.render();
        outcome
    }

    fn apply(&mut self, gesture: Gesture) -> Result<Outcome, StoreError> {
        let changed = |c: bool| if c { Outcome::Changed } else { Outcome::Unchanged };
        match gesture {
            Gesture::Add { text, category } => self.store.add(&text, &category).map(Outcome::Added),
            Gesture::Toggle(id) => self.store.toggle(&id).map(changed),
            Gesture::Edit { id, text } => self.store.edit(&id, &text).map(changed),
            Gesture::Delete(id) => self.store.remove(&id).map(changed),
            Gesture::Drag { id, position } => {
                let mut ids = task_ops::visible_ids(self.store.tasks(), self.filter);
                if !task_ops::move_in_order(&mut ids, &id, &position) {
                    return Ok(Outcome::Unchanged);
                }
                self.store.reorder(ids.as_slice()).map(|()| Outcome::Changed)
            }
            Gesture::Drop(ids) => self.store.reorder(ids.as_slice()).map(|()| Outcome::Changed),
            Gesture::SelectFilter(filter) => {
                self.filter = filter;
                Ok(Outcome::Unchanged)
            }
            Gesture::ToggleTheme => self.store.toggle_theme().map(|_| Outcome::Changed),
        }
    }
}
