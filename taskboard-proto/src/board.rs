//! Board data model: task lists and the tasks they own.
//!
//! Field names serialize in camelCase so that snapshots stay readable by
//! clients that wrote the same format (`isCompleted`, `dueDate`, `listId`).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum allowed task title length in characters.
pub const MAX_TASK_TITLE_LENGTH: usize = 256;

/// Maximum allowed list name length in characters.
pub const MAX_LIST_NAME_LENGTH: usize = 128;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generates a fresh, time-ordered identifier (UUID v7 based).
            #[must_use]
            pub fn generate() -> Self {
                Self(format!(concat!($prefix, "-{}"), Uuid::now_v7()))
            }

            /// Wraps an existing identifier verbatim.
            #[must_use]
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self(raw.to_string())
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self(raw)
            }
        }
    };
}

string_id!(
    /// Opaque identifier of a [`TaskList`].
    ///
    /// Identifiers read back from storage are kept verbatim, so any string
    /// written by an earlier client (e.g. `list-1712345678901`) is valid.
    ListId,
    "list"
);

string_id!(
    /// Opaque identifier of a [`Task`].
    TaskId,
    "task"
);

/// A single actionable item on a list.
///
/// Updates replace the whole value, so every field is always present;
/// absent optional text is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Stable identifier.
    pub id: TaskId,
    /// Display title, never empty.
    pub title: String,
    /// Free-text notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Free-text due date; not validated as a calendar date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    /// Whether the task has been checked off.
    #[serde(default)]
    pub is_completed: bool,
    /// The list that currently owns this task.
    pub list_id: ListId,
}

impl Task {
    /// Creates an incomplete task with no details or due date.
    #[must_use]
    pub fn new(id: TaskId, list_id: ListId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            details: None,
            due_date: None,
            is_completed: false,
            list_id,
        }
    }
}

/// A named, ordered collection of tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskList {
    /// Stable identifier.
    pub id: ListId,
    /// Display name, never empty.
    pub name: String,
    /// Tasks in insertion order.
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl TaskList {
    /// Creates an empty list.
    #[must_use]
    pub fn new(id: ListId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            tasks: Vec::new(),
        }
    }

    /// Looks up a task by id.
    #[must_use]
    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    /// Returns the position of a task in insertion order.
    #[must_use]
    pub fn position(&self, id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| &t.id == id)
    }
}
