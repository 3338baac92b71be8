//! Per-user task board state.
//!
//! [`BoardStore`] owns the active user's lists and mirrors every change to
//! a [`KeyValueStore`](crate::storage::KeyValueStore). [`ListView`] derives
//! the display order of a list on read.

pub mod store;
pub mod view;

pub use store::{BoardLimits, BoardStore, LoadOutcome};
pub use view::ListView;

use thiserror::Error;

/// Errors returned by board operations.
///
/// Every error means the operation had no effect: in-memory state is
/// unchanged and nothing was written.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    /// No user is signed in, so there is no board to change.
    #[error("no active user")]
    NoActiveUser,
    /// List name is empty or whitespace.
    #[error("list name cannot be empty")]
    NameEmpty,
    /// List name exceeds the configured maximum length.
    #[error("list name too long (max {0} characters)")]
    NameTooLong(usize),
    /// Task title is empty or whitespace.
    #[error("task title cannot be empty")]
    TitleEmpty,
    /// Task title exceeds the configured maximum length.
    #[error("task title too long (max {0} characters)")]
    TitleTooLong(usize),
    /// List with the given ID was not found.
    #[error("list not found: {0}")]
    ListNotFound(String),
    /// Task with the given ID was not found in the list.
    #[error("task not found: {0}")]
    TaskNotFound(String),
}
