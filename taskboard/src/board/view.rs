//! Display ordering for a single list.

use taskboard_proto::board::{Task, TaskList};

/// A read-only view of a list split into its incomplete and completed
/// partitions, each in insertion order.
#[derive(Debug)]
pub struct ListView<'a> {
    /// The list being viewed.
    pub list: &'a TaskList,
    /// Incomplete tasks in insertion order.
    pub incomplete: Vec<&'a Task>,
    /// Completed tasks in insertion order.
    pub completed: Vec<&'a Task>,
}

impl<'a> ListView<'a> {
    /// Builds the view of `list`.
    #[must_use]
    pub fn of(list: &'a TaskList) -> Self {
        let (completed, incomplete): (Vec<&Task>, Vec<&Task>) =
            list.tasks.iter().partition(|t| t.is_completed);
        Self {
            list,
            incomplete,
            completed,
        }
    }

    /// Tasks in display order: incomplete first, then completed.
    pub fn display_order(&self) -> impl Iterator<Item = &'a Task> + '_ {
        self.incomplete.iter().chain(&self.completed).copied()
    }

    /// Task at a 1-based display position.
    #[must_use]
    pub fn nth(&self, position: usize) -> Option<&'a Task> {
        position
            .checked_sub(1)
            .and_then(|idx| self.display_order().nth(idx))
    }

    /// Number of completed tasks.
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    /// Total number of tasks.
    #[must_use]
    pub fn total(&self) -> usize {
        self.incomplete.len() + self.completed.len()
    }
}
