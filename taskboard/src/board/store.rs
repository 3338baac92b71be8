//! Board store: the active user's lists, their CRUD operations, and
//! write-through persistence.
//!
//! `BoardStore` holds at most one user's board at a time. [`load`] swaps in
//! a user's board from storage, discarding whatever was loaded before;
//! [`unload`] discards it without touching storage. Every successful
//! mutation writes the whole list sequence back under the user's key.
//!
//! Writes are best-effort: a failed write is logged and counted, and the
//! in-memory board stays authoritative for the rest of the session.
//!
//! [`load`]: BoardStore::load
//! [`unload`]: BoardStore::unload

use std::collections::HashSet;

use taskboard_proto::board::{
    ListId, MAX_LIST_NAME_LENGTH, MAX_TASK_TITLE_LENGTH, Task, TaskId, TaskList,
};
use taskboard_proto::codec::{decode_lists, encode_lists};
use taskboard_proto::user::UserId;

use super::BoardError;
use crate::storage::{KeyValueStore, lists_key};

/// Length limits applied to user-entered text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardLimits {
    /// Maximum task title length in characters.
    pub max_task_title_len: usize,
    /// Maximum list name length in characters.
    pub max_list_name_len: usize,
}

impl Default for BoardLimits {
    fn default() -> Self {
        Self {
            max_task_title_len: MAX_TASK_TITLE_LENGTH,
            max_list_name_len: MAX_LIST_NAME_LENGTH,
        }
    }
}

/// What [`BoardStore::load`] found in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Nothing was stored for this user; the board starts empty.
    Fresh,
    /// A stored board was restored. `repaired` counts entries that had to be
    /// fixed or dropped to restore the board's invariants.
    Restored {
        /// Number of repairs applied.
        repaired: usize,
    },
    /// Stored data could not be read or decoded; the board starts empty.
    Recovered,
}

/// A user's board as currently held in memory.
#[derive(Debug)]
struct LoadedBoard {
    user: UserId,
    key: String,
    lists: Vec<TaskList>,
}

/// Owns the active user's lists and keeps storage in step with them.
pub struct BoardStore<S: KeyValueStore> {
    storage: S,
    limits: BoardLimits,
    board: Option<LoadedBoard>,
    persist_failures: u64,
}

impl<S: KeyValueStore> BoardStore<S> {
    /// Creates a store with no board loaded.
    #[must_use]
    pub const fn new(storage: S, limits: BoardLimits) -> Self {
        Self {
            storage,
            limits,
            board: None,
            persist_failures: 0,
        }
    }

    /// Replaces the in-memory board with `user`'s stored board.
    ///
    /// Never fails: a missing snapshot yields an empty board, and unreadable
    /// or malformed data is logged and also yields an empty board.
    pub fn load(&mut self, user: UserId) -> LoadOutcome {
        self.board = None;
        let key = lists_key(&user);

        let (lists, outcome) = match self.storage.read(&key) {
            Ok(None) => (Vec::new(), LoadOutcome::Fresh),
            Ok(Some(text)) => match decode_lists(&text) {
                Ok(lists) => {
                    let (lists, repaired) = repair(lists);
                    (lists, LoadOutcome::Restored { repaired })
                }
                Err(error) => {
                    tracing::error!(
                        user = %user,
                        key = %key,
                        %error,
                        "stored board is malformed, starting empty"
                    );
                    (Vec::new(), LoadOutcome::Recovered)
                }
            },
            Err(error) => {
                tracing::error!(
                    user = %user,
                    key = %key,
                    %error,
                    "could not read stored board, starting empty"
                );
                (Vec::new(), LoadOutcome::Recovered)
            }
        };

        tracing::info!(user = %user, lists = lists.len(), ?outcome, "board loaded");
        self.board = Some(LoadedBoard { user, key, lists });
        outcome
    }

    /// Discards the in-memory board. Storage is left untouched.
    pub fn unload(&mut self) {
        if let Some(board) = self.board.take() {
            tracing::info!(user = %board.user, "board unloaded");
        }
    }

    /// The user whose board is loaded, if any.
    #[must_use]
    pub fn user(&self) -> Option<&UserId> {
        self.board.as_ref().map(|b| &b.user)
    }

    /// Whether a board is loaded.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.board.is_some()
    }

    /// All lists in display order. Empty when no board is loaded.
    #[must_use]
    pub fn lists(&self) -> &[TaskList] {
        match &self.board {
            Some(board) => &board.lists,
            None => &[],
        }
    }

    /// Looks up a list by id.
    #[must_use]
    pub fn list(&self, list_id: &ListId) -> Option<&TaskList> {
        self.lists().iter().find(|l| &l.id == list_id)
    }

    /// Looks up a task within a list.
    #[must_use]
    pub fn task(&self, list_id: &ListId, task_id: &TaskId) -> Option<&Task> {
        self.list(list_id)?.task(task_id)
    }

    /// Number of writes that failed since the store was created.
    #[must_use]
    pub const fn persist_failures(&self) -> u64 {
        self.persist_failures
    }

    /// The limits applied to list names and task titles.
    #[must_use]
    pub const fn limits(&self) -> BoardLimits {
        self.limits
    }

    /// The underlying storage handle.
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Appends a new, empty list.
    ///
    /// The name is stored trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NoActiveUser`], [`BoardError::NameEmpty`], or
    /// [`BoardError::NameTooLong`].
    pub fn add_list(&mut self, name: &str) -> Result<ListId, BoardError> {
        let max = self.limits.max_list_name_len;
        let board = self.board_mut()?;
        let name = validate_text(name, max, BoardError::NameEmpty, BoardError::NameTooLong)?;

        let list = TaskList::new(ListId::generate(), name);
        let id = list.id.clone();
        board.lists.push(list);
        tracing::debug!(list_id = %id, "list added");

        self.persist();
        Ok(id)
    }

    /// Appends a new, incomplete task to a list.
    ///
    /// The title is stored trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NoActiveUser`], [`BoardError::ListNotFound`],
    /// [`BoardError::TitleEmpty`], or [`BoardError::TitleTooLong`].
    pub fn add_task(&mut self, list_id: &ListId, title: &str) -> Result<TaskId, BoardError> {
        let max = self.limits.max_task_title_len;
        let board = self.board_mut()?;
        let list = find_list_mut(&mut board.lists, list_id)?;
        let title = validate_text(title, max, BoardError::TitleEmpty, BoardError::TitleTooLong)?;

        let task = Task::new(TaskId::generate(), list_id.clone(), title);
        let id = task.id.clone();
        list.tasks.push(task);
        tracing::debug!(list_id = %list_id, task_id = %id, "task added");

        self.persist();
        Ok(id)
    }

    /// Replaces a task wholesale, keeping its position in the list.
    ///
    /// The task is matched by `task.id` inside the list named by
    /// `task.list_id`. The title is stored trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NoActiveUser`], [`BoardError::ListNotFound`],
    /// [`BoardError::TaskNotFound`], [`BoardError::TitleEmpty`], or
    /// [`BoardError::TitleTooLong`].
    pub fn update_task(&mut self, task: Task) -> Result<(), BoardError> {
        let max = self.limits.max_task_title_len;
        let board = self.board_mut()?;
        let list = find_list_mut(&mut board.lists, &task.list_id)?;
        let slot = list
            .tasks
            .iter_mut()
            .find(|t| t.id == task.id)
            .ok_or_else(|| BoardError::TaskNotFound(task.id.to_string()))?;
        let title = validate_text(
            &task.title,
            max,
            BoardError::TitleEmpty,
            BoardError::TitleTooLong,
        )?
        .to_string();

        tracing::debug!(list_id = %task.list_id, task_id = %task.id, "task updated");
        *slot = Task { title, ..task };

        self.persist();
        Ok(())
    }

    /// Flips a task's completion flag and returns the new value.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NoActiveUser`], [`BoardError::ListNotFound`],
    /// or [`BoardError::TaskNotFound`].
    pub fn toggle_complete(
        &mut self,
        task_id: &TaskId,
        list_id: &ListId,
    ) -> Result<bool, BoardError> {
        let board = self.board_mut()?;
        let task = find_task_mut(&mut board.lists, list_id, task_id)?;
        task.is_completed = !task.is_completed;
        let now_completed = task.is_completed;
        tracing::debug!(task_id = %task_id, completed = now_completed, "task toggled");

        self.persist();
        Ok(now_completed)
    }

    /// Moves a task to the end of another list.
    ///
    /// Moving within the same list is a no-op. The task keeps its id and
    /// fields; only `list_id` changes. Moving back does not restore the
    /// original position.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NoActiveUser`], [`BoardError::ListNotFound`] if
    /// either list is missing, or [`BoardError::TaskNotFound`] if the task
    /// is not in the source list.
    pub fn move_task(
        &mut self,
        task_id: &TaskId,
        source: &ListId,
        dest: &ListId,
    ) -> Result<(), BoardError> {
        let board = self.board_mut()?;
        if source == dest {
            return Ok(());
        }

        let src_idx = list_index(&board.lists, source)?;
        let dest_idx = list_index(&board.lists, dest)?;
        let pos = board.lists[src_idx]
            .position(task_id)
            .ok_or_else(|| BoardError::TaskNotFound(task_id.to_string()))?;

        let mut task = board.lists[src_idx].tasks.remove(pos);
        task.list_id = dest.clone();
        board.lists[dest_idx].tasks.push(task);
        tracing::debug!(task_id = %task_id, from = %source, to = %dest, "task moved");

        self.persist();
        Ok(())
    }

    /// Removes a task from a list.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NoActiveUser`], [`BoardError::ListNotFound`],
    /// or [`BoardError::TaskNotFound`].
    pub fn delete_task(&mut self, list_id: &ListId, task_id: &TaskId) -> Result<(), BoardError> {
        let board = self.board_mut()?;
        let list = find_list_mut(&mut board.lists, list_id)?;
        let pos = list
            .position(task_id)
            .ok_or_else(|| BoardError::TaskNotFound(task_id.to_string()))?;
        list.tasks.remove(pos);
        tracing::debug!(list_id = %list_id, task_id = %task_id, "task deleted");

        self.persist();
        Ok(())
    }

    /// Removes a list together with all of its tasks.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NoActiveUser`] or [`BoardError::ListNotFound`].
    pub fn delete_list(&mut self, list_id: &ListId) -> Result<(), BoardError> {
        let board = self.board_mut()?;
        let idx = list_index(&board.lists, list_id)?;
        let removed = board.lists.remove(idx);
        tracing::debug!(list_id = %list_id, tasks = removed.tasks.len(), "list deleted");

        self.persist();
        Ok(())
    }

    fn board_mut(&mut self) -> Result<&mut LoadedBoard, BoardError> {
        self.board.as_mut().ok_or(BoardError::NoActiveUser)
    }

    /// Writes the loaded board under its user's key.
    fn persist(&mut self) {
        let Some(board) = &self.board else {
            return;
        };
        let result = encode_lists(&board.lists)
            .map_err(|e| e.to_string())
            .and_then(|text| {
                self.storage
                    .write(&board.key, &text)
                    .map_err(|e| e.to_string())
            });
        if let Err(error) = result {
            self.persist_failures += 1;
            tracing::warn!(
                user = %board.user,
                key = %board.key,
                %error,
                "board write failed, changes kept in memory only"
            );
        }
    }
}

/// Trims `text` and checks it against the empty and length limits.
fn validate_text(
    text: &str,
    max_chars: usize,
    empty: BoardError,
    too_long: fn(usize) -> BoardError,
) -> Result<&str, BoardError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(empty);
    }
    if trimmed.chars().count() > max_chars {
        return Err(too_long(max_chars));
    }
    Ok(trimmed)
}

fn list_index(lists: &[TaskList], list_id: &ListId) -> Result<usize, BoardError> {
    lists
        .iter()
        .position(|l| &l.id == list_id)
        .ok_or_else(|| BoardError::ListNotFound(list_id.to_string()))
}

fn find_list_mut<'a>(
    lists: &'a mut [TaskList],
    list_id: &ListId,
) -> Result<&'a mut TaskList, BoardError> {
    lists
        .iter_mut()
        .find(|l| &l.id == list_id)
        .ok_or_else(|| BoardError::ListNotFound(list_id.to_string()))
}

fn find_task_mut<'a>(
    lists: &'a mut [TaskList],
    list_id: &ListId,
    task_id: &TaskId,
) -> Result<&'a mut Task, BoardError> {
    find_list_mut(lists, list_id)?
        .tasks
        .iter_mut()
        .find(|t| &t.id == task_id)
        .ok_or_else(|| BoardError::TaskNotFound(task_id.to_string()))
}

/// Stand-in for a stored list name that is blank.
const UNTITLED_LIST: &str = "Untitled list";

/// Stand-in for a stored task title that is blank.
const UNTITLED_TASK: &str = "Untitled task";

/// Restores board invariants on a decoded snapshot.
///
/// Tasks are re-homed to the list that contains them; repeated list or task
/// ids keep their first occurrence. Blank list names and task titles are
/// replaced with a placeholder so their contents stay reachable. Returns
/// the repaired lists and the number of repairs.
fn repair(lists: Vec<TaskList>) -> (Vec<TaskList>, usize) {
    let mut repaired = 0;
    let mut seen_lists = HashSet::new();
    let mut seen_tasks = HashSet::new();
    let mut out = Vec::with_capacity(lists.len());

    for mut list in lists {
        if !seen_lists.insert(list.id.clone()) {
            tracing::warn!(list_id = %list.id, "dropping list with duplicate id");
            repaired += 1;
            continue;
        }
        if list.name.trim().is_empty() {
            tracing::warn!(list_id = %list.id, "renaming list with blank name");
            list.name = UNTITLED_LIST.to_string();
            repaired += 1;
        }
        let list_id = list.id.clone();
        list.tasks.retain_mut(|task| {
            if !seen_tasks.insert(task.id.clone()) {
                tracing::warn!(task_id = %task.id, "dropping task with duplicate id");
                repaired += 1;
                return false;
            }
            if task.list_id != list_id {
                tracing::warn!(
                    task_id = %task.id,
                    stored = %task.list_id,
                    actual = %list_id,
                    "re-homing task to its containing list"
                );
                task.list_id = list_id.clone();
                repaired += 1;
            }
            if task.title.trim().is_empty() {
                tracing::warn!(task_id = %task.id, "renaming task with blank title");
                task.title = UNTITLED_TASK.to_string();
                repaired += 1;
            }
            true
        });
        out.push(list);
    }

    (out, repaired)
}
