//! Integration tests for board persistence.
//!
//! Drives `BoardStore` against on-disk `FileStorage` and checks that every
//! mutation survives a restart, that each user's board lives under its own
//! key, and that damaged data on disk never takes the board down.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::similar_names)]

use std::sync::Arc;

use taskboard::board::{BoardError, BoardLimits, BoardStore, ListView, LoadOutcome};
use taskboard::storage::{FileStorage, KeyValueStore, lists_key};
use taskboard_proto::board::{ListId, TaskId};
use taskboard_proto::codec::decode_lists;
use taskboard_proto::user::UserId;

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

fn ada() -> UserId {
    UserId::from("ada@example.com")
}

fn bob() -> UserId {
    UserId::from("bob@example.com")
}

/// Opens a store over `dir` with `user`'s board loaded.
fn open_board(dir: &std::path::Path, user: UserId) -> BoardStore<Arc<FileStorage>> {
    let storage = Arc::new(FileStorage::open(dir).unwrap());
    let mut board = BoardStore::new(storage, BoardLimits::default());
    board.load(user);
    board
}

fn titles(board: &BoardStore<Arc<FileStorage>>, list: usize) -> Vec<String> {
    board.lists()[list]
        .tasks
        .iter()
        .map(|t| t.title.clone())
        .collect()
}

// ===========================================================================
// Restart survival
// ===========================================================================

#[test]
fn board_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let (work, task) = {
        let mut board = open_board(dir.path(), ada());
        let work = board.add_list("Work").unwrap();
        board.add_list("Home").unwrap();
        let task = board.add_task(&work, "Write report").unwrap();
        board.add_task(&work, "File expenses").unwrap();
        board.toggle_complete(&task, &work).unwrap();
        (work, task)
    };

    let mut board = BoardStore::new(
        Arc::new(FileStorage::open(dir.path()).unwrap()),
        BoardLimits::default(),
    );
    assert_eq!(board.load(ada()), LoadOutcome::Restored { repaired: 0 });

    let names: Vec<_> = board.lists().iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, ["Work", "Home"]);
    assert_eq!(titles(&board, 0), ["Write report", "File expenses"]);
    assert!(board.task(&work, &task).unwrap().is_completed);
}

#[test]
fn every_mutation_is_written_through() {
    let dir = tempfile::tempdir().unwrap();
    let mut board = open_board(dir.path(), ada());
    let key = lists_key(&ada());

    let stored = |board: &BoardStore<Arc<FileStorage>>| {
        let text = board.storage().read(&key).unwrap().unwrap();
        decode_lists(&text).unwrap()
    };

    let work = board.add_list("Work").unwrap();
    assert_eq!(stored(&board).len(), 1);

    let task = board.add_task(&work, "Draft").unwrap();
    assert_eq!(stored(&board)[0].tasks.len(), 1);

    let mut edited = board.task(&work, &task).unwrap().clone();
    edited.details = Some("two pages".to_string());
    edited.due_date = Some("2024-06-01".to_string());
    board.update_task(edited).unwrap();
    let snapshot = stored(&board);
    assert_eq!(snapshot[0].tasks[0].details.as_deref(), Some("two pages"));
    assert_eq!(snapshot[0].tasks[0].due_date.as_deref(), Some("2024-06-01"));

    board.delete_task(&work, &task).unwrap();
    assert!(stored(&board)[0].tasks.is_empty());

    board.delete_list(&work).unwrap();
    assert!(stored(&board).is_empty());
    assert_eq!(board.persist_failures(), 0);
}

#[test]
fn move_is_persisted_atomically() {
    let dir = tempfile::tempdir().unwrap();
    let (todo, done, task) = {
        let mut board = open_board(dir.path(), ada());
        let todo = board.add_list("Todo").unwrap();
        let done = board.add_list("Done").unwrap();
        board.add_task(&done, "Earlier").unwrap();
        let task = board.add_task(&todo, "Ship it").unwrap();
        board.move_task(&task, &todo, &done).unwrap();
        (todo, done, task)
    };

    let board = open_board(dir.path(), ada());
    assert!(board.list(&todo).unwrap().tasks.is_empty());
    let moved = board.list(&done).unwrap();
    assert_eq!(moved.tasks.len(), 2);
    assert_eq!(moved.tasks[1].id, task);
    assert_eq!(moved.tasks[1].list_id, done);
}

// ===========================================================================
// Per-user isolation
// ===========================================================================

#[test]
fn users_do_not_see_each_others_lists() {
    let dir = tempfile::tempdir().unwrap();
    let mut board = open_board(dir.path(), ada());
    board.add_list("Ada only").unwrap();

    board.load(bob());
    assert!(board.lists().is_empty());
    board.add_list("Bob only").unwrap();

    board.load(ada());
    assert_eq!(board.lists().len(), 1);
    assert_eq!(board.lists()[0].name, "Ada only");

    let storage = board.storage();
    assert!(storage.read(&lists_key(&ada())).unwrap().is_some());
    assert!(storage.read(&lists_key(&bob())).unwrap().is_some());
}

#[test]
fn unload_keeps_stored_board() {
    let dir = tempfile::tempdir().unwrap();
    let mut board = open_board(dir.path(), ada());
    board.add_list("Work").unwrap();
    board.unload();

    assert!(!board.is_loaded());
    assert!(board.lists().is_empty());
    assert_eq!(board.add_list("Nope"), Err(BoardError::NoActiveUser));

    board.load(ada());
    assert_eq!(board.lists().len(), 1);
}

// ===========================================================================
// Damaged data
// ===========================================================================

#[test]
fn corrupt_file_loads_empty_and_is_replaced_on_next_write() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(FileStorage::open(dir.path()).unwrap());
    storage.write(&lists_key(&ada()), "{ not a board").unwrap();

    let mut board = BoardStore::new(Arc::clone(&storage), BoardLimits::default());
    assert_eq!(board.load(ada()), LoadOutcome::Recovered);
    assert!(board.lists().is_empty());

    board.add_list("Fresh start").unwrap();
    let text = storage.read(&lists_key(&ada())).unwrap().unwrap();
    assert_eq!(decode_lists(&text).unwrap()[0].name, "Fresh start");
}

#[test]
fn browser_format_is_readable() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(FileStorage::open(dir.path()).unwrap());
    storage
        .write(
            &lists_key(&ada()),
            r#"[{"id":"list-1","name":"Groceries","tasks":[
                {"id":"task-1","title":"Milk","isCompleted":true,"listId":"list-1"},
                {"id":"task-2","title":"Bread","details":"rye","isCompleted":false,"listId":"list-1"}
            ]}]"#,
        )
        .unwrap();

    let mut board = BoardStore::new(storage, BoardLimits::default());
    assert_eq!(board.load(ada()), LoadOutcome::Restored { repaired: 0 });

    let list = board.list(&ListId::from("list-1")).unwrap();
    let view = ListView::of(list);
    let order: Vec<_> = view.display_order().map(|t| t.title.as_str()).collect();
    assert_eq!(order, ["Bread", "Milk"]);
    assert_eq!(
        board
            .task(&ListId::from("list-1"), &TaskId::from("task-2"))
            .unwrap()
            .details
            .as_deref(),
        Some("rye")
    );
}

#[test]
fn duplicate_ids_on_disk_are_repaired() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(FileStorage::open(dir.path()).unwrap());
    storage
        .write(
            &lists_key(&ada()),
            r#"[
                {"id":"L1","name":"One","tasks":[
                    {"id":"T1","title":"a","isCompleted":false,"listId":"L1"},
                    {"id":"T1","title":"dup","isCompleted":false,"listId":"L1"}
                ]},
                {"id":"L1","name":"Shadow","tasks":[]}
            ]"#,
        )
        .unwrap();

    let mut board = BoardStore::new(storage, BoardLimits::default());
    assert_eq!(board.load(ada()), LoadOutcome::Restored { repaired: 2 });
    assert_eq!(board.lists().len(), 1);
    assert_eq!(titles(&board, 0), ["a"]);
}

// ===========================================================================
// Failed operations leave disk untouched
// ===========================================================================

#[test]
fn rejected_operations_do_not_write() {
    let dir = tempfile::tempdir().unwrap();
    let mut board = open_board(dir.path(), ada());
    let work = board.add_list("Work").unwrap();
    let key = lists_key(&ada());
    let before = board.storage().read(&key).unwrap();

    assert_eq!(board.add_list("   "), Err(BoardError::NameEmpty));
    assert_eq!(board.add_task(&work, ""), Err(BoardError::TitleEmpty));
    assert!(matches!(
        board.add_task(&ListId::from("missing"), "x"),
        Err(BoardError::ListNotFound(_))
    ));
    assert!(matches!(
        board.toggle_complete(&TaskId::from("missing"), &work),
        Err(BoardError::TaskNotFound(_))
    ));
    assert!(matches!(
        board.delete_list(&ListId::from("missing")),
        Err(BoardError::ListNotFound(_))
    ));

    assert_eq!(board.storage().read(&key).unwrap(), before);
}
