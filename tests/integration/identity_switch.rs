//! Integration tests for identity changes.
//!
//! Runs the shell against on-disk storage and checks that login, logout,
//! switching users, and changing the profile email each leave the board
//! showing exactly the signed-in user's lists, including across restarts.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::Path;
use std::sync::Arc;

use taskboard::app::{App, Command, LOGIN_PROMPT};
use taskboard::board::BoardLimits;
use taskboard::storage::{CURRENT_USER_KEY, FileStorage, KeyValueStore, lists_key};
use taskboard_proto::user::UserId;

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

fn start(dir: &Path) -> App<Arc<FileStorage>> {
    let storage = Arc::new(FileStorage::open(dir).unwrap());
    App::new(storage, BoardLimits::default())
}

/// Runs each line and returns the output of the last one.
fn run(app: &mut App<Arc<FileStorage>>, lines: &[&str]) -> Vec<String> {
    let mut out = Vec::new();
    for line in lines {
        out = app.handle_line(line);
    }
    out
}

fn list_names(app: &App<Arc<FileStorage>>) -> Vec<String> {
    app.board().lists().iter().map(|l| l.name.clone()).collect()
}

// ===========================================================================
// Login / logout
// ===========================================================================

#[test]
fn fresh_start_is_logged_out() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = start(dir.path());
    assert!(app.session().current().is_none());
    assert_eq!(app.execute(Command::Show), vec![LOGIN_PROMPT.to_string()]);
}

#[test]
fn login_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut app = start(dir.path());
        run(&mut app, &["signup ada@example.com Ada", "new-list Work", "add 1 Plan"]);
    }

    let app = start(dir.path());
    assert_eq!(app.session().user_id(), Some(UserId::from("ada@example.com")));
    assert_eq!(list_names(&app), ["Work"]);
    assert_eq!(app.board().lists()[0].tasks[0].title, "Plan");
}

#[test]
fn logout_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut app = start(dir.path());
        run(&mut app, &["login ada@example.com", "new-list Work", "logout"]);
        assert!(!app.board().is_loaded());
    }

    let app = start(dir.path());
    assert!(app.session().current().is_none());
    assert!(!app.board().is_loaded());

    // The board itself is kept for the next login.
    let storage = FileStorage::open(dir.path()).unwrap();
    assert!(storage.read(CURRENT_USER_KEY).unwrap().is_none());
    assert!(
        storage
            .read(&lists_key(&UserId::from("ada@example.com")))
            .unwrap()
            .is_some()
    );
}

#[test]
fn failed_login_keeps_previous_user() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = start(dir.path());
    run(&mut app, &["login ada@example.com", "new-list Work"]);

    let out = app.handle_line("login not-an-email");
    assert!(out[0].starts_with("Login failed"));
    assert_eq!(app.board().user(), Some(&UserId::from("ada@example.com")));
    assert_eq!(list_names(&app), ["Work"]);
}

// ===========================================================================
// Switching users
// ===========================================================================

#[test]
fn switching_users_never_mixes_boards() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = start(dir.path());

    run(&mut app, &["login ada@example.com", "new-list Ada work"]);
    run(&mut app, &["login bob@example.com"]);
    assert!(list_names(&app).is_empty());
    run(&mut app, &["new-list Bob work", "new-list Bob home"]);

    run(&mut app, &["logout", "login ada@example.com"]);
    assert_eq!(list_names(&app), ["Ada work"]);

    run(&mut app, &["login bob@example.com"]);
    assert_eq!(list_names(&app), ["Bob work", "Bob home"]);
}

#[test]
fn edits_after_switch_go_to_new_users_key() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = start(dir.path());
    run(&mut app, &["login ada@example.com", "new-list Shared name"]);
    run(&mut app, &["login bob@example.com", "new-list Shared name", "add 1 Bob's task"]);

    let storage = FileStorage::open(dir.path()).unwrap();
    let ada = storage
        .read(&lists_key(&UserId::from("ada@example.com")))
        .unwrap()
        .unwrap();
    assert!(!ada.contains("Bob's task"));
}

// ===========================================================================
// Profile updates
// ===========================================================================

#[test]
fn changing_email_moves_to_new_key_without_migrating() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = start(dir.path());
    run(&mut app, &["login ada@example.com", "new-list Old lists"]);

    let out = run(&mut app, &["profile lovelace@example.com Ada Lovelace"]);
    assert_eq!(out, ["Profile updated successfully!"]);
    assert_eq!(
        app.board().user(),
        Some(&UserId::from("lovelace@example.com"))
    );
    assert!(list_names(&app).is_empty());

    // Switching back finds the original board untouched.
    run(&mut app, &["profile ada@example.com"]);
    assert_eq!(list_names(&app), ["Old lists"]);
}

#[test]
fn changing_name_only_keeps_board_loaded() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = start(dir.path());
    run(&mut app, &["login ada@example.com", "new-list Work", "add 1 Keep"]);

    run(&mut app, &["profile ada@example.com Countess"]);
    assert_eq!(list_names(&app), ["Work"]);
    assert_eq!(
        app.handle_line("whoami"),
        ["Countess <ada@example.com>"]
    );
}

#[test]
fn profile_requires_login() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = start(dir.path());
    let out = app.handle_line("profile ada@example.com");
    assert!(out[0].starts_with("Profile update failed"));
    assert!(!app.board().is_loaded());
}
