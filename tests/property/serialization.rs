//! Property-based tests for the persisted board format.
//!
//! Uses proptest to verify:
//! 1. Any valid list snapshot survives encode → decode unchanged.
//! 2. Any valid user profile survives encode → decode unchanged.
//! 3. Arbitrary text never causes a panic in `decode_lists` or `decode_profile`.

use proptest::prelude::*;
use taskboard_proto::board::{ListId, Task, TaskId, TaskList};
use taskboard_proto::codec;
use taskboard_proto::user::UserProfile;

// --- Strategies ---

/// Strategy for non-empty display text (titles, names).
fn arb_display_text() -> impl Strategy<Value = String> {
    "[^\x00]{1,64}"
}

/// Strategy for optional free text; includes the empty string.
fn arb_free_text() -> impl Strategy<Value = Option<String>> {
    prop::option::of("[^\x00]{0,64}")
}

/// Strategy for a task owned by `list_id`, with a unique suffix `n`.
fn arb_task(list_id: ListId, n: usize) -> impl Strategy<Value = Task> {
    (
        arb_display_text(),
        arb_free_text(),
        arb_free_text(),
        any::<bool>(),
    )
        .prop_map(move |(title, details, due_date, is_completed)| Task {
            id: TaskId::new(format!("{list_id}-task-{n}")),
            title,
            details,
            due_date,
            is_completed,
            list_id: list_id.clone(),
        })
}

/// Strategy for a list whose tasks all reference it.
fn arb_list(n: usize) -> impl Strategy<Value = TaskList> {
    let id = ListId::new(format!("list-{n}"));
    (arb_display_text(), 0..6usize).prop_flat_map(move |(name, count)| {
        let id = id.clone();
        let tasks: Vec<_> = (0..count).map(|i| arb_task(id.clone(), i)).collect();
        tasks.prop_map(move |tasks| TaskList {
            id: id.clone(),
            name: name.clone(),
            tasks,
        })
    })
}

/// Strategy for a whole board snapshot.
fn arb_snapshot() -> impl Strategy<Value = Vec<TaskList>> {
    (0..5usize).prop_flat_map(|count| (0..count).map(arb_list).collect::<Vec<_>>())
}

/// Strategy for user profiles.
fn arb_profile() -> impl Strategy<Value = UserProfile> {
    ("[a-z0-9.]{1,16}@[a-z]{1,10}\\.[a-z]{2,4}", prop::option::of(arb_display_text()))
        .prop_map(|(email, name)| UserProfile { email, name })
}

// --- Property tests ---

proptest! {
    /// Any valid snapshot survives an encode → decode round-trip.
    #[test]
    fn snapshot_round_trip(lists in arb_snapshot()) {
        let text = codec::encode_lists(&lists).expect("encode should succeed");
        let decoded = codec::decode_lists(&text).expect("decode should succeed");
        prop_assert_eq!(lists, decoded);
    }

    /// Any valid profile survives an encode → decode round-trip.
    #[test]
    fn profile_round_trip(profile in arb_profile()) {
        let text = codec::encode_profile(&profile).expect("encode should succeed");
        let decoded = codec::decode_profile(&text).expect("decode should succeed");
        prop_assert_eq!(profile, decoded);
    }

    /// Arbitrary text never causes a panic when decoded as a snapshot.
    #[test]
    fn random_text_decode_lists_no_panic(text in ".{0,512}") {
        let _ = codec::decode_lists(&text);
    }

    /// Arbitrary text never causes a panic when decoded as a profile.
    #[test]
    fn random_text_decode_profile_no_panic(text in ".{0,256}") {
        let _ = codec::decode_profile(&text);
    }
}
