//! Tests for optimistic interaction state.

use rstest::rstest;

use super::*;

fn item(raw: &str) -> ItemId {
    ItemId::new(raw).expect("valid item id")
}

fn like(raw: &str) -> InteractionKey {
    (item(raw), InteractionKind::Like)
}

fn snapshot(raw: &str, kind: InteractionKind, active: bool, count: u64) -> InteractionSnapshot {
    InteractionSnapshot {
        item: item(raw),
        kind,
        state: ServerState { active, count },
    }
}

#[rstest]
#[case(false, 5, Some(true), true, 6)]
#[case(true, 5, Some(false), false, 4)]
#[case(true, 5, Some(true), true, 5)]
#[case(false, 5, Some(false), false, 5)]
#[case(true, 0, Some(false), false, 0)]
#[case(false, 3, None, false, 3)]
#[case(true, 3, None, true, 3)]
fn view_follows_counter_formula(
    #[case] server_active: bool,
    #[case] server_count: u64,
    #[case] local_override: Option<bool>,
    #[case] expected_active: bool,
    #[case] expected_count: u64,
) {
    let state = InteractionState {
        server: ServerState {
            active: server_active,
            count: server_count,
        },
        local_override,
    };
    assert_eq!(
        state.view(),
        InteractionView {
            active: expected_active,
            count: expected_count,
        }
    );
}

#[test]
fn counter_never_negative_for_any_toggle_sequence() {
    // Every toggle/reconcile interleaving up to eight steps from a zero state.
    for mask in 0_u32..(1 << 8) {
        let mut state = InteractionState::new(ServerState::default());
        for step in 0..8 {
            if mask & (1 << step) == 0 {
                state.toggle();
            } else {
                state.reconcile(ServerState::default());
            }
            let view = state.view();
            assert!(view.count <= 1, "count drifted: {view:?} (mask {mask:#b})");
        }
    }
}

#[rstest]
#[case(ServerState { active: false, count: 0 })]
#[case(ServerState { active: true, count: 1 })]
#[case(ServerState { active: false, count: 12 })]
#[case(ServerState { active: true, count: 0 })]
fn double_toggle_cancels_out(#[case] server: ServerState) {
    let untouched = InteractionState::new(server).view();

    let mut state = InteractionState::new(server);
    state.toggle();
    state.toggle();

    assert_eq!(state.view(), untouched);
}

#[test]
fn inconsistent_server_state_still_clamps_to_zero() {
    let mut state = InteractionState::new(ServerState {
        active: true,
        count: 0,
    });
    state.toggle();
    assert_eq!(state.view().count, 0);
}

#[test]
fn revert_restores_previous_override() {
    let mut state = InteractionState::new(ServerState {
        active: false,
        count: 2,
    });
    let pending = state.toggle();
    assert_eq!(state.view().count, 3);

    assert!(state.revert(pending));
    assert_eq!(state.local_override(), None);
    assert_eq!(state.view().count, 2);
}

#[test]
fn revert_is_skipped_after_a_newer_toggle() {
    let mut state = InteractionState::new(ServerState {
        active: false,
        count: 2,
    });
    let first = state.toggle();
    state.toggle();

    assert!(!state.revert(first), "stale revert must not apply");
    assert_eq!(state.local_override(), Some(false));
}

#[test]
fn board_tracks_unknown_items_from_zero() {
    let mut board = InteractionBoard::new();
    let pending = board.toggle(like("p1"));

    assert!(pending.desired);
    assert_eq!(
        board.view(&like("p1")),
        InteractionView {
            active: true,
            count: 1,
        }
    );
    assert_eq!(
        board.view(&like("p2")),
        InteractionView {
            active: false,
            count: 0,
        }
    );
}

#[test]
fn reconcile_supersedes_overrides_and_drops_missing_items() {
    let mut board = InteractionBoard::new();
    board.reconcile([
        snapshot("p1", InteractionKind::Like, false, 4),
        snapshot("p2", InteractionKind::Like, false, 1),
    ]);
    board.toggle(like("p1"));
    board.toggle(like("p2"));

    board.reconcile([snapshot("p1", InteractionKind::Like, true, 5)]);

    assert_eq!(board.len(), 1);
    let state = board.state(&like("p1")).expect("p1 tracked");
    assert_eq!(state.local_override(), None);
    assert_eq!(
        state.view(),
        InteractionView {
            active: true,
            count: 5,
        }
    );
    assert!(board.state(&like("p2")).is_none(), "p2 override is garbage");
}

#[test]
fn kinds_on_the_same_item_are_independent() {
    let mut board = InteractionBoard::new();
    board.reconcile([
        snapshot("p1", InteractionKind::Like, false, 0),
        snapshot("p1", InteractionKind::Repost, false, 7),
    ]);
    board.toggle((item("p1"), InteractionKind::Repost));

    assert_eq!(board.view(&like("p1")).count, 0);
    assert_eq!(board.view(&(item("p1"), InteractionKind::Repost)).count, 8);
}

#[rstest]
#[case("", ItemIdValidationError::Empty)]
#[case("a/b", ItemIdValidationError::InvalidCharacters)]
#[case("a b", ItemIdValidationError::InvalidCharacters)]
#[case("a?x=1", ItemIdValidationError::InvalidCharacters)]
fn item_ids_reject_path_breaking_input(
    #[case] raw: &str,
    #[case] expected: ItemIdValidationError,
) {
    assert_eq!(ItemId::new(raw).expect_err("must fail"), expected);
}

#[test]
fn item_ids_deserialise_from_numbers_and_strings() {
    let ids: Vec<ItemId> = serde_json::from_str(r#"["abc", 42]"#).expect("ids decode");
    assert_eq!(ids, vec![item("abc"), item("42")]);
}
