//! Panel rendering with RenderHarness.

use tui_dispatch::testing::*;
use tui_dispatch_components::SelectList;

use poketeam::{
    action::Action,
    error::{ApiError, CatalogError},
    reducer::reducer,
    state::{AppState, EntityRef},
    stats::StatsRecord,
    toast::{ToastAction, UndoCommand},
    ui::{catalog_status_text, render_stats_panel, render_team_list, render_toast},
};

fn state_with_team() -> AppState {
    let mut state = AppState::default();
    state.team.add(EntityRef::from_catalog(25, "pikachu"));
    state.team.add(EntityRef::from_catalog(122, "mr-mime"));
    state
}

#[test]
fn test_render_team_list() {
    let mut render = RenderHarness::new(40, 8);
    let mut list = SelectList::new();
    let state = state_with_team();

    let output = render.render_to_string_plain(|frame| {
        render_team_list(frame, frame.area(), &state, &mut list);
    });

    assert!(output.contains("TEAM 2/6"), "header missing:\n{output}");
    assert!(output.contains("1. #025 Pikachu"));
    assert!(output.contains("2. #122 Mr Mime"));
}

#[test]
fn test_render_empty_team_hint() {
    let mut render = RenderHarness::new(60, 8);
    let mut list = SelectList::new();
    let state = AppState::default();

    let output = render.render_to_string_plain(|frame| {
        render_team_list(frame, frame.area(), &state, &mut list);
    });

    assert!(output.contains("TEAM 0/6"));
    assert!(output.contains("No team members yet"));
}

#[test]
fn test_render_stats_for_selected_member() {
    let mut render = RenderHarness::new(40, 10);
    let mut state = state_with_team();
    state.stats.complete(
        25,
        StatsRecord::from([("hp".to_string(), 35), ("speed".to_string(), 90)]),
    );

    let output = render.render_to_string_plain(|frame| {
        render_stats_panel(frame, frame.area(), &state);
    });

    assert!(output.contains("STATS  Pikachu"));
    assert!(output.contains("HP  35"));
    assert!(output.contains("SPD  90"));
}

#[test]
fn test_render_stats_pending() {
    let mut render = RenderHarness::new(40, 6);
    let mut state = state_with_team();
    state.stats.begin(25);

    let output = render.render_to_string_plain(|frame| {
        render_stats_panel(frame, frame.area(), &state);
    });

    assert!(output.contains("Loading stats..."));
}

#[test]
fn test_failed_stats_fetch_redraws_without_pending_marker() {
    let mut render = RenderHarness::new(40, 8);
    let mut list = SelectList::new();
    let mut state = AppState::default();
    reducer(
        &mut state,
        Action::TeamAdd(EntityRef::from_catalog(4, "charmander")),
    );

    let before = render.render_to_string_plain(|frame| {
        render_team_list(frame, frame.area(), &state, &mut list);
    });
    assert!(before.contains("1. #004 Charmander …"), "pending row:\n{before}");

    let result = reducer(
        &mut state,
        Action::StatsDidError {
            id: 4,
            error: "timeout".into(),
        },
    );
    assert!(result.changed, "cleared marker must trigger a redraw");

    let after = render.render_to_string_plain(|frame| {
        render_team_list(frame, frame.area(), &state, &mut list);
    });
    assert!(after.contains("1. #004 Charmander"));
    assert!(!after.contains("…"), "stale marker:\n{after}");
}

#[test]
fn test_render_visible_toast_with_undo() {
    let mut render = RenderHarness::new(60, 3);
    let mut state = AppState::default();
    let generation = state.toast.notify(
        "Pikachu removed from team",
        Some(ToastAction::undo(UndoCommand::RestoreEntity(
            EntityRef::from_catalog(25, "pikachu"),
        ))),
    );
    state.toast.reveal(generation);

    let output = render.render_to_string_plain(|frame| {
        render_toast(frame, frame.area(), &state);
    });

    assert!(output.contains("Pikachu removed from team"));
    assert!(output.contains("[u] Undo"));
}

#[test]
fn test_hidden_toast_draws_nothing() {
    let mut render = RenderHarness::new(60, 3);
    let mut state = AppState::default();
    state.toast.notify("Pikachu added to team", None);

    let output = render.render_to_string_plain(|frame| {
        render_toast(frame, frame.area(), &state);
    });

    assert!(!output.contains("Pikachu"));
}

#[test]
fn test_catalog_error_text() {
    let state = AppState {
        catalog_error: Some(CatalogError::from(ApiError::Status {
            url: "http://x/pokemon".into(),
            status: 503,
        })),
        ..Default::default()
    };
    let text = catalog_status_text(&state).to_string();
    assert!(text.contains("Fetching Pokédex Failed (503)"));
    assert!(text.contains("http://x/pokemon returned HTTP 503"));
}
