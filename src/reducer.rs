use tui_dispatch::DispatchResult;

use crate::action::Action;
use crate::effect::Effect;
use crate::persist::Session;
use crate::state::{AppState, EntityRef};
use crate::team::AddOutcome;
use crate::toast::{ToastAction, UndoCommand};

pub fn reducer(state: &mut AppState, action: Action) -> DispatchResult<Effect> {
    match action {
        Action::Init => {
            state.catalog_loading = true;
            state.catalog_error = None;
            let mut effects = vec![Effect::LoadCatalog];
            effects.extend(ensure_team_stats(state));
            DispatchResult::changed_with_many(effects)
        }

        Action::CatalogDidLoad(entries) => {
            tracing::info!(count = entries.len(), "catalog loaded");
            state.catalog = entries;
            state.catalog_loading = false;
            state.catalog_error = None;
            state.selected_index = 0;
            state.rebuild_filtered();
            DispatchResult::changed()
        }

        Action::CatalogDidError(error) => {
            state.catalog_loading = false;
            state.catalog_error = Some(error);
            DispatchResult::changed()
        }

        Action::FocusNext => {
            state.focus_next();
            DispatchResult::changed()
        }

        Action::FocusSet(area) => {
            if state.focus == area {
                return DispatchResult::unchanged();
            }
            state.focus = area;
            DispatchResult::changed()
        }

        Action::SelectionMove(delta) => {
            let index = (state.selected_index as i64 + delta as i64).max(0);
            changed_if(state.set_selected_index(index as usize))
        }

        Action::DexSelect(index) => changed_if(state.set_selected_index(index)),

        Action::SelectionPage(delta) => {
            let page = list_page_size(state) as i64;
            let index = (state.selected_index as i64 + delta as i64 * page).max(0);
            changed_if(state.set_selected_index(index as usize))
        }

        Action::SelectionJumpTop => changed_if(state.set_selected_index(0)),

        Action::SelectionJumpBottom => {
            let last = state.filtered_indices.len().saturating_sub(1);
            changed_if(state.set_selected_index(last))
        }

        Action::SearchStart => {
            state.search.active = true;
            state.search.query.clear();
            state.rebuild_filtered();
            DispatchResult::changed()
        }

        Action::SearchCancel => {
            if !state.search.active && state.search.query.is_empty() {
                return DispatchResult::unchanged();
            }
            state.search.active = false;
            state.search.query.clear();
            state.rebuild_filtered();
            DispatchResult::changed()
        }

        Action::SearchSubmit => {
            state.search.active = false;
            state.rebuild_filtered();
            DispatchResult::changed()
        }

        Action::SearchInput(ch) => {
            state.search.query.push(ch);
            state.rebuild_filtered();
            DispatchResult::changed()
        }

        Action::SearchBackspace => {
            if state.search.query.pop().is_none() {
                return DispatchResult::unchanged();
            }
            state.rebuild_filtered();
            DispatchResult::changed()
        }

        Action::TeamAdd(entity) => add_member(state, entity),

        Action::TeamRemove(id) => remove_member(state, id),

        Action::TeamToggle(entity) => {
            if state.team.contains(entity.id) {
                remove_member(state, entity.id)
            } else {
                add_member(state, entity)
            }
        }

        Action::TeamClear => {
            if state.team.is_empty() {
                return DispatchResult::unchanged();
            }
            let prior = state.team.take_all();
            state.team_selected = 0;
            let count = prior.len();
            let toast = notify(
                state,
                format!("Team cleared ({count} removed)"),
                Some(ToastAction::undo(UndoCommand::RestoreSequence(prior))),
            );
            DispatchResult::changed_with_many(vec![toast, save_session(state)])
        }

        Action::TeamSelect(index) => {
            if state.team.is_empty() {
                return DispatchResult::unchanged();
            }
            let bounded = index.min(state.team.len() - 1);
            if bounded == state.team_selected {
                return DispatchResult::unchanged();
            }
            state.team_selected = bounded;
            DispatchResult::changed()
        }

        Action::StatsDidLoad { id, stats } => {
            if !state.stats.complete(id, stats) {
                tracing::debug!(id, "stats already cached; keeping first record");
                return DispatchResult::unchanged();
            }
            tracing::debug!(id, "stats cached");
            DispatchResult::changed_with(save_session(state))
        }

        Action::StatsDidError { id, error } => {
            tracing::warn!(id, %error, "stats fetch failed");
            changed_if(state.stats.fail(id))
        }

        Action::ToastDidReveal { generation } => match state.toast.reveal(generation) {
            Some(after_ms) => DispatchResult::changed_with(Effect::DismissToastAfter {
                generation,
                after_ms,
            }),
            None => DispatchResult::unchanged(),
        },

        Action::ToastDidExpire { generation } => changed_if(state.toast.expire(generation)),

        Action::ToastUndo => match state.toast.take_command() {
            Some(UndoCommand::RestoreEntity(entity)) => add_member(state, entity),
            Some(UndoCommand::RestoreSequence(members)) => restore_team(state, members),
            None => DispatchResult::unchanged(),
        },

        Action::SessionDidSave => DispatchResult::unchanged(),

        Action::SessionDidError(error) => {
            tracing::warn!(%error, "session not saved");
            DispatchResult::unchanged()
        }

        Action::UiTerminalResize(width, height) => {
            if state.terminal_size != (width, height) {
                state.terminal_size = (width, height);
                DispatchResult::changed()
            } else {
                DispatchResult::unchanged()
            }
        }

        Action::Quit => DispatchResult::unchanged(),
    }
}

fn add_member(state: &mut AppState, entity: EntityRef) -> DispatchResult<Effect> {
    let id = entity.id;
    let name = entity.display_name();
    match state.team.add(entity) {
        AddOutcome::Full => {
            let toast = notify(state, "Team is full (max 6)", None);
            DispatchResult::changed_with(toast)
        }
        AddOutcome::AlreadyMember => DispatchResult::unchanged(),
        AddOutcome::Added => {
            let mut effects = vec![notify(state, format!("{name} added to team"), None)];
            effects.extend(ensure_stats(state, id));
            effects.push(save_session(state));
            DispatchResult::changed_with_many(effects)
        }
    }
}

fn remove_member(state: &mut AppState, id: u16) -> DispatchResult<Effect> {
    let Some(removed) = state.team.remove(id) else {
        return DispatchResult::unchanged();
    };
    state.clamp_team_selection();
    let toast = notify(
        state,
        format!("{} removed from team", removed.display_name()),
        Some(ToastAction::undo(UndoCommand::RestoreEntity(removed))),
    );
    DispatchResult::changed_with_many(vec![toast, save_session(state)])
}

fn restore_team(state: &mut AppState, members: Vec<EntityRef>) -> DispatchResult<Effect> {
    state.team.restore(members);
    state.clamp_team_selection();
    let mut effects = vec![notify(state, "Team restored", None)];
    effects.extend(ensure_team_stats(state));
    effects.push(save_session(state));
    DispatchResult::changed_with_many(effects)
}

/// Supersedes the current toast and asks the runtime to reveal the new one.
fn notify(state: &mut AppState, message: impl Into<String>, action: Option<ToastAction>) -> Effect {
    let generation = state.toast.notify(message, action);
    Effect::RevealToast { generation }
}

/// A stats request for `id` unless it is cached or already in flight.
pub fn ensure_stats(state: &mut AppState, id: u16) -> Option<Effect> {
    state.stats.begin(id).then_some(Effect::LoadStats { id })
}

fn ensure_team_stats(state: &mut AppState) -> Vec<Effect> {
    state
        .team
        .ids()
        .into_iter()
        .filter_map(|id| ensure_stats(state, id))
        .collect()
}

fn save_session(state: &AppState) -> Effect {
    Effect::SaveSession(Session::capture(state))
}

fn changed_if(changed: bool) -> DispatchResult<Effect> {
    if changed {
        DispatchResult::changed()
    } else {
        DispatchResult::unchanged()
    }
}

fn list_page_size(state: &AppState) -> usize {
    state.terminal_size.1.saturating_sub(10).max(1) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::StatsRecord;
    use crate::team::TEAM_CAPACITY;

    fn mon(id: u16) -> EntityRef {
        EntityRef::from_catalog(id, format!("mon{id}"))
    }

    fn count_load_stats(effects: &[Effect]) -> usize {
        effects
            .iter()
            .filter(|effect| matches!(effect, Effect::LoadStats { .. }))
            .count()
    }

    #[test]
    fn test_init_loads_catalog_and_missing_team_stats() {
        let mut state = AppState::default();
        state.team.add(mon(1));
        state.team.add(mon(2));
        state.stats.complete(1, StatsRecord::new());

        let result = reducer(&mut state, Action::Init);

        assert!(result.changed);
        assert!(state.catalog_loading);
        assert_eq!(result.effects[0], Effect::LoadCatalog);
        assert!(result.effects.contains(&Effect::LoadStats { id: 2 }));
        assert_eq!(count_load_stats(&result.effects), 1);
    }

    #[test]
    fn test_add_emits_toast_stats_and_save() {
        let mut state = AppState::default();
        let result = reducer(&mut state, Action::TeamAdd(mon(25)));

        assert!(result.changed);
        assert_eq!(state.team.ids(), vec![25]);
        assert_eq!(state.toast.message, "Mon25 added to team");
        assert!(!state.toast.visible);
        assert!(matches!(result.effects[0], Effect::RevealToast { .. }));
        assert!(result.effects.contains(&Effect::LoadStats { id: 25 }));
        assert!(matches!(result.effects.last(), Some(Effect::SaveSession(_))));
    }

    #[test]
    fn test_duplicate_add_is_silent() {
        let mut state = AppState::default();
        reducer(&mut state, Action::TeamAdd(mon(25)));
        let generation = state.toast.generation;

        let result = reducer(&mut state, Action::TeamAdd(mon(25)));

        assert!(!result.changed);
        assert!(result.effects.is_empty());
        assert_eq!(state.toast.generation, generation);
        assert_eq!(state.team.len(), 1);
    }

    #[test]
    fn test_add_when_full_notifies_only() {
        let mut state = AppState::default();
        for id in 1..=6 {
            reducer(&mut state, Action::TeamAdd(mon(id)));
        }

        let result = reducer(&mut state, Action::TeamAdd(mon(7)));

        assert!(result.changed);
        assert_eq!(state.team.len(), TEAM_CAPACITY);
        assert!(!state.team.contains(7));
        assert_eq!(state.toast.message, "Team is full (max 6)");
        assert_eq!(result.effects.len(), 1);
        assert!(matches!(result.effects[0], Effect::RevealToast { .. }));
    }

    #[test]
    fn test_remove_absent_is_silent() {
        let mut state = AppState::default();
        reducer(&mut state, Action::TeamAdd(mon(1)));
        let generation = state.toast.generation;

        let result = reducer(&mut state, Action::TeamRemove(99));

        assert!(!result.changed);
        assert!(result.effects.is_empty());
        assert_eq!(state.toast.generation, generation);
    }

    #[test]
    fn test_remove_attaches_undo() {
        let mut state = AppState::default();
        reducer(&mut state, Action::TeamAdd(mon(4)));

        reducer(&mut state, Action::TeamRemove(4));

        let action = state.toast.action.clone().expect("undo action");
        assert_eq!(action.label, "Undo");
        assert_eq!(action.command, UndoCommand::RestoreEntity(mon(4)));
        assert!(state.team.is_empty());
    }

    #[test]
    fn test_toggle_adds_then_removes() {
        let mut state = AppState::default();
        reducer(&mut state, Action::TeamToggle(mon(9)));
        assert!(state.team.contains(9));
        reducer(&mut state, Action::TeamToggle(mon(9)));
        assert!(!state.team.contains(9));
    }

    #[test]
    fn test_clear_empty_is_noop() {
        let mut state = AppState::default();
        let result = reducer(&mut state, Action::TeamClear);
        assert!(!result.changed);
        assert_eq!(state.toast.generation, 0);
    }

    #[test]
    fn test_ensure_stats_dedupes_in_flight() {
        let mut state = AppState::default();
        assert_eq!(ensure_stats(&mut state, 25), Some(Effect::LoadStats { id: 25 }));
        assert_eq!(ensure_stats(&mut state, 25), None);

        reducer(
            &mut state,
            Action::StatsDidError {
                id: 25,
                error: "timeout".into(),
            },
        );
        assert_eq!(ensure_stats(&mut state, 25), Some(Effect::LoadStats { id: 25 }));
    }

    #[test]
    fn test_stats_error_clears_pending_marker() {
        let mut state = AppState::default();
        reducer(&mut state, Action::TeamAdd(mon(4)));
        assert!(state.stats.is_pending(4));

        let error = || Action::StatsDidError {
            id: 4,
            error: "timeout".into(),
        };
        let result = reducer(&mut state, error());
        assert!(result.changed);
        assert!(result.effects.is_empty());
        assert!(!state.stats.is_pending(4));

        let result = reducer(&mut state, error());
        assert!(!result.changed);
    }

    #[test]
    fn test_toast_reveal_arms_dismiss_timer() {
        let mut state = AppState::default();
        reducer(&mut state, Action::TeamAdd(mon(1)));
        let generation = state.toast.generation;

        let result = reducer(&mut state, Action::ToastDidReveal { generation });

        assert!(state.toast.visible);
        assert_eq!(
            result.effects,
            vec![Effect::DismissToastAfter {
                generation,
                after_ms: 4_000
            }]
        );
    }

    #[test]
    fn test_selection_page_moves_by_screen() {
        let mut state = AppState {
            catalog: (1..=151).map(mon).collect(),
            terminal_size: (80, 30),
            ..Default::default()
        };
        state.rebuild_filtered();

        reducer(&mut state, Action::SelectionPage(1));
        assert_eq!(state.selected_index, 20);
        reducer(&mut state, Action::SelectionPage(-5));
        assert_eq!(state.selected_index, 0);
        reducer(&mut state, Action::SelectionJumpBottom);
        assert_eq!(state.selected_index, 150);
    }
}
