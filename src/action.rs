use serde::{Deserialize, Serialize};

use crate::error::CatalogError;
use crate::state::EntityRef;
use crate::stats::StatsRecord;

#[derive(tui_dispatch::Action, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[action(infer_categories)]
pub enum Action {
    Init,
    CatalogDidLoad(Vec<EntityRef>),
    CatalogDidError(CatalogError),

    FocusNext,
    FocusSet(crate::state::FocusArea),

    SelectionMove(i16),
    SelectionPage(i16),
    SelectionJumpTop,
    SelectionJumpBottom,
    DexSelect(usize),

    SearchStart,
    SearchCancel,
    SearchSubmit,
    SearchInput(char),
    SearchBackspace,

    TeamAdd(EntityRef),
    TeamRemove(u16),
    TeamToggle(EntityRef),
    TeamClear,
    TeamSelect(usize),

    StatsDidLoad { id: u16, stats: StatsRecord },
    StatsDidError { id: u16, error: String },

    ToastDidReveal { generation: u64 },
    ToastDidExpire { generation: u64 },
    ToastUndo,

    SessionDidSave,
    SessionDidError(String),

    UiTerminalResize(u16, u16),
    Quit,
}
