//! Single-slot toast notifications with an optional undo command.
//!
//! A toast moves between two observable states: hidden and visible. Each
//! [`ToastState::notify`] bumps a generation counter and hides the toast; the
//! runtime reveals it one scheduler tick later and arms a dismiss timer. Timer
//! and reveal results carry the generation they were issued for, so anything
//! belonging to a superseded toast is ignored.

use serde::{Deserialize, Serialize};

use crate::state::EntityRef;

pub const TOAST_LIFETIME_MS: u64 = 4_000;
pub const TOAST_WITH_ACTION_LIFETIME_MS: u64 = 8_000;

/// Work the reducer performs when the user accepts a toast's action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum UndoCommand {
    /// Re-add a removed member through the normal add path.
    RestoreEntity(EntityRef),
    /// Put back a cleared team exactly as it was.
    RestoreSequence(Vec<EntityRef>),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToastAction {
    pub label: String,
    pub command: UndoCommand,
}

impl ToastAction {
    pub fn undo(command: UndoCommand) -> Self {
        Self {
            label: "Undo".to_string(),
            command,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ToastState {
    pub message: String,
    pub visible: bool,
    pub action: Option<ToastAction>,
    pub generation: u64,
    /// Set once the dismiss timer fires; the text stays for readers.
    pub dismissed: bool,
}

impl ToastState {
    /// Supersedes whatever is showing. Returns the new generation.
    pub fn notify(&mut self, message: impl Into<String>, action: Option<ToastAction>) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.visible = false;
        self.dismissed = false;
        self.message = message.into();
        self.action = action;
        self.generation
    }

    pub fn lifetime_ms(&self) -> u64 {
        if self.action.is_some() {
            TOAST_WITH_ACTION_LIFETIME_MS
        } else {
            TOAST_LIFETIME_MS
        }
    }

    /// Shows the toast if `generation` is still current and returns how long
    /// it should stay up.
    pub fn reveal(&mut self, generation: u64) -> Option<u64> {
        if generation != self.generation || self.dismissed {
            return None;
        }
        self.visible = true;
        Some(self.lifetime_ms())
    }

    /// Hides the toast if `generation` is current. Message and action are kept.
    pub fn expire(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.dismissed {
            return false;
        }
        self.visible = false;
        self.dismissed = true;
        true
    }

    /// Takes the pending undo command, if the toast has not timed out yet.
    pub fn take_command(&mut self) -> Option<UndoCommand> {
        if self.dismissed {
            return None;
        }
        self.action.take().map(|action| action.command)
    }
}
