//! The bounded, ordered, duplicate-free team.

use serde::{Deserialize, Serialize};

use crate::state::EntityRef;

pub const TEAM_CAPACITY: usize = 6;

/// What happened to an entity handed to [`Team::add`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    Full,
    AlreadyMember,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Team {
    members: Vec<EntityRef>,
}

impl Team {
    /// Builds a team from untrusted input (e.g. a session file), keeping the
    /// first occurrence of each id and at most [`TEAM_CAPACITY`] members.
    pub fn rehydrate(members: Vec<EntityRef>) -> (Self, usize) {
        let total = members.len();
        let mut team = Team::default();
        for member in members {
            team.add(member);
        }
        let dropped = total - team.len();
        (team, dropped)
    }

    pub fn members(&self) -> &[EntityRef] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= TEAM_CAPACITY
    }

    /// Linear scan. Six members at most, so no index is kept.
    pub fn contains(&self, id: u16) -> bool {
        self.members.iter().any(|member| member.id == id)
    }

    pub fn get(&self, index: usize) -> Option<&EntityRef> {
        self.members.get(index)
    }

    pub fn add(&mut self, entity: EntityRef) -> AddOutcome {
        if self.is_full() {
            return AddOutcome::Full;
        }
        if self.contains(entity.id) {
            return AddOutcome::AlreadyMember;
        }
        self.members.push(entity);
        AddOutcome::Added
    }

    pub fn remove(&mut self, id: u16) -> Option<EntityRef> {
        let pos = self.members.iter().position(|member| member.id == id)?;
        Some(self.members.remove(pos))
    }

    /// Empties the team and hands back the previous members in order.
    pub fn take_all(&mut self) -> Vec<EntityRef> {
        std::mem::take(&mut self.members)
    }

    /// Replaces the members verbatim. Capacity and duplicate checks are
    /// skipped: callers pass back a sequence this team produced earlier.
    pub fn restore(&mut self, members: Vec<EntityRef>) {
        self.members = members;
    }

    pub fn ids(&self) -> Vec<u16> {
        self.members.iter().map(|member| member.id).collect()
    }
}
