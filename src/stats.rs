//! Per-entity base stats, fetched once and memoized.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

/// Stat name (`hp`, `special-attack`, ...) to base value.
pub type StatsRecord = BTreeMap<String, u16>;

/// Stat categories in display order with their short labels.
pub const STAT_CATEGORIES: [(&str, &str); 6] = [
    ("hp", "HP"),
    ("attack", "ATK"),
    ("defense", "DEF"),
    ("special-attack", "S. ATK"),
    ("special-defense", "S. DEF"),
    ("speed", "SPD"),
];

pub fn stat_label(name: &str) -> String {
    STAT_CATEGORIES
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| name.to_ascii_uppercase())
}

/// Records in category order first, then anything unrecognised by name.
pub fn ordered_stats(record: &StatsRecord) -> Vec<(&str, u16)> {
    let mut out: Vec<(&str, u16)> = STAT_CATEGORIES
        .iter()
        .filter_map(|(key, _)| record.get_key_value(*key))
        .map(|(name, value)| (name.as_str(), *value))
        .collect();
    out.extend(
        record
            .iter()
            .filter(|(name, _)| !STAT_CATEGORIES.iter().any(|(key, _)| key == name))
            .map(|(name, value)| (name.as_str(), *value)),
    );
    out
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsCache {
    records: BTreeMap<u16, StatsRecord>,
    #[serde(skip)]
    in_flight: HashSet<u16>,
}

impl StatsCache {
    pub fn from_records(records: BTreeMap<u16, StatsRecord>) -> Self {
        Self {
            records,
            in_flight: HashSet::new(),
        }
    }

    pub fn get(&self, id: u16) -> Option<&StatsRecord> {
        self.records.get(&id)
    }

    pub fn contains(&self, id: u16) -> bool {
        self.records.contains_key(&id)
    }

    pub fn is_pending(&self, id: u16) -> bool {
        self.in_flight.contains(&id)
    }

    pub fn records(&self) -> &BTreeMap<u16, StatsRecord> {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Marks `id` as in flight. Returns false when a fetch is unnecessary:
    /// the record is cached or a request is already outstanding.
    pub fn begin(&mut self, id: u16) -> bool {
        if self.contains(id) {
            return false;
        }
        self.in_flight.insert(id)
    }

    /// Stores the record unless one already exists. Returns whether it was
    /// inserted.
    pub fn complete(&mut self, id: u16, record: StatsRecord) -> bool {
        self.in_flight.remove(&id);
        if self.contains(id) {
            return false;
        }
        self.records.insert(id, record);
        true
    }

    /// Clears the in-flight marker so a later request may retry. Returns
    /// whether a request was pending.
    pub fn fail(&mut self, id: u16) -> bool {
        self.in_flight.remove(&id)
    }
}
