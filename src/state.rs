use serde::{Deserialize, Serialize};
use tui_dispatch_debug::debug::{ron_string, DebugSection, DebugState};

use crate::error::CatalogError;
use crate::stats::StatsCache;
use crate::team::Team;
use crate::toast::ToastState;

pub const ARTWORK_URL_BASE: &str =
    "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon/other/official-artwork";

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: u16,
    pub name: String,
    pub image: String,
}

impl EntityRef {
    /// Catalog entries get their artwork URL from the id alone.
    pub fn from_catalog(id: u16, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            image: format!("{ARTWORK_URL_BASE}/{id}.png"),
        }
    }

    pub fn display_name(&self) -> String {
        capitalize_first(&self.name)
    }
}

/// Upper-cases the first character only when it is an ASCII lowercase letter.
pub fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() => {
            format!("{}{}", first.to_ascii_uppercase(), chars.as_str())
        }
        _ => text.to_string(),
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchState {
    pub active: bool,
    pub query: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum FocusArea {
    #[default]
    DexList,
    Team,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppState {
    pub terminal_size: (u16, u16),
    pub focus: FocusArea,

    pub catalog: Vec<EntityRef>,
    pub catalog_loading: bool,
    pub catalog_error: Option<CatalogError>,
    pub filtered_indices: Vec<usize>,
    pub selected_index: usize,
    pub search: SearchState,

    pub team: Team,
    pub team_selected: usize,
    pub stats: StatsCache,
    pub toast: ToastState,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            terminal_size: (80, 24),
            focus: FocusArea::DexList,
            catalog: Vec::new(),
            catalog_loading: false,
            catalog_error: None,
            filtered_indices: Vec::new(),
            selected_index: 0,
            search: SearchState::default(),
            team: Team::default(),
            team_selected: 0,
            stats: StatsCache::default(),
            toast: ToastState::default(),
        }
    }
}

impl AppState {
    pub fn selected_entry(&self) -> Option<&EntityRef> {
        self.filtered_indices
            .get(self.selected_index)
            .and_then(|idx| self.catalog.get(*idx))
    }

    pub fn set_selected_index(&mut self, index: usize) -> bool {
        if self.filtered_indices.is_empty() {
            self.selected_index = 0;
            return false;
        }
        let bounded = index.min(self.filtered_indices.len() - 1);
        if bounded != self.selected_index {
            self.selected_index = bounded;
            return true;
        }
        false
    }

    pub fn rebuild_filtered(&mut self) {
        let query = self.search.query.trim().to_lowercase();
        self.filtered_indices = self
            .catalog
            .iter()
            .enumerate()
            .filter(|(_, entry)| {
                query.is_empty()
                    || entry.name.to_lowercase().contains(&query)
                    || entry.id.to_string().contains(&query)
            })
            .map(|(idx, _)| idx)
            .collect();

        if self.selected_index >= self.filtered_indices.len() {
            self.selected_index = 0;
        }
    }

    pub fn selected_member(&self) -> Option<&EntityRef> {
        self.team.get(self.team_selected)
    }

    pub fn clamp_team_selection(&mut self) {
        self.team_selected = self.team_selected.min(self.team.len().saturating_sub(1));
    }

    pub fn focus_next(&mut self) {
        self.focus = match self.focus {
            FocusArea::DexList => FocusArea::Team,
            FocusArea::Team => FocusArea::DexList,
        };
    }
}

impl DebugState for AppState {
    fn debug_sections(&self) -> Vec<DebugSection> {
        vec![
            DebugSection::new("Dex")
                .entry("total", ron_string(&self.catalog.len()))
                .entry("filtered", ron_string(&self.filtered_indices.len()))
                .entry("selected", ron_string(&self.selected_index))
                .entry("search", ron_string(&self.search.query))
                .entry("loading", ron_string(&self.catalog_loading))
                .entry(
                    "error",
                    ron_string(&self.catalog_error.as_ref().map(|err| err.to_string())),
                ),
            DebugSection::new("Team")
                .entry("members", ron_string(&self.team.ids()))
                .entry("selected", ron_string(&self.team_selected))
                .entry("cached_stats", ron_string(&self.stats.len()))
                .entry("focus", ron_string(&self.focus)),
            DebugSection::new("Toast")
                .entry("message", ron_string(&self.toast.message))
                .entry("visible", ron_string(&self.toast.visible))
                .entry("generation", ron_string(&self.toast.generation))
                .entry(
                    "action",
                    ron_string(&self.toast.action.as_ref().map(|a| a.label.clone())),
                ),
        ]
    }
}
