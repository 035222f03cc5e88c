use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use tui_dispatch::{
    Component, EventContext, EventKind, EventRoutingState, HandlerResponse, RenderContext,
};
use tui_dispatch_components::style::BorderStyle;
use tui_dispatch_components::{
    BaseStyle, Padding, SelectList, SelectListBehavior, SelectListProps, SelectListStyle,
    SelectionStyle, StatusBar, StatusBarHint, StatusBarItem, StatusBarProps, StatusBarSection,
    StatusBarStyle,
};

use crate::action::Action;
use crate::state::{AppState, FocusArea};
use crate::stats::{ordered_stats, stat_label};
use crate::team::TEAM_CAPACITY;

const BG_BASE: Color = Color::Rgb(12, 18, 28);
const BG_PANEL: Color = Color::Rgb(20, 32, 46);
const BG_HIGHLIGHT: Color = Color::Rgb(28, 92, 110);
const BG_TOAST: Color = Color::Rgb(38, 52, 70);
const TEXT_MAIN: Color = Color::Rgb(232, 242, 244);
const TEXT_DIM: Color = Color::Rgb(176, 195, 207);
const ACCENT_TEAL: Color = Color::Rgb(72, 204, 184);
const ACCENT_GOLD: Color = Color::Rgb(228, 176, 88);
const ACCENT_RED: Color = Color::Rgb(226, 96, 88);

#[derive(tui_dispatch::ComponentId, Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum PokeComponentId {
    Header,
    DexList,
    Team,
    Search,
}

#[derive(tui_dispatch::BindingContext, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PokeContext {
    Header,
    DexList,
    Team,
    Search,
}

impl EventRoutingState<PokeComponentId, PokeContext> for AppState {
    fn focused(&self) -> Option<PokeComponentId> {
        if self.search.active {
            return Some(PokeComponentId::Search);
        }
        match self.focus {
            FocusArea::DexList => Some(PokeComponentId::DexList),
            FocusArea::Team => Some(PokeComponentId::Team),
        }
    }

    fn modal(&self) -> Option<PokeComponentId> {
        if self.search.active {
            Some(PokeComponentId::Search)
        } else {
            None
        }
    }

    fn binding_context(&self, id: PokeComponentId) -> PokeContext {
        match id {
            PokeComponentId::Header => PokeContext::Header,
            PokeComponentId::DexList => PokeContext::DexList,
            PokeComponentId::Team => PokeContext::Team,
            PokeComponentId::Search => PokeContext::Search,
        }
    }

    fn default_context(&self) -> PokeContext {
        PokeContext::DexList
    }
}

pub struct PokeUi {
    dex_list: SelectList,
    team_list: SelectList,
    status_bar: StatusBar,
}

impl Default for PokeUi {
    fn default() -> Self {
        Self::new()
    }
}

impl PokeUi {
    pub fn new() -> Self {
        Self {
            dex_list: SelectList::new(),
            team_list: SelectList::new(),
            status_bar: StatusBar::new(),
        }
    }

    pub fn render(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        state: &AppState,
        _render_ctx: RenderContext,
        event_ctx: &mut EventContext<PokeComponentId>,
    ) {
        let base = Block::default().style(Style::default().bg(BG_BASE));
        frame.render_widget(base, area);
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(10),
                Constraint::Length(3),
                Constraint::Length(3),
            ])
            .split(area);

        event_ctx.set_component_area(PokeComponentId::Header, layout[0]);
        if state.search.active {
            event_ctx.set_component_area(PokeComponentId::Search, layout[0]);
        } else {
            event_ctx.component_areas.remove(&PokeComponentId::Search);
        }
        render_header(frame, layout[0], state);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(layout[1]);
        event_ctx.set_component_area(PokeComponentId::DexList, body[0]);
        event_ctx.set_component_area(PokeComponentId::Team, body[1]);
        render_dex(frame, body[0], state, &mut self.dex_list);

        let team_area = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(TEAM_CAPACITY as u16 + 2),
                Constraint::Min(4),
            ])
            .split(body[1]);
        render_team_list(frame, team_area[0], state, &mut self.team_list);
        render_stats_panel(frame, team_area[1], state);

        render_toast(frame, layout[2], state);
        render_footer(frame, layout[3], state, &mut self.status_bar);
    }

    pub fn handle_header_event(
        &mut self,
        event: &EventKind,
        state: &AppState,
    ) -> HandlerResponse<Action> {
        handle_header_event(event, state)
    }

    pub fn handle_list_event(
        &mut self,
        event: &EventKind,
        state: &AppState,
    ) -> HandlerResponse<Action> {
        handle_list_event(event, state, &mut self.dex_list)
    }

    pub fn handle_team_event(
        &mut self,
        event: &EventKind,
        state: &AppState,
    ) -> HandlerResponse<Action> {
        handle_team_event(event, state, &mut self.team_list)
    }

    pub fn handle_search_event(
        &mut self,
        event: &EventKind,
        state: &AppState,
    ) -> HandlerResponse<Action> {
        handle_search_event(event, state)
    }
}

pub fn handle_header_event(event: &EventKind, _state: &AppState) -> HandlerResponse<Action> {
    let actions = match event {
        EventKind::Key(key) => match key.code {
            KeyCode::Enter => vec![Action::SearchStart],
            _ => vec![],
        },
        _ => vec![],
    };
    handler_response(actions)
}

pub fn handle_list_event(
    event: &EventKind,
    state: &AppState,
    dex_list: &mut SelectList,
) -> HandlerResponse<Action> {
    let actions = match event {
        EventKind::Key(key) => match key.code {
            KeyCode::PageDown => vec![Action::SelectionPage(1)],
            KeyCode::PageUp => vec![Action::SelectionPage(-1)],
            KeyCode::Home | KeyCode::Char('g') => vec![Action::SelectionJumpTop],
            KeyCode::End | KeyCode::Char('G') => vec![Action::SelectionJumpBottom],
            KeyCode::Char('t') | KeyCode::Char(' ') | KeyCode::Enter => state
                .selected_entry()
                .map(|entry| vec![Action::TeamToggle(entry.clone())])
                .unwrap_or_default(),
            KeyCode::Char('a') => state
                .selected_entry()
                .map(|entry| vec![Action::TeamAdd(entry.clone())])
                .unwrap_or_default(),
            _ => {
                let items = dex_items(state);
                let props = SelectListProps {
                    items: &items,
                    count: items.len(),
                    selected: state.selected_index.min(items.len().saturating_sub(1)),
                    is_focused: true,
                    style: list_style(),
                    behavior: SelectListBehavior {
                        show_scrollbar: true,
                        wrap_navigation: false,
                    },
                    on_select: Action::DexSelect,
                    render_item: &|item| item.clone(),
                };
                let actions: Vec<_> = dex_list.handle_event(event, props).into_iter().collect();
                return handler_response(actions);
            }
        },
        EventKind::Scroll { delta, .. } => vec![Action::SelectionMove((*delta * 3) as i16)],
        _ => vec![],
    };
    handler_response(actions)
}

pub fn handle_team_event(
    event: &EventKind,
    state: &AppState,
    team_list: &mut SelectList,
) -> HandlerResponse<Action> {
    let actions = match event {
        EventKind::Key(key) => match key.code {
            KeyCode::Char('d') | KeyCode::Char('x') | KeyCode::Delete | KeyCode::Backspace => {
                state
                    .selected_member()
                    .map(|member| vec![Action::TeamRemove(member.id)])
                    .unwrap_or_default()
            }
            _ => {
                let items = team_items(state);
                if items.is_empty() {
                    return HandlerResponse::ignored();
                }
                let props = SelectListProps {
                    items: &items,
                    count: items.len(),
                    selected: state.team_selected.min(items.len().saturating_sub(1)),
                    is_focused: true,
                    style: list_style(),
                    behavior: SelectListBehavior {
                        show_scrollbar: false,
                        wrap_navigation: true,
                    },
                    on_select: Action::TeamSelect,
                    render_item: &|item| item.clone(),
                };
                let actions: Vec<_> = team_list.handle_event(event, props).into_iter().collect();
                return handler_response(actions);
            }
        },
        _ => vec![],
    };
    handler_response(actions)
}

pub fn handle_search_event(event: &EventKind, _state: &AppState) -> HandlerResponse<Action> {
    let actions = match event {
        EventKind::Key(key) => match key.code {
            KeyCode::Esc => vec![Action::SearchCancel],
            KeyCode::Enter => vec![Action::SearchSubmit],
            KeyCode::Backspace => vec![Action::SearchBackspace],
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                vec![Action::SearchInput(ch)]
            }
            _ => vec![],
        },
        _ => vec![],
    };
    handler_response(actions)
}

/// Keys that work regardless of focus, outside of search.
pub fn handle_global_event(event: &EventKind, state: &AppState) -> HandlerResponse<Action> {
    match event {
        EventKind::Resize(width, height) => {
            HandlerResponse::action(Action::UiTerminalResize(*width, *height)).with_render()
        }
        EventKind::Key(key) if !state.search.active => match key.code {
            KeyCode::Char('q') => HandlerResponse::action(Action::Quit),
            KeyCode::Tab | KeyCode::BackTab => HandlerResponse::action(Action::FocusNext),
            KeyCode::Char('/') => HandlerResponse::action(Action::SearchStart),
            KeyCode::Char('u') => HandlerResponse::action(Action::ToastUndo),
            KeyCode::Char('C') => HandlerResponse::action(Action::TeamClear),
            _ => HandlerResponse::ignored(),
        },
        _ => HandlerResponse::ignored(),
    }
}

fn handler_response(actions: Vec<Action>) -> HandlerResponse<Action> {
    if actions.is_empty() {
        HandlerResponse::ignored()
    } else {
        HandlerResponse {
            actions,
            consumed: true,
            needs_render: false,
        }
    }
}

fn render_header(frame: &mut Frame, area: Rect, state: &AppState) {
    let title_style = Style::default()
        .fg(ACCENT_TEAL)
        .add_modifier(Modifier::BOLD);
    let search = if state.search.active {
        format!("/{}_", state.search.query)
    } else if state.search.query.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", state.search.query)
    };
    let team_style = if state.team.is_full() {
        Style::default().fg(ACCENT_GOLD).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(ACCENT_TEAL)
    };
    let line = Line::from(vec![
        Span::styled("KANTO DEX", title_style),
        Span::raw("  "),
        Span::styled(
            format!("{:03}/{:03}", state.filtered_indices.len(), state.catalog.len()),
            Style::default().fg(ACCENT_GOLD),
        ),
        Span::raw("  |  Search: "),
        Span::styled(search, Style::default().fg(ACCENT_TEAL)),
        Span::raw("  |  Team: "),
        Span::styled(
            format!("{}/{}", state.team.len(), TEAM_CAPACITY),
            team_style,
        ),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .style(Style::default().bg(BG_PANEL).fg(TEXT_MAIN))
        .border_style(if state.search.active {
            Style::default().fg(ACCENT_TEAL)
        } else {
            Style::default().fg(TEXT_DIM)
        })
        .title("POKETEAM");
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_dex(frame: &mut Frame, area: Rect, state: &AppState, dex_list: &mut SelectList) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("DEX")
        .style(Style::default().bg(BG_PANEL).fg(TEXT_MAIN))
        .border_style(focus_border(state, FocusArea::DexList));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if state.catalog.is_empty() {
        frame.render_widget(
            Paragraph::new(catalog_status_text(state)).wrap(Wrap { trim: true }),
            inner,
        );
        return;
    }

    let items = dex_items(state);
    let props = SelectListProps {
        items: &items,
        count: items.len(),
        selected: state.selected_index.min(items.len().saturating_sub(1)),
        is_focused: state.focus == FocusArea::DexList,
        style: list_style(),
        behavior: SelectListBehavior {
            show_scrollbar: true,
            wrap_navigation: false,
        },
        on_select: Action::DexSelect,
        render_item: &|item| item.clone(),
    };
    dex_list.render(frame, inner, props);
}

pub fn catalog_status_text(state: &AppState) -> Text<'static> {
    if state.catalog_loading {
        return Text::from("Loading pokedex...");
    }
    let Some(error) = state.catalog_error.as_ref() else {
        return Text::from("No entries.");
    };
    Text::from(vec![
        Line::from(Span::styled(
            format!("{} ({})", error.message, error.status),
            Style::default().fg(ACCENT_RED).add_modifier(Modifier::BOLD),
        )),
        Line::from(error.data.reason.clone()),
        Line::from(Span::styled(
            error.data.original_error.clone(),
            Style::default().fg(TEXT_DIM),
        )),
    ])
}

pub fn render_team_list(
    frame: &mut Frame,
    area: Rect,
    state: &AppState,
    team_list: &mut SelectList,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("TEAM {}/{}", state.team.len(), TEAM_CAPACITY))
        .style(Style::default().bg(BG_PANEL).fg(TEXT_MAIN))
        .border_style(focus_border(state, FocusArea::Team));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let items = team_items(state);
    if items.is_empty() {
        frame.render_widget(
            Paragraph::new("No team members yet. Press t on a dex entry.")
                .style(Style::default().fg(TEXT_DIM))
                .wrap(Wrap { trim: true }),
            inner,
        );
        return;
    }
    let props = SelectListProps {
        items: &items,
        count: items.len(),
        selected: state.team_selected.min(items.len().saturating_sub(1)),
        is_focused: state.focus == FocusArea::Team,
        style: list_style(),
        behavior: SelectListBehavior {
            show_scrollbar: false,
            wrap_navigation: true,
        },
        on_select: Action::TeamSelect,
        render_item: &|item| item.clone(),
    };
    team_list.render(frame, inner, props);
}

pub fn render_stats_panel(frame: &mut Frame, area: Rect, state: &AppState) {
    let title = state
        .selected_member()
        .map(|member| format!("STATS  {}", member.display_name()))
        .unwrap_or_else(|| "STATS".to_string());
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .style(Style::default().bg(BG_PANEL).fg(TEXT_MAIN));
    frame.render_widget(
        Paragraph::new(member_stats_text(state))
            .block(block)
            .wrap(Wrap { trim: false }),
        area,
    );
}

fn member_stats_text(state: &AppState) -> Text<'static> {
    let Some(member) = state.selected_member() else {
        return Text::from("Select a team member.");
    };
    match state.stats.get(member.id) {
        Some(record) => Text::from(
            ordered_stats(record)
                .into_iter()
                .map(|(name, value)| Line::from(render_stat(name, value)))
                .collect::<Vec<_>>(),
        ),
        None if state.stats.is_pending(member.id) => Text::from("Loading stats..."),
        None => Text::from("No stats cached."),
    }
}

/// Hidden toasts draw nothing; the text stays in state for later reads.
pub fn render_toast(frame: &mut Frame, area: Rect, state: &AppState) {
    if !state.toast.visible {
        return;
    }
    let mut spans = vec![Span::styled(
        state.toast.message.clone(),
        Style::default().fg(TEXT_MAIN).add_modifier(Modifier::BOLD),
    )];
    if let Some(action) = state.toast.action.as_ref() {
        spans.push(Span::raw("   "));
        spans.push(Span::styled(
            format!("[u] {}", action.label),
            Style::default().fg(ACCENT_GOLD).add_modifier(Modifier::BOLD),
        ));
    }
    let block = Block::default()
        .borders(Borders::ALL)
        .style(Style::default().bg(BG_TOAST))
        .border_style(Style::default().fg(ACCENT_TEAL));
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_footer(frame: &mut Frame, area: Rect, state: &AppState, status_bar: &mut StatusBar) {
    let status = if state.catalog_loading {
        "Loading pokedex...".to_string()
    } else if let Some(error) = state.catalog_error.as_ref() {
        format!("Pokedex error {}", error.status)
    } else {
        String::new()
    };
    let (left_hints, center_hints) = status_hints(state);
    let status_span = Span::styled(status.as_str(), Style::default().fg(ACCENT_GOLD));
    let status_items = [StatusBarItem::span(status_span)];

    let style = StatusBarStyle {
        base: BaseStyle {
            border: Some(BorderStyle {
                borders: Borders::ALL,
                style: Style::default().fg(TEXT_DIM),
                focused_style: Some(Style::default().fg(ACCENT_TEAL)),
            }),
            padding: Padding::xy(1, 0),
            bg: Some(BG_PANEL),
            fg: Some(TEXT_MAIN),
        },
        text: Style::default().fg(TEXT_DIM),
        hint_key: Style::default()
            .fg(ACCENT_TEAL)
            .add_modifier(Modifier::BOLD),
        hint_label: Style::default().fg(TEXT_DIM),
        separator: Style::default().fg(TEXT_DIM),
    };

    let props = StatusBarProps {
        left: StatusBarSection::hints(&left_hints).with_separator("  "),
        center: StatusBarSection::hints(&center_hints).with_separator("  "),
        right: StatusBarSection::items(&status_items).with_separator("  "),
        style,
        is_focused: false,
    };
    Component::<Action>::render(status_bar, frame, area, props);
}

fn status_hints(state: &AppState) -> (Vec<StatusBarHint<'static>>, Vec<StatusBarHint<'static>>) {
    if state.search.active {
        let left = vec![
            StatusBarHint::new("Enter", "Apply"),
            StatusBarHint::new("Esc", "Cancel"),
            StatusBarHint::new("Bksp", "Delete"),
        ];
        return (left, Vec::new());
    }

    let left = match state.focus {
        FocusArea::DexList => vec![
            StatusBarHint::new("j/k", "Move"),
            StatusBarHint::new("PgUp/PgDn", "Page"),
            StatusBarHint::new("t", "Toggle team"),
        ],
        FocusArea::Team => vec![
            StatusBarHint::new("j/k", "Select"),
            StatusBarHint::new("d", "Remove"),
        ],
    };
    let mut center = vec![
        StatusBarHint::new("Tab", "Focus"),
        StatusBarHint::new("/", "Search"),
        StatusBarHint::new("C", "Clear team"),
    ];
    if state.toast.visible && state.toast.action.is_some() {
        center.push(StatusBarHint::new("u", "Undo"));
    }
    center.push(StatusBarHint::new("q", "Quit"));
    (left, center)
}

pub fn dex_items(state: &AppState) -> Vec<Line<'static>> {
    state
        .filtered_indices
        .iter()
        .filter_map(|idx| state.catalog.get(*idx))
        .map(|entry| {
            let marker = if state.team.contains(entry.id) { "●" } else { " " };
            Line::from(format!("{marker} #{:03} {}", entry.id, format_name(&entry.name)))
        })
        .collect()
}

pub fn team_items(state: &AppState) -> Vec<Line<'static>> {
    state
        .team
        .members()
        .iter()
        .enumerate()
        .map(|(slot, member)| {
            let pending = if state.stats.is_pending(member.id) { " …" } else { "" };
            Line::from(format!(
                "{}. #{:03} {}{pending}",
                slot + 1,
                member.id,
                format_name(&member.name)
            ))
        })
        .collect()
}

fn list_style() -> SelectListStyle {
    SelectListStyle {
        base: BaseStyle {
            border: None,
            padding: Padding::xy(1, 0),
            bg: None,
            fg: Some(TEXT_MAIN),
        },
        selection: SelectionStyle {
            style: Some(
                Style::default()
                    .bg(BG_HIGHLIGHT)
                    .fg(TEXT_MAIN)
                    .add_modifier(Modifier::BOLD),
            ),
            marker: None,
            disabled: false,
        },
        ..SelectListStyle::default()
    }
}

fn format_name(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => format!("{}{}", first.to_ascii_uppercase(), chars.as_str()),
                None => "".to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_stat(name: &str, value: u16) -> String {
    let label = stat_label(name);
    let bar_len = (value as usize / 10).clamp(1, 20);
    let bar = "#".repeat(bar_len);
    format!("{label:>6} {value:>3} {bar}")
}

fn focus_border(state: &AppState, area: FocusArea) -> Style {
    if state.focus == area {
        Style::default()
            .fg(ACCENT_TEAL)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(TEXT_DIM)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::EntityRef;
    use tui_dispatch::testing::*;

    fn state_with_catalog() -> AppState {
        let mut state = AppState {
            catalog: vec![
                EntityRef::from_catalog(1, "bulbasaur"),
                EntityRef::from_catalog(122, "mr-mime"),
            ],
            ..Default::default()
        };
        state.rebuild_filtered();
        state
    }

    #[test]
    fn test_format_name_splits_hyphens() {
        assert_eq!(format_name("mr-mime"), "Mr Mime");
        assert_eq!(format_name("pikachu"), "Pikachu");
    }

    #[test]
    fn test_render_stat_uses_short_label() {
        assert_eq!(render_stat("special-attack", 50), "S. ATK  50 #####");
        assert_eq!(render_stat("hp", 5), "    HP   5 #");
    }

    #[test]
    fn test_dex_items_mark_team_members() {
        let mut state = state_with_catalog();
        state.team.add(EntityRef::from_catalog(122, "mr-mime"));
        let items: Vec<String> = dex_items(&state).iter().map(|l| l.to_string()).collect();
        assert_eq!(items, vec!["  #001 Bulbasaur", "● #122 Mr Mime"]);
    }

    #[test]
    fn test_toggle_key_targets_selected_entry() {
        let state = state_with_catalog();
        let mut list = SelectList::new();
        let response = handle_list_event(&EventKind::Key(key("t")), &state, &mut list);
        assert_eq!(
            response.actions,
            vec![Action::TeamToggle(EntityRef::from_catalog(1, "bulbasaur"))]
        );
    }

    #[test]
    fn test_remove_key_targets_selected_member() {
        let mut state = state_with_catalog();
        state.team.add(EntityRef::from_catalog(1, "bulbasaur"));
        state.team.add(EntityRef::from_catalog(122, "mr-mime"));
        state.team_selected = 1;
        let mut list = SelectList::new();
        let response = handle_team_event(&EventKind::Key(key("d")), &state, &mut list);
        assert_eq!(response.actions, vec![Action::TeamRemove(122)]);
    }

    #[test]
    fn test_global_keys_ignored_while_searching() {
        let mut state = AppState::default();
        let response = handle_global_event(&EventKind::Key(key("u")), &state);
        assert_eq!(response.actions, vec![Action::ToastUndo]);

        state.search.active = true;
        let response = handle_global_event(&EventKind::Key(key("u")), &state);
        assert!(response.actions.is_empty());
    }
}
