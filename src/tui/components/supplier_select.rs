//! Modal picker for the supplier of a new invoice

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::Line,
    widgets::{Block, Borders, Clear, List, ListItem, ListState},
    Frame,
};

use crate::localization::modal_strings;
use crate::models::Name;
use crate::tui::ui::{centered_rect, InputField, Theme};

pub struct SupplierSelect {
    pub input: InputField,
    pub options: Vec<Name>,
    pub state: ListState,
}

impl SupplierSelect {
    pub fn new(options: Vec<Name>) -> Self {
        let mut input = InputField::new(modal_strings::SEARCH_FOR_THE_SUPPLIER)
            .with_placeholder(modal_strings::START_TYPING_TO_SELECT_SUPPLIER);
        input.set_focus(true);
        let mut select = Self {
            input,
            options: Vec::new(),
            state: ListState::default(),
        };
        select.set_options(options);
        select
    }

    /// Replace the options after the filter changed; selection returns to the top
    pub fn set_options(&mut self, options: Vec<Name>) {
        self.options = options;
        self.state
            .select(if self.options.is_empty() { None } else { Some(0) });
    }

    pub fn filter(&self) -> &str {
        &self.input.value
    }

    pub fn next(&mut self) {
        if self.options.is_empty() {
            return;
        }
        let i = self.state.selected().map_or(0, |i| (i + 1) % self.options.len());
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        if self.options.is_empty() {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => self.options.len() - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    pub fn selected(&self) -> Option<&Name> {
        self.state.selected().and_then(|i| self.options.get(i))
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect, theme: &Theme) {
        let popup_area = centered_rect(60, 60, area);
        f.render_widget(Clear, popup_area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(popup_area);

        self.input.render(f, chunks[0], theme);

        let items: Vec<ListItem> = self
            .options
            .iter()
            .map(|name| ListItem::new(Line::from(format!("{}  ({})", name.name, name.code))))
            .collect();
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(theme.active_border()),
            )
            .style(theme.page())
            .highlight_style(theme.cursor_row());
        f.render_stateful_widget(list, chunks[1], &mut self.state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NameType;

    fn names(values: &[&str]) -> Vec<Name> {
        values
            .iter()
            .map(|v| Name::new(v, v, NameType::ExternalSupplier))
            .collect()
    }

    #[test]
    fn test_navigation_wraps() {
        let mut select = SupplierSelect::new(names(&["A", "B", "C"]));
        assert_eq!(select.selected().map(|n| n.name.as_str()), Some("A"));
        select.previous();
        assert_eq!(select.selected().map(|n| n.name.as_str()), Some("C"));
        select.next();
        assert_eq!(select.selected().map(|n| n.name.as_str()), Some("A"));
    }

    #[test]
    fn test_empty_options_select_nothing() {
        let mut select = SupplierSelect::new(names(&["A"]));
        select.set_options(Vec::new());
        select.next();
        assert!(select.selected().is_none());
    }
}
