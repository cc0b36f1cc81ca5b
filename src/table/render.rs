//! Render model produced by a table page for the terminal layer

use ratatui::text::{Line, Text};

use super::cell::{Cell, CheckableCell};
use super::column::Alignment;
use crate::models::RecordId;

/// Visual state of a checkable cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    Checked,
    Unchecked,
    Disabled,
}

/// A cell after dispatch on its descriptor
#[derive(Debug, Clone, PartialEq)]
pub enum CellView {
    Text(String),
    Editable {
        value: String,
        is_editing: bool,
        cursor: usize,
        is_read_only: bool,
    },
    Checkable {
        icon: String,
        state: CheckState,
    },
    Custom(Line<'static>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderView {
    pub key: String,
    pub title: String,
    pub width: u16,
    pub align: Alignment,
    pub sortable: bool,
    pub is_selected: bool,
    pub is_ascending: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowView {
    pub id: RecordId,
    pub index: usize,
    pub cells: Vec<CellView>,
    pub is_expanded: bool,
    pub expansion: Option<Text<'static>>,
    pub is_pressable: bool,
}

/// Resolve a checkable descriptor against the page selection
pub fn checkable_view(cell: &CheckableCell, is_selected: bool) -> CellView {
    let icons = cell.icons();
    let is_checked = cell.is_checked || is_selected;
    let state = if cell.is_disabled {
        CheckState::Disabled
    } else if is_checked {
        CheckState::Checked
    } else {
        CheckState::Unchecked
    };
    let icon = match state {
        CheckState::Checked => icons.checked,
        CheckState::Unchecked | CheckState::Disabled => icons.unchecked,
    };
    CellView::Checkable { icon, state }
}

/// Dispatch a descriptor to its view. Editing overlays are applied by the page.
pub fn cell_view(cell: Cell, is_selected: bool, can_edit: bool) -> CellView {
    match cell {
        Cell::Text(content) => CellView::Text(content),
        Cell::Editable(editable) => CellView::Editable {
            cursor: editable.content.chars().count(),
            value: editable.content,
            is_editing: false,
            is_read_only: !can_edit,
        },
        Cell::Checkable(checkable) => checkable_view(&checkable, is_selected),
        Cell::Custom(line) => CellView::Custom(line),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_icon_checkable_both_states() {
        let cell = CheckableCell::new().with_icon("x");
        assert_eq!(
            checkable_view(&cell, true),
            CellView::Checkable {
                icon: "x".to_string(),
                state: CheckState::Checked
            }
        );
        assert_eq!(
            checkable_view(&cell, false),
            CellView::Checkable {
                icon: "x".to_string(),
                state: CheckState::Unchecked
            }
        );
    }

    #[test]
    fn test_explicit_checked_overrides_selection() {
        let cell = CheckableCell::new().with_icons("+", "-").checked(true);
        assert_eq!(
            checkable_view(&cell, false),
            CellView::Checkable {
                icon: "+".to_string(),
                state: CheckState::Checked
            }
        );
    }

    #[test]
    fn test_unchecked_flag_falls_back_to_selection() {
        let cell = CheckableCell::new().with_icons("+", "-").checked(false);
        assert_eq!(
            checkable_view(&cell, true),
            CellView::Checkable {
                icon: "+".to_string(),
                state: CheckState::Checked
            }
        );
        assert_eq!(
            checkable_view(&cell, false),
            CellView::Checkable {
                icon: "-".to_string(),
                state: CheckState::Unchecked
            }
        );
    }

    #[test]
    fn test_disabled_uses_unchecked_icon() {
        let cell = CheckableCell::new().disabled(true);
        let view = checkable_view(&cell, true);
        assert_eq!(
            view,
            CellView::Checkable {
                icon: super::super::cell::DEFAULT_ICON_UNCHECKED.to_string(),
                state: CheckState::Disabled
            }
        );
    }

    #[test]
    fn test_editable_without_hook_is_read_only() {
        let view = cell_view(Cell::editable("5", Default::default()), false, false);
        assert!(matches!(view, CellView::Editable { is_read_only: true, .. }));
    }
}
