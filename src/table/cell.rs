//! Cell descriptors returned by a page's cell renderer

use ratatui::text::Line;

/// Icon shown for a checked cell when none is given
pub const DEFAULT_ICON_CHECKED: &str = "◉";
/// Icon shown for an unchecked cell when none is given
pub const DEFAULT_ICON_UNCHECKED: &str = "○";

/// How one table cell renders and which interaction it offers
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Editable(EditableCell),
    Checkable(CheckableCell),
    Custom(Line<'static>),
}

impl Cell {
    pub fn text(content: impl Into<String>) -> Self {
        Cell::Text(content.into())
    }

    pub fn editable(content: impl Into<String>, constraints: InputConstraints) -> Self {
        Cell::Editable(EditableCell {
            content: content.into(),
            constraints,
        })
    }

    pub fn is_editable(&self) -> bool {
        matches!(self, Cell::Editable(_))
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<CheckableCell> for Cell {
    fn from(value: CheckableCell) -> Self {
        Cell::Checkable(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyboardType {
    #[default]
    Default,
    Numeric,
}

impl KeyboardType {
    /// Whether `c` may be typed into a field using this keyboard
    pub fn accepts(&self, c: char) -> bool {
        match self {
            KeyboardType::Default => !c.is_control(),
            KeyboardType::Numeric => c.is_ascii_digit() || c == '.',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReturnKeyType {
    #[default]
    Done,
    Next,
}

/// Input behaviour of an editable cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputConstraints {
    pub keyboard: KeyboardType,
    pub select_text_on_focus: bool,
    pub return_key: ReturnKeyType,
    pub focus_next_field: bool,
}

impl InputConstraints {
    /// Numeric entry that selects on focus and moves to the next field on submit
    pub fn numeric_chain() -> Self {
        Self {
            keyboard: KeyboardType::Numeric,
            select_text_on_focus: true,
            return_key: ReturnKeyType::Next,
            focus_next_field: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditableCell {
    pub content: String,
    pub constraints: InputConstraints,
}

/// A toggle cell. `is_checked` forces the checked state; otherwise membership of the row
/// in the page selection decides.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CheckableCell {
    pub icon_checked: Option<String>,
    pub icon_unchecked: Option<String>,
    pub icon: Option<String>,
    pub is_checked: bool,
    pub is_disabled: bool,
}

/// Resolved icon pair of a checkable cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckableIcons {
    pub checked: String,
    pub unchecked: String,
}

impl CheckableCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Same icon for both states, only the colour changes
    pub fn with_icon(mut self, icon: &str) -> Self {
        self.icon = Some(icon.to_string());
        self
    }

    pub fn with_icons(mut self, checked: &str, unchecked: &str) -> Self {
        self.icon_checked = Some(checked.to_string());
        self.icon_unchecked = Some(unchecked.to_string());
        self
    }

    pub fn checked(mut self, is_checked: bool) -> Self {
        self.is_checked = is_checked;
        self
    }

    pub fn disabled(mut self, is_disabled: bool) -> Self {
        self.is_disabled = is_disabled;
        self
    }

    /// Both explicit icons win, then the shared icon, then the built-in pair
    pub fn icons(&self) -> CheckableIcons {
        match (&self.icon_checked, &self.icon_unchecked, &self.icon) {
            (Some(checked), Some(unchecked), _) => CheckableIcons {
                checked: checked.clone(),
                unchecked: unchecked.clone(),
            },
            (_, _, Some(icon)) => CheckableIcons {
                checked: icon.clone(),
                unchecked: icon.clone(),
            },
            _ => CheckableIcons {
                checked: DEFAULT_ICON_CHECKED.to_string(),
                unchecked: DEFAULT_ICON_UNCHECKED.to_string(),
            },
        }
    }
}
