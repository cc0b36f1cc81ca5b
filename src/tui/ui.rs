//! Theme and small shared widgets for the terminal front-end

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthChar;

use crate::table::CheckState;
pub use crate::table::InputField;

pub const SUSSOL_ORANGE: Color = Color::Rgb(0xe9, 0x5c, 0x30);
pub const WARM_GREY: Color = Color::Rgb(0x90, 0x91, 0x92);
pub const LIGHT_GREY: Color = Color::Rgb(0xd6, 0xd6, 0xd6);

/// Visual attributes of every screen, built once at startup and passed to each draw call
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub accent: Color,
    pub checked: Color,
    pub unchecked: Color,
    pub disabled: Color,
    pub text: Color,
    pub page_background: Color,
    pub header_background: Color,
    pub row_background: Color,
    pub alternate_row_background: Color,
    pub editable_background: Color,
    pub error: Color,
    pub success: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            accent: SUSSOL_ORANGE,
            checked: SUSSOL_ORANGE,
            unchecked: WARM_GREY,
            disabled: LIGHT_GREY,
            text: Color::Rgb(0x33, 0x33, 0x33),
            page_background: Color::Rgb(0xec, 0xf3, 0xfc),
            header_background: Color::White,
            row_background: Color::Rgb(0xf8, 0xfb, 0xfe),
            alternate_row_background: Color::White,
            editable_background: Color::Rgb(0xf9, 0xe4, 0xc2),
            error: Color::Red,
            success: Color::Green,
        }
    }
}

impl Theme {
    pub fn page(&self) -> Style {
        Style::default().bg(self.page_background).fg(self.text)
    }

    pub fn title(&self) -> Style {
        Style::default().fg(self.accent).add_modifier(Modifier::BOLD)
    }

    pub fn header(&self) -> Style {
        Style::default()
            .bg(self.header_background)
            .fg(self.text)
            .add_modifier(Modifier::BOLD)
    }

    /// Header cell of the column currently sorted on
    pub fn sorted_header(&self) -> Style {
        self.header().fg(self.accent)
    }

    /// Rows alternate backgrounds, odd rows use the plain cell colour
    pub fn row(&self, index: usize) -> Style {
        let background = if index % 2 == 1 {
            self.row_background
        } else {
            self.alternate_row_background
        };
        Style::default().bg(background).fg(self.text)
    }

    pub fn cursor_row(&self) -> Style {
        Style::default().add_modifier(Modifier::REVERSED)
    }

    pub fn editable(&self) -> Style {
        Style::default().bg(self.editable_background).fg(self.text)
    }

    pub fn editing(&self) -> Style {
        self.editable().add_modifier(Modifier::UNDERLINED)
    }

    /// Colour of a checkable cell; the icon alone never tells the states apart
    pub fn check(&self, state: CheckState) -> Style {
        let color = match state {
            CheckState::Checked => self.checked,
            CheckState::Unchecked => self.unchecked,
            CheckState::Disabled => self.disabled,
        };
        Style::default().fg(color)
    }

    pub fn error(&self) -> Style {
        Style::default().fg(self.error)
    }

    pub fn success(&self) -> Style {
        Style::default().fg(self.success)
    }

    pub fn inactive(&self) -> Style {
        Style::default().fg(self.unchecked)
    }

    pub fn active_border(&self) -> Style {
        Style::default().fg(self.accent)
    }

    pub fn inactive_border(&self) -> Style {
        Style::default().fg(self.unchecked)
    }
}

impl InputField {
    /// Render the input field as a bordered box
    pub fn render(&self, f: &mut Frame, area: Rect, theme: &Theme) {
        let showing_placeholder = self.value.is_empty() && !self.placeholder.is_empty();
        let display_text = if showing_placeholder {
            &self.placeholder
        } else {
            &self.value
        };

        let border_style = if self.is_focused {
            theme.active_border()
        } else {
            theme.inactive_border()
        };

        let block = Block::default()
            .title(self.label.as_str())
            .borders(Borders::ALL)
            .border_style(border_style);

        let input_style = if showing_placeholder {
            theme.inactive()
        } else {
            Style::default()
        };

        let paragraph = Paragraph::new(display_text.to_string())
            .style(input_style)
            .block(block);

        f.render_widget(paragraph, area);

        if self.is_focused {
            let offset: usize = self
                .value
                .chars()
                .take(self.cursor_position)
                .map(|c| c.width().unwrap_or(0))
                .sum();
            let cursor_x = area.x + 1 + offset as u16;
            let cursor_y = area.y + 1;
            if cursor_x < area.x + area.width.saturating_sub(1) {
                f.set_cursor(cursor_x, cursor_y);
            }
        }
    }
}

/// Cut `s` to at most `max_width` terminal columns, marking the cut with an ellipsis
pub fn truncate_to_width(s: &str, max_width: usize) -> String {
    let total: usize = s.chars().map(|c| c.width().unwrap_or(0)).sum();
    if total <= max_width {
        return s.to_string();
    }

    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > max_width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

/// Center a rectangle within another rectangle
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_to_width() {
        assert_eq!(truncate_to_width("short", 10), "short");
        assert_eq!(truncate_to_width("Central Medical Stores", 8), "Central…");
    }

    #[test]
    fn test_check_styles_differ_only_by_colour() {
        let theme = Theme::default();
        let checked = theme.check(CheckState::Checked);
        let unchecked = theme.check(CheckState::Unchecked);
        assert_ne!(checked.fg, unchecked.fg);
        assert_eq!(checked.add_modifier, unchecked.add_modifier);
        assert_eq!(checked.bg, unchecked.bg);
    }
}
