//! Text buffer of an editing session

use super::cell::KeyboardType;

/// Single-line text input. Positions count characters, not bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct InputField {
    pub label: String,
    pub value: String,
    pub placeholder: String,
    pub is_focused: bool,
    pub cursor_position: usize,
    pub keyboard: KeyboardType,
    /// The whole value is selected and the next keystroke replaces it
    pub is_selected: bool,
}

impl InputField {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            value: String::new(),
            placeholder: String::new(),
            is_focused: false,
            cursor_position: 0,
            keyboard: KeyboardType::Default,
            is_selected: false,
        }
    }

    pub fn with_placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = placeholder.to_string();
        self
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.value = value.to_string();
        self.cursor_position = value.chars().count();
        self
    }

    pub fn with_keyboard(mut self, keyboard: KeyboardType) -> Self {
        self.keyboard = keyboard;
        self
    }

    pub fn select_all(mut self) -> Self {
        self.is_selected = true;
        self
    }

    pub fn set_focus(&mut self, focused: bool) {
        self.is_focused = focused;
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    fn take_selection(&mut self) {
        if self.is_selected {
            self.is_selected = false;
            self.clear();
        }
    }

    /// Insert `c` at the cursor. Characters the keyboard rejects are ignored.
    pub fn insert_char(&mut self, c: char) -> bool {
        if !self.keyboard.accepts(c) {
            return false;
        }
        self.take_selection();
        let index = self.byte_index(self.cursor_position);
        self.value.insert(index, c);
        self.cursor_position += 1;
        true
    }

    pub fn delete_char(&mut self) {
        if self.is_selected {
            self.take_selection();
            return;
        }
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
            let index = self.byte_index(self.cursor_position);
            self.value.remove(index);
        }
    }

    pub fn delete_char_forward(&mut self) {
        if self.cursor_position < self.value.chars().count() {
            let index = self.byte_index(self.cursor_position);
            self.value.remove(index);
        }
    }

    pub fn move_cursor_left(&mut self) {
        self.is_selected = false;
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
        }
    }

    pub fn move_cursor_right(&mut self) {
        self.is_selected = false;
        if self.cursor_position < self.value.chars().count() {
            self.cursor_position += 1;
        }
    }

    pub fn move_cursor_to_start(&mut self) {
        self.is_selected = false;
        self.cursor_position = 0;
    }

    pub fn move_cursor_to_end(&mut self) {
        self.is_selected = false;
        self.cursor_position = self.value.chars().count();
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor_position = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selected_value_is_replaced_on_first_keystroke() {
        let mut field = InputField::new("Quantity")
            .with_value("120")
            .with_keyboard(KeyboardType::Numeric)
            .select_all();
        assert!(!field.insert_char('x'));
        assert_eq!(field.value, "120");
        assert!(field.insert_char('4'));
        assert!(field.insert_char('5'));
        assert_eq!(field.value, "45");
        assert_eq!(field.cursor_position, 2);
    }

    #[test]
    fn test_multibyte_editing() {
        let mut field = InputField::new("Comment").with_value("héllo");
        field.move_cursor_left();
        field.delete_char();
        assert_eq!(field.value, "hélo");
        field.move_cursor_to_start();
        field.delete_char_forward();
        assert_eq!(field.value, "élo");
    }
}
