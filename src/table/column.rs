//! Column descriptors

/// Horizontal alignment of a column's cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

/// One column of a table page. Widths are relative weights, not character counts.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub key: String,
    pub title: String,
    pub width: u16,
    pub sortable: bool,
    pub align: Alignment,
}

impl Column {
    pub fn new(key: &str, title: &str, width: u16) -> Self {
        Self {
            key: key.to_string(),
            title: title.to_string(),
            width: width.max(1),
            sortable: false,
            align: Alignment::Left,
        }
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    pub fn align(mut self, align: Alignment) -> Self {
        self.align = align;
        self
    }
}
