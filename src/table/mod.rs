//! Generic table page: state machine, cell descriptors and render model

pub mod cell;
pub mod column;
pub mod errors;
pub mod focus;
pub mod input;
pub mod page;
pub mod render;

pub use cell::{
    Cell, CheckableCell, CheckableIcons, EditableCell, InputConstraints, KeyboardType,
    ReturnKeyType,
};
pub use column::{Alignment, Column};
pub use errors::TableError;
pub use focus::{FocusController, FocusHandle};
pub use input::InputField;
pub use page::{DataQuery, DatabaseEvent, PageAction, TablePage, TablePageBuilder, TableRecord};
pub use render::{CellView, CheckState, HeaderView, RowView};
