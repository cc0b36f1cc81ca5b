//! Reusable widgets for the terminal screens

pub mod data_table;
pub mod supplier_select;

pub use data_table::{format_plain_table, render_table_page};
pub use supplier_select::SupplierSelect;
