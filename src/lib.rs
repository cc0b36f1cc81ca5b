//! Searchable, sortable table pages for mSupply supplier invoices, drawn in the terminal

pub mod cli;
pub mod config;
pub mod database;
pub mod localization;
pub mod models;
pub mod pages;
pub mod storage;
pub mod table;
pub mod tui;
pub mod utilities;
