//! Spreadsheet viewer core: load CSV/XLSX uploads, type their columns and
//! filter them column by column.

pub mod cache;
pub mod config;
pub mod data;
pub mod error;
