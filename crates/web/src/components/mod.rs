//! Reusable UI component types.

pub mod data_table;

pub use data_table::{BulkAction, DataTableConfig, FilterOption, TableColumn, TableFilter, TableState};
