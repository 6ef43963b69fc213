//! Normalizes a carrier commission-statement workbook into the shared
//! canonical "Data" table.

pub mod config;
pub mod grid;
pub mod process;

pub use config::PipelineConfig;
pub use process::{normalize_workbook, process_statement, RunSummary};
