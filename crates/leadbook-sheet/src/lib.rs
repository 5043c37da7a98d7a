//! Spreadsheet reader for Leadbook bulk imports.
//!
//! Turns the first sheet of a workbook into ordered [`SheetRow`]s keyed by
//! the header row, and maps each row onto a
//! [`leadbook_core::lead::LeadInput`]. Pure synchronous; no HTTP or database
//! dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! let rows = leadbook_sheet::read_path("leads.xlsx").unwrap();
//! for row in &rows {
//!   let input = row.to_lead_input().unwrap();
//!   println!("row {}: {:?}", row.row, input.full_name);
//! }
//! ```

pub mod error;
mod parse;
mod row;

pub use error::{Error, Result};
pub use parse::{read_bytes, read_path, rows_from_range};
pub use row::{CellValue, SheetRow};
