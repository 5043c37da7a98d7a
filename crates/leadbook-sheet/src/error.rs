//! Error types for the spreadsheet reader.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unreadable workbook: {0}")]
  Workbook(#[from] calamine::Error),

  #[error("workbook contains no sheets")]
  NoSheet,

  #[error("row {row}: employees must be a whole number, got {value:?}")]
  InvalidEmployees { row: u32, value: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
