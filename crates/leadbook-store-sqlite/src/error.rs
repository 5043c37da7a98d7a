//! Error type for `leadbook-store-sqlite`.

use leadbook_core::store::{Conflict, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A unique column (`apollo_id`, account `email`) already holds the value.
  #[error("{0}")]
  Conflict(Conflict),
}

impl StoreError for Error {
  fn conflict(&self) -> Option<&Conflict> {
    match self {
      Self::Conflict(c) => Some(c),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
