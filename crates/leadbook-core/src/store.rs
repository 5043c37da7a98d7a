//! The `LeadStore` and `AccountStore` traits.
//!
//! The traits are implemented by storage backends (e.g.
//! `leadbook-store-sqlite`). Higher layers (`leadbook-api`, `leadbook-server`)
//! depend on this abstraction, not on any concrete backend.

use std::{fmt, future::Future};

use uuid::Uuid;

use crate::{
  account::{Account, NewAccount},
  lead::{Lead, NewLead},
};

// ─── Errors ──────────────────────────────────────────────────────────────────

/// A uniqueness violation reported by a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
  /// Wire name of the unique field, e.g. `"apolloId"`.
  pub field: &'static str,
  pub value: String,
  /// Position within a batch, when the write was a bulk insert.
  pub index: Option<usize>,
}

impl fmt::Display for Conflict {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "duplicate {} {:?}", self.field, self.value)?;
    if let Some(index) = self.index {
      write!(f, " at index {index}")?;
    }
    Ok(())
  }
}

/// Backend errors must say whether they are a uniqueness conflict so the API
/// layer can answer 409 instead of 500.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn conflict(&self) -> Option<&Conflict>;
}

// ─── Leads ───────────────────────────────────────────────────────────────────

/// Abstraction over a lead store backend.
///
/// `apolloId` is unique: inserts and replacements that would duplicate it
/// fail with an error whose [`StoreError::conflict`] is `Some`.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait LeadStore: Send + Sync {
  type Error: StoreError;

  /// All leads in creation order.
  fn list_leads(&self) -> impl Future<Output = Result<Vec<Lead>, Self::Error>> + Send + '_;

  /// Retrieve a lead by its generated id. Returns `None` if not found.
  fn get_lead(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Lead>, Self::Error>> + Send + '_;

  /// Persist a new lead, assigning its id and timestamps.
  fn insert_lead(
    &self,
    lead: NewLead,
  ) -> impl Future<Output = Result<Lead, Self::Error>> + Send + '_;

  /// Persist a batch atomically: on success every element is stored, on any
  /// failure none is. Returned leads keep the input order.
  fn insert_leads(
    &self,
    leads: Vec<NewLead>,
  ) -> impl Future<Output = Result<Vec<Lead>, Self::Error>> + Send + '_;

  /// Overwrite the stored lead with the same id. `created_at` is preserved and
  /// `updated_at` refreshed. Returns `None` if no such lead exists.
  fn replace_lead(
    &self,
    lead: Lead,
  ) -> impl Future<Output = Result<Option<Lead>, Self::Error>> + Send + '_;

  /// Permanently remove a lead. Returns `false` if it did not exist.
  fn delete_lead(&self, id: Uuid) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}

// ─── Accounts ────────────────────────────────────────────────────────────────

/// Account storage; account emails are unique (case-insensitive).
pub trait AccountStore: LeadStore {
  fn create_account(
    &self,
    account: NewAccount,
  ) -> impl Future<Output = Result<Account, Self::Error>> + Send + '_;

  fn find_account_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + 'a;
}
