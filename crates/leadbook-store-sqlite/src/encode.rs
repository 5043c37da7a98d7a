//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. The lead profile and extra
//! attributes are stored as compact JSON. UUIDs are stored as hyphenated
//! lowercase strings.

use chrono::{DateTime, Utc};
use leadbook_core::{
  account::Account,
  lead::{Lead, LeadProfile},
};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Profile / extra ──────────────────────────────────────────────────────────

pub fn encode_profile(p: &LeadProfile) -> Result<String> {
  Ok(serde_json::to_string(p)?)
}

pub fn decode_profile(s: &str) -> Result<LeadProfile> {
  Ok(serde_json::from_str(s)?)
}

pub fn encode_extra(extra: &Map<String, Value>) -> Result<String> {
  Ok(serde_json::to_string(extra)?)
}

pub fn decode_extra(s: &str) -> Result<Map<String, Value>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Column bundles ───────────────────────────────────────────────────────────

/// Owned column values for one `leads` row, ready to move into a
/// `Connection::call` closure.
pub struct LeadRow {
  pub lead_id:      String,
  pub apollo_id:    String,
  pub full_name:    String,
  pub profile_json: String,
  pub extra_json:   String,
  pub created_at:   String,
  pub updated_at:   String,
}

impl LeadRow {
  pub fn encode(lead: &Lead) -> Result<Self> {
    Ok(Self {
      lead_id:      encode_uuid(lead.id),
      apollo_id:    lead.apollo_id.clone(),
      full_name:    lead.full_name.clone(),
      profile_json: encode_profile(&lead.profile)?,
      extra_json:   encode_extra(&lead.extra)?,
      created_at:   encode_dt(lead.created_at),
      updated_at:   encode_dt(lead.updated_at),
    })
  }

  /// Column order matches [`LEAD_COLUMNS`].
  pub fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      lead_id:      row.get(0)?,
      apollo_id:    row.get(1)?,
      full_name:    row.get(2)?,
      profile_json: row.get(3)?,
      extra_json:   row.get(4)?,
      created_at:   row.get(5)?,
      updated_at:   row.get(6)?,
    })
  }

  pub fn into_lead(self) -> Result<Lead> {
    Ok(Lead {
      id:         decode_uuid(&self.lead_id)?,
      apollo_id:  self.apollo_id,
      full_name:  self.full_name,
      profile:    decode_profile(&self.profile_json)?,
      extra:      decode_extra(&self.extra_json)?,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

pub const LEAD_COLUMNS: &str =
  "lead_id, apollo_id, full_name, profile_json, extra_json, created_at, updated_at";

/// Raw strings read directly from an `accounts` row.
pub struct RawAccount {
  pub account_id:    String,
  pub email:         String,
  pub name:          String,
  pub password_hash: String,
  pub created_at:    String,
}

impl RawAccount {
  pub fn into_account(self) -> Result<Account> {
    Ok(Account {
      id:            decode_uuid(&self.account_id)?,
      email:         self.email,
      name:          self.name,
      password_hash: self.password_hash,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}
