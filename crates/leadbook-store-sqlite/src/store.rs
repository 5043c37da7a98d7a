//! [`SqliteStore`]: the SQLite implementation of [`LeadStore`] and
//! [`AccountStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use leadbook_core::{
  account::{Account, NewAccount},
  lead::{APOLLO_ID, Lead, NewLead},
  store::{AccountStore, Conflict, LeadStore},
};

use crate::{
  Error, Result,
  encode::{LEAD_COLUMNS, LeadRow, RawAccount, decode_dt, encode_dt, encode_uuid},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Leadbook store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// Result of a write that may trip a UNIQUE constraint.
enum Outcome<T> {
  Done(T),
  Duplicate,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

fn stamp(input: NewLead, now: DateTime<Utc>) -> Lead {
  Lead {
    id:         Uuid::new_v4(),
    apollo_id:  input.apollo_id,
    full_name:  input.full_name,
    profile:    input.profile,
    extra:      input.extra,
    created_at: now,
    updated_at: now,
  }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
  matches!(
    err,
    rusqlite::Error::SqliteFailure(e, _)
      if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
  )
}

fn insert_row(conn: &rusqlite::Connection, row: &LeadRow) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO leads (
       lead_id, apollo_id, full_name, profile_json, extra_json, created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    rusqlite::params![
      row.lead_id,
      row.apollo_id,
      row.full_name,
      row.profile_json,
      row.extra_json,
      row.created_at,
      row.updated_at,
    ],
  )?;
  Ok(())
}

fn apollo_conflict(apollo_id: &str, index: Option<usize>) -> Error {
  Error::Conflict(Conflict {
    field: APOLLO_ID,
    value: apollo_id.to_owned(),
    index,
  })
}

// ─── LeadStore impl ──────────────────────────────────────────────────────────

impl LeadStore for SqliteStore {
  type Error = Error;

  async fn list_leads(&self) -> Result<Vec<Lead>> {
    let rows: Vec<LeadRow> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {LEAD_COLUMNS} FROM leads ORDER BY rowid"))?;
        let rows = stmt
          .query_map([], LeadRow::read)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    rows.into_iter().map(LeadRow::into_lead).collect()
  }

  async fn get_lead(&self, id: Uuid) -> Result<Option<Lead>> {
    let id_str = encode_uuid(id);

    let row: Option<LeadRow> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {LEAD_COLUMNS} FROM leads WHERE lead_id = ?1"),
              rusqlite::params![id_str],
              LeadRow::read,
            )
            .optional()?,
        )
      })
      .await?;

    row.map(LeadRow::into_lead).transpose()
  }

  async fn insert_lead(&self, input: NewLead) -> Result<Lead> {
    let lead = stamp(input, Utc::now());
    let row = LeadRow::encode(&lead)?;

    let outcome = self
      .conn
      .call(move |conn| match insert_row(conn, &row) {
        Ok(()) => Ok(Outcome::Done(())),
        Err(e) if is_unique_violation(&e) => Ok(Outcome::Duplicate),
        Err(e) => Err(e.into()),
      })
      .await?;

    match outcome {
      Outcome::Done(()) => Ok(lead),
      Outcome::Duplicate => Err(apollo_conflict(&lead.apollo_id, None)),
    }
  }

  async fn insert_leads(&self, inputs: Vec<NewLead>) -> Result<Vec<Lead>> {
    let now = Utc::now();
    let leads: Vec<Lead> = inputs.into_iter().map(|l| stamp(l, now)).collect();
    let rows = leads.iter().map(LeadRow::encode).collect::<Result<Vec<_>>>()?;

    // The transaction rolls back when dropped without `commit`, so an early
    // return leaves no element of the batch behind.
    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        for (index, row) in rows.iter().enumerate() {
          match insert_row(&tx, row) {
            Ok(()) => {}
            Err(e) if is_unique_violation(&e) => return Ok(Some(index)),
            Err(e) => return Err(e.into()),
          }
        }
        tx.commit()?;
        Ok(None)
      })
      .await?;

    if let Some(index) = outcome {
      tracing::debug!(index, "lead batch rolled back on duplicate apolloId");
      return Err(apollo_conflict(&leads[index].apollo_id, Some(index)));
    }

    tracing::debug!(count = leads.len(), "lead batch committed");
    Ok(leads)
  }

  async fn replace_lead(&self, lead: Lead) -> Result<Option<Lead>> {
    let mut lead = lead;
    lead.updated_at = Utc::now();
    let row = LeadRow::encode(&lead)?;

    let outcome: Outcome<Option<String>> = self
      .conn
      .call(move |conn| {
        let updated = conn
          .query_row(
            "UPDATE leads
             SET apollo_id = ?2, full_name = ?3, profile_json = ?4,
                 extra_json = ?5, updated_at = ?6
             WHERE lead_id = ?1
             RETURNING created_at",
            rusqlite::params![
              row.lead_id,
              row.apollo_id,
              row.full_name,
              row.profile_json,
              row.extra_json,
              row.updated_at,
            ],
            |r| r.get::<_, String>(0),
          )
          .optional();
        match updated {
          Ok(created_at) => Ok(Outcome::Done(created_at)),
          Err(e) if is_unique_violation(&e) => Ok(Outcome::Duplicate),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    match outcome {
      Outcome::Done(None) => Ok(None),
      Outcome::Done(Some(created_at)) => {
        lead.created_at = decode_dt(&created_at)?;
        Ok(Some(lead))
      }
      Outcome::Duplicate => Err(apollo_conflict(&lead.apollo_id, None)),
    }
  }

  async fn delete_lead(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM leads WHERE lead_id = ?1", rusqlite::params![id_str])?)
      })
      .await?;

    Ok(removed > 0)
  }
}

// ─── AccountStore impl ───────────────────────────────────────────────────────

impl AccountStore for SqliteStore {
  async fn create_account(&self, input: NewAccount) -> Result<Account> {
    let account = Account {
      id:            Uuid::new_v4(),
      email:         input.email.trim().to_owned(),
      name:          input.name,
      password_hash: input.password_hash,
      created_at:    Utc::now(),
    };

    let id_str = encode_uuid(account.id);
    let email = account.email.clone();
    let name = account.name.clone();
    let hash = account.password_hash.clone();
    let at_str = encode_dt(account.created_at);

    let outcome = self
      .conn
      .call(move |conn| {
        let inserted = conn.execute(
          "INSERT INTO accounts (account_id, email, name, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, email, name, hash, at_str],
        );
        match inserted {
          Ok(_) => Ok(Outcome::Done(())),
          Err(e) if is_unique_violation(&e) => Ok(Outcome::Duplicate),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    match outcome {
      Outcome::Done(()) => Ok(account),
      Outcome::Duplicate => Err(Error::Conflict(Conflict {
        field: "email",
        value: account.email,
        index: None,
      })),
    }
  }

  async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>> {
    let email = email.trim().to_owned();

    let raw: Option<RawAccount> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT account_id, email, name, password_hash, created_at
               FROM accounts WHERE email = ?1",
              rusqlite::params![email],
              |row| {
                Ok(RawAccount {
                  account_id:    row.get(0)?,
                  email:         row.get(1)?,
                  name:          row.get(2)?,
                  password_hash: row.get(3)?,
                  created_at:    row.get(4)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAccount::into_account).transpose()
  }
}
