//! SQL schema for the Leadbook SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One row per lead. Insertion order (rowid) is the listing order.
CREATE TABLE IF NOT EXISTS leads (
    lead_id      TEXT PRIMARY KEY,
    apollo_id    TEXT NOT NULL UNIQUE,
    full_name    TEXT NOT NULL,
    profile_json TEXT NOT NULL,              -- LeadProfile, every field present
    extra_json   TEXT NOT NULL DEFAULT '{}', -- attributes outside the schema
    created_at   TEXT NOT NULL,              -- ISO 8601 UTC; server-assigned
    updated_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS accounts (
    account_id    TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE COLLATE NOCASE,
    name          TEXT NOT NULL,
    password_hash TEXT NOT NULL,             -- argon2 PHC string
    created_at    TEXT NOT NULL
);

PRAGMA user_version = 1;
";
