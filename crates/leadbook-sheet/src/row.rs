//! Typed cells and header-keyed rows.

use chrono::{NaiveDate, NaiveDateTime};
use leadbook_core::lead::{APOLLO_ID, EMPLOYEES, FULL_NAME, LeadInput, PROFILE_TEXT_FIELDS};
use serde_json::{Map, Value, json};

use crate::error::{Error, Result};

// ─── CellValue ───────────────────────────────────────────────────────────────

/// A non-empty cell. Dates stay dates; nothing is reformatted at read time.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
  Text(String),
  Int(i64),
  Float(f64),
  Bool(bool),
  DateTime(NaiveDateTime),
}

impl CellValue {
  /// `None` for empty, whitespace-only, and error cells.
  pub fn from_data(data: &calamine::Data) -> Option<Self> {
    use calamine::Data;

    Some(match data {
      Data::String(s) | Data::DurationIso(s) if s.trim().is_empty() => return None,
      Data::String(s) | Data::DurationIso(s) => Self::Text(s.clone()),
      Data::DateTimeIso(s) => match parse_iso(s) {
        Some(dt) => Self::DateTime(dt),
        None => Self::Text(s.clone()),
      },
      Data::Int(i) => Self::Int(*i),
      Data::Float(f) => Self::Float(*f),
      Data::Bool(b) => Self::Bool(*b),
      Data::DateTime(dt) => match dt.as_datetime() {
        Some(dt) => Self::DateTime(dt),
        None => Self::Float(dt.as_f64()),
      },
      _ => return None,
    })
  }

  /// The textual form used for string fields. Integral floats drop the
  /// trailing `.0` so phone numbers and zip codes survive; dates become
  /// RFC 3339 (UTC).
  pub fn as_text(&self) -> String {
    match self {
      Self::Text(s) => s.clone(),
      Self::Int(i) => i.to_string(),
      Self::Float(f) => match integral(*f) {
        Some(i) => i.to_string(),
        None => f.to_string(),
      },
      Self::Bool(b) => b.to_string(),
      Self::DateTime(dt) => dt.and_utc().to_rfc3339(),
    }
  }

  /// A whole number, from an integer, an integral float, or numeric text
  /// (thousands separators allowed).
  pub fn as_count(&self) -> Option<i64> {
    match self {
      Self::Int(i) => Some(*i),
      Self::Float(f) => integral(*f),
      Self::Text(s) => {
        let s = s.trim().replace(',', "");
        s.parse().ok().or_else(|| s.parse().ok().and_then(integral))
      }
      Self::Bool(_) | Self::DateTime(_) => None,
    }
  }

  fn to_json(&self) -> Value {
    match self {
      Self::Text(s) => json!(s),
      Self::Int(i) => json!(i),
      Self::Float(f) => json!(f),
      Self::Bool(b) => json!(b),
      Self::DateTime(_) => json!(self.as_text()),
    }
  }
}

/// ISO 8601 date-time, or a bare date (ODS date cells) at midnight.
fn parse_iso(s: &str) -> Option<NaiveDateTime> {
  let s = s.trim();
  s.parse::<NaiveDateTime>().ok().or_else(|| {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
      .ok()
      .and_then(|d| d.and_hms_opt(0, 0, 0))
  })
}

fn integral(f: f64) -> Option<i64> {
  (f.fract() == 0.0 && f.abs() < 1e15).then_some(f as i64)
}

// ─── SheetRow ────────────────────────────────────────────────────────────────

/// One data row: `(header, cell)` pairs in column order. Empty cells are
/// absent.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRow {
  /// 1-based row number in the sheet, for error messages.
  pub row:   u32,
  pub cells: Vec<(String, CellValue)>,
}

impl SheetRow {
  pub fn get(&self, header: &str) -> Option<&CellValue> {
    self.cells.iter().find(|(h, _)| h == header).map(|(_, v)| v)
  }

  pub fn headers(&self) -> impl Iterator<Item = &str> {
    self.cells.iter().map(|(h, _)| h.as_str())
  }

  pub fn len(&self) -> usize { self.cells.len() }

  pub fn is_empty(&self) -> bool { self.cells.is_empty() }

  /// Map this row onto the lead input shape.
  ///
  /// Headers match lead fields ignoring case, spaces and punctuation, so
  /// `Full Name` fills `fullName`. Headers that match nothing are kept in
  /// `extra`. Fields without a cell stay absent and are defaulted later.
  pub fn to_lead_input(&self) -> Result<LeadInput> {
    let mut input = LeadInput::default();
    let mut extra = Map::new();

    for (header, cell) in &self.cells {
      match lead_key(header) {
        Some(EMPLOYEES) => {
          let count = cell.as_count().ok_or_else(|| Error::InvalidEmployees {
            row:   self.row,
            value: cell.as_text(),
          })?;
          input.employees = Some(count);
        }
        Some(key) => {
          input.set_text(key, cell.as_text());
        }
        None => {
          extra.insert(header.clone(), cell.to_json());
        }
      }
    }

    if !extra.is_empty() {
      input.extra = Some(extra);
    }
    Ok(input)
  }
}

fn lead_key(header: &str) -> Option<&'static str> {
  let wanted = fold(header);
  [APOLLO_ID, FULL_NAME, EMPLOYEES]
    .into_iter()
    .chain(PROFILE_TEXT_FIELDS)
    .find(|key| fold(key) == wanted)
}

fn fold(s: &str) -> String {
  s.chars()
    .filter(char::is_ascii_alphanumeric)
    .map(|c| c.to_ascii_lowercase())
    .collect()
}
