//! Workbook → rows.
//!
//! Pipeline:
//!   path / bytes
//!     └─ calamine::open_workbook_auto*() → Sheets
//!          └─ worksheet_range_at(0)        → Range<Data>
//!               └─ rows_from_range()       → Vec<SheetRow>

use std::{
  io::{Cursor, Read, Seek},
  path::Path,
};

use calamine::{Data, Range, Reader, Sheets, open_workbook_auto, open_workbook_auto_from_rs};

use crate::{
  error::{Error, Result},
  row::{CellValue, SheetRow},
};

/// Read the first sheet of the workbook at `path`. The format is picked from
/// the file extension.
pub fn read_path(path: impl AsRef<Path>) -> Result<Vec<SheetRow>> {
  let mut workbook = open_workbook_auto(path)?;
  first_sheet(&mut workbook)
}

/// Read the first sheet of an in-memory workbook, sniffing its format.
pub fn read_bytes(bytes: Vec<u8>) -> Result<Vec<SheetRow>> {
  let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
  first_sheet(&mut workbook)
}

fn first_sheet<RS: Read + Seek>(workbook: &mut Sheets<RS>) -> Result<Vec<SheetRow>> {
  let range = workbook.worksheet_range_at(0).ok_or(Error::NoSheet)??;
  Ok(rows_from_range(&range))
}

/// Convert a sheet range into rows. The first row of the range is the header
/// row; rows with no non-empty cell are skipped.
pub fn rows_from_range(range: &Range<Data>) -> Vec<SheetRow> {
  // 1-based sheet row number of the header row.
  let first_row = range.start().map_or(1, |(r, _)| r + 1);

  let mut rows = range.rows();
  let Some(header_cells) = rows.next() else {
    return Vec::new();
  };
  let headers: Vec<Option<String>> = header_cells.iter().map(header_name).collect();

  rows
    .zip(first_row + 1..)
    .filter_map(|(cells, number)| {
      let cells: Vec<(String, CellValue)> = headers
        .iter()
        .zip(cells)
        .filter_map(|(header, data)| Some((header.clone()?, CellValue::from_data(data)?)))
        .collect();
      (!cells.is_empty()).then_some(SheetRow { row: number, cells })
    })
    .collect()
}

fn header_name(cell: &Data) -> Option<String> {
  let name = CellValue::from_data(cell)?.as_text();
  let name = name.trim();
  (!name.is_empty()).then(|| name.to_owned())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn text(s: &str) -> Data { Data::String(s.to_owned()) }

  fn range(rows: &[&[Data]]) -> Range<Data> {
    let width = rows.iter().map(|r| r.len()).max().unwrap_or(1) as u32;
    let mut range = Range::new((0, 0), (rows.len() as u32 - 1, width - 1));
    for (r, row) in rows.iter().enumerate() {
      for (c, cell) in row.iter().enumerate() {
        range.set_value((r as u32, c as u32), cell.clone());
      }
    }
    range
  }

  #[test]
  fn header_and_single_row() {
    let range = range(&[
      &[text("apolloId"), text("fullName")],
      &[text("ap-1"), text("Ada Lovelace")],
    ]);
    let rows = rows_from_range(&range);

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].row, 2);
    assert_eq!(rows[0].headers().collect::<Vec<_>>(), ["apolloId", "fullName"]);
    assert_eq!(rows[0].get("fullName"), Some(&CellValue::Text("Ada Lovelace".into())));
  }

  #[test]
  fn header_only_sheet_has_no_rows() {
    let range = range(&[&[text("apolloId"), text("fullName")]]);
    assert!(rows_from_range(&range).is_empty());
  }

  #[test]
  fn empty_range_has_no_rows() {
    assert!(rows_from_range(&Range::<Data>::empty()).is_empty());
  }

  #[test]
  fn blank_rows_skipped_and_numbering_kept() {
    let range = range(&[
      &[text("apolloId"), text("fullName")],
      &[text("ap-1"), text("Ada")],
      &[Data::Empty, text("   ")],
      &[text("ap-2"), text("Grace")],
    ]);
    let rows = rows_from_range(&range);

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].row, 4);
    assert_eq!(rows[1].get("apolloId"), Some(&CellValue::Text("ap-2".into())));
  }

  #[test]
  fn headers_are_trimmed_and_blank_columns_dropped() {
    let range = range(&[
      &[text("  apolloId "), Data::Empty, text("employees")],
      &[text("ap-1"), text("ignored"), Data::Float(12.0)],
    ]);
    let rows = rows_from_range(&range);

    assert_eq!(rows[0].headers().collect::<Vec<_>>(), ["apolloId", "employees"]);
    assert_eq!(rows[0].get("employees"), Some(&CellValue::Float(12.0)));
  }

  #[test]
  fn empty_cells_are_absent() {
    let range = range(&[
      &[text("apolloId"), text("fullName"), text("city")],
      &[text("ap-1"), text("Ada"), Data::Empty],
    ]);
    let rows = rows_from_range(&range);
    assert!(rows[0].get("city").is_none());
    assert_eq!(rows[0].len(), 2);
  }

  #[test]
  fn garbage_bytes_are_rejected() {
    let err = read_bytes(b"definitely not a workbook".to_vec()).unwrap_err();
    assert!(matches!(err, Error::Workbook(_)));
  }

  #[test]
  fn reads_checked_in_workbook() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/leads.xlsx");
    let rows = read_path(path).expect("fixture workbook");

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("apolloId"), Some(&CellValue::Text("ap-100".into())));
    assert_eq!(rows[1].row, 4);

    let first = rows[0].to_lead_input().unwrap();
    assert_eq!(first.full_name.as_deref(), Some("Ada Lovelace"));
    assert_eq!(first.employees, Some(120));
    let extra = first.extra.expect("unknown headers kept");
    assert_eq!(extra["Source"], "conference");

    let bytes = std::fs::read(path).unwrap();
    assert_eq!(read_bytes(bytes).unwrap(), rows);
  }
}
