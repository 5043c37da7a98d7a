//! Workbook rows held in memory between parsing and bulk submission.

use std::path::{Path, PathBuf};

use leadbook_core::lead::LeadInput;
use leadbook_sheet::SheetRow;

/// Rows shown on the review screen.
pub const PREVIEW_ROWS: usize = 5;

#[derive(Debug, Clone)]
pub struct StagedImport {
  pub source: PathBuf,
  pub leads:  Vec<LeadInput>,
}

impl StagedImport {
  /// Parse the first sheet of the workbook at `path`.
  pub fn load(path: &Path) -> leadbook_sheet::Result<Self> {
    let rows = leadbook_sheet::read_path(path)?;
    Self::from_rows(path.to_path_buf(), &rows)
  }

  pub fn from_rows(source: PathBuf, rows: &[SheetRow]) -> leadbook_sheet::Result<Self> {
    let leads = rows.iter().map(SheetRow::to_lead_input).collect::<Result<_, _>>()?;
    Ok(Self { source, leads })
  }

  pub fn total(&self) -> usize { self.leads.len() }

  pub fn is_empty(&self) -> bool { self.leads.is_empty() }

  pub fn preview(&self) -> &[LeadInput] { &self.leads[..self.leads.len().min(PREVIEW_ROWS)] }
}

#[cfg(test)]
mod tests {
  use leadbook_sheet::CellValue;

  use super::*;

  fn row(n: u32, apollo_id: &str) -> SheetRow {
    SheetRow {
      row:   n,
      cells: vec![
        ("apolloId".into(), CellValue::Text(apollo_id.into())),
        ("Full Name".into(), CellValue::Text(format!("Lead {n}"))),
      ],
    }
  }

  #[test]
  fn preview_is_capped() {
    let rows: Vec<_> = (2..10).map(|n| row(n, &format!("ap-{n}"))).collect();
    let staged = StagedImport::from_rows("leads.xlsx".into(), &rows).unwrap();
    assert_eq!(staged.total(), 8);
    assert_eq!(staged.preview().len(), PREVIEW_ROWS);
    assert_eq!(staged.preview()[0].apollo_id.as_deref(), Some("ap-2"));
  }

  #[test]
  fn short_sheets_preview_everything() {
    let staged = StagedImport::from_rows("leads.xlsx".into(), &[row(2, "ap-2")]).unwrap();
    assert_eq!(staged.preview().len(), 1);
    assert!(!staged.is_empty());
  }

  #[test]
  fn empty_sheet_stages_nothing() {
    let staged = StagedImport::from_rows("leads.xlsx".into(), &[]).unwrap();
    assert!(staged.is_empty());
    assert!(staged.preview().is_empty());
  }

  #[test]
  fn bad_employee_count_fails_staging() {
    let mut bad = row(3, "ap-3");
    bad.cells.push(("employees".into(), CellValue::Text("many".into())));
    let err = StagedImport::from_rows("leads.xlsx".into(), &[row(2, "ap-2"), bad]).unwrap_err();
    assert!(matches!(err, leadbook_sheet::Error::InvalidEmployees { row: 3, .. }));
  }

  #[test]
  fn fixture_workbook_loads() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../leadbook-sheet/fixtures/leads.xlsx");
    let staged = StagedImport::load(&path).unwrap();
    assert_eq!(staged.total(), 2);
    assert_eq!(staged.preview()[1].full_name.as_deref(), Some("Grace Hopper"));
  }

  #[test]
  fn missing_file_is_an_error() {
    assert!(StagedImport::load(Path::new("/nonexistent/leads.xlsx")).is_err());
  }
}
