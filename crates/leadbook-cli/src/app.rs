//! Application state and key handling for the terminal UI.
//!
//! Every mutation is followed by a full re-fetch of the lead list; the table
//! never patches itself from a mutation response.

use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use fuzzy_matcher::{FuzzyMatcher, skim::SkimMatcherV2};
use leadbook_core::lead::Lead;

use crate::{client::ApiClient, form::LeadForm, staging::StagedImport};

// ─── Screen ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
  LeadList,
  LeadForm,
  ConfirmDelete,
  ImportPath,
  ImportReview,
}

// ─── App ──────────────────────────────────────────────────────────────────────

pub struct App {
  pub screen:      Screen,
  pub client:      Arc<ApiClient>,
  pub leads:       Vec<Lead>,
  /// Cursor into [`App::visible`].
  pub list_cursor: usize,
  pub filter:      String,
  pub filtering:   bool,
  pub form:        Option<LeadForm>,
  pub path_input:  String,
  pub staged:      Option<StagedImport>,
  pub status_msg:  String,
  matcher:         SkimMatcherV2,
}

impl App {
  pub fn new(client: ApiClient) -> Self {
    Self {
      screen:      Screen::LeadList,
      client:      Arc::new(client),
      leads:       Vec::new(),
      list_cursor: 0,
      filter:      String::new(),
      filtering:   false,
      form:        None,
      path_input:  String::new(),
      staged:      None,
      status_msg:  String::new(),
      matcher:     SkimMatcherV2::default(),
    }
  }

  /// Log in and load the first page of leads.
  pub async fn connect(&mut self) -> Result<()> {
    let account = self.client.login().await?;
    self.status_msg = format!("Signed in as {} at {}", account.email, self.client.active_url());
    self.refresh().await;
    Ok(())
  }

  /// Re-fetch the full lead list. A failure keeps the previous list.
  pub async fn refresh(&mut self) {
    match self.client.list_leads().await {
      Ok(leads) => {
        self.leads = leads;
        let len = self.visible().len();
        self.list_cursor = self.list_cursor.min(len.saturating_sub(1));
      }
      Err(e) => {
        tracing::warn!(error = %e, "refresh failed");
        self.status_msg = if e.is_retryable() {
          format!("{e}  (r to retry)")
        } else {
          format!("Refresh failed: {}", e.summary())
        };
      }
    }
  }

  /// Leads that match the current filter, best match first.
  pub fn visible(&self) -> Vec<&Lead> {
    if self.filter.is_empty() {
      return self.leads.iter().collect();
    }
    let mut scored: Vec<(i64, &Lead)> = self
      .leads
      .iter()
      .filter_map(|lead| {
        let haystack = format!(
          "{} {} {}",
          lead.full_name, lead.profile.email, lead.profile.company_name
        );
        self
          .matcher
          .fuzzy_match(&haystack, &self.filter)
          .map(|score| (score, lead))
      })
      .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().map(|(_, lead)| lead).collect()
  }

  pub fn selected(&self) -> Option<&Lead> { self.visible().get(self.list_cursor).copied() }

  // ── Key handling ────────────────────────────────────────────────────────────

  /// Returns `false` when the app should exit.
  pub async fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      return Ok(false);
    }

    match self.screen {
      Screen::LeadList if self.filtering => self.handle_filter_key(key),
      Screen::LeadList => return self.handle_list_key(key).await,
      Screen::LeadForm => self.handle_form_key(key).await,
      Screen::ConfirmDelete => self.handle_confirm_key(key).await,
      Screen::ImportPath => self.handle_path_key(key),
      Screen::ImportReview => self.handle_review_key(key).await,
    }
    Ok(true)
  }

  async fn handle_list_key(&mut self, key: KeyEvent) -> Result<bool> {
    let len = self.visible().len();
    match key.code {
      KeyCode::Char('q') => return Ok(false),
      KeyCode::Down | KeyCode::Char('j') => {
        if self.list_cursor + 1 < len {
          self.list_cursor += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        self.list_cursor = self.list_cursor.saturating_sub(1);
      }
      KeyCode::Char('/') => {
        self.filtering = true;
        self.status_msg.clear();
      }
      KeyCode::Esc => {
        self.filter.clear();
        self.list_cursor = 0;
      }
      KeyCode::Char('a') => {
        self.form = Some(LeadForm::blank());
        self.screen = Screen::LeadForm;
        self.status_msg.clear();
      }
      KeyCode::Char('e') | KeyCode::Enter => {
        if let Some(lead) = self.selected() {
          self.form = Some(LeadForm::from_lead(lead));
          self.screen = Screen::LeadForm;
          self.status_msg.clear();
        }
      }
      KeyCode::Char('d') => {
        if self.selected().is_some() {
          self.screen = Screen::ConfirmDelete;
        }
      }
      KeyCode::Char('i') => {
        self.path_input.clear();
        self.screen = Screen::ImportPath;
        self.status_msg.clear();
      }
      KeyCode::Char('r') => {
        self.refresh().await;
        self.status_msg = format!("{} leads", self.leads.len());
      }
      _ => {}
    }
    Ok(true)
  }

  fn handle_filter_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Enter => self.filtering = false,
      KeyCode::Esc => {
        self.filtering = false;
        self.filter.clear();
      }
      KeyCode::Backspace => {
        self.filter.pop();
      }
      KeyCode::Char(c) => self.filter.push(c),
      _ => return,
    }
    self.list_cursor = 0;
  }

  async fn handle_form_key(&mut self, key: KeyEvent) {
    let Some(form) = self.form.as_mut() else {
      self.screen = Screen::LeadList;
      return;
    };
    match key.code {
      KeyCode::Esc => {
        self.form = None;
        self.screen = Screen::LeadList;
        self.status_msg = "Discarded".into();
      }
      KeyCode::Tab | KeyCode::Down => form.next(),
      KeyCode::BackTab | KeyCode::Up => form.prev(),
      KeyCode::Backspace => form.backspace(),
      KeyCode::Char(c) => form.push(c),
      KeyCode::Enter => self.submit_form().await,
      _ => {}
    }
  }

  /// Create or update from the open form. The form stays open on failure.
  async fn submit_form(&mut self) {
    let Some(form) = &self.form else { return };
    let input = match form.to_input() {
      Ok(input) => input,
      Err(message) => {
        self.status_msg = message;
        return;
      }
    };

    let result = match form.editing {
      Some(id) => self.client.update_lead(id, &input).await,
      None => self.client.create_lead(&input).await,
    };
    match result {
      Ok(lead) => {
        self.status_msg = format!("Saved {}", lead.full_name);
        self.form = None;
        self.screen = Screen::LeadList;
      }
      Err(e) => {
        self.status_msg = e.summary();
        return;
      }
    }
    self.refresh().await;
  }

  async fn handle_confirm_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Char('y') | KeyCode::Char('Y') => {
        if let Some(lead) = self.selected() {
          let (id, name) = (lead.id, lead.full_name.clone());
          self.status_msg = match self.client.delete_lead(id).await {
            Ok(()) => format!("Deleted {name}"),
            Err(e) => e.summary(),
          };
        }
        self.screen = Screen::LeadList;
        self.refresh().await;
      }
      KeyCode::Char('n') | KeyCode::Esc => self.screen = Screen::LeadList,
      _ => {}
    }
  }

  fn handle_path_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc => self.screen = Screen::LeadList,
      KeyCode::Backspace => {
        self.path_input.pop();
      }
      KeyCode::Char(c) => self.path_input.push(c),
      KeyCode::Enter => {
        let path = PathBuf::from(self.path_input.trim());
        match StagedImport::load(&path) {
          Ok(staged) => {
            self.status_msg = format!("{} rows read from {}", staged.total(), path.display());
            self.staged = Some(staged);
            self.screen = Screen::ImportReview;
          }
          Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "workbook rejected");
            self.status_msg = format!("Could not read {}: {e}", path.display());
            self.screen = Screen::LeadList;
          }
        }
      }
      _ => {}
    }
  }

  async fn handle_review_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc | KeyCode::Char('n') => {
        self.staged = None;
        self.screen = Screen::LeadList;
        self.status_msg = "Import discarded".into();
      }
      KeyCode::Char('y') | KeyCode::Char('Y') => {
        let Some(staged) = self.staged.take() else {
          self.screen = Screen::LeadList;
          return;
        };
        if staged.is_empty() {
          self.status_msg = "Nothing to import".into();
          self.screen = Screen::LeadList;
          return;
        }
        self.status_msg = match self.client.bulk_import(&staged.leads).await {
          Ok(resp) => {
            tracing::info!(count = resp.inserted_leads.len(), "bulk import accepted");
            resp.message
          }
          // Any failure leaves the store state unknown; the re-fetch shows it.
          Err(e) => format!("Import failed: {}", e.summary()),
        };
        self.screen = Screen::LeadList;
        self.refresh().await;
      }
      _ => {}
    }
  }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
