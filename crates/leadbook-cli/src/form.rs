//! Editable lead form state.

use leadbook_core::lead::{APOLLO_ID, EMPLOYEES, FULL_NAME, Lead, LeadInput, NOT_AVAILABLE};
use uuid::Uuid;

/// Form fields in display order: wire name and label.
const FIELDS: [(&str, &str); 25] = [
  (APOLLO_ID, "Apollo ID"),
  (FULL_NAME, "Full Name"),
  ("firstName", "First Name"),
  ("lastName", "Last Name"),
  ("email", "Email"),
  ("emailStatus", "Email Status"),
  ("jobTitle", "Job Title"),
  ("linkedinUrl", "LinkedIn"),
  ("companyName", "Company"),
  ("companyWebsite", "Website"),
  ("industry", "Industry"),
  ("keywords", "Keywords"),
  (EMPLOYEES, "Employees"),
  ("city", "City"),
  ("state", "State"),
  ("country", "Country"),
  ("companyCity", "Company City"),
  ("companyState", "Company State"),
  ("companyCountry", "Company Country"),
  ("companyLinkedinUrl", "Company LinkedIn"),
  ("companyTwitterUrl", "Company Twitter"),
  ("companyFacebookUrl", "Company Facebook"),
  ("companyPhoneNumbers", "Company Phones"),
  ("twitterUrl", "Twitter"),
  ("facebookUrl", "Facebook"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
  pub key:   &'static str,
  pub label: &'static str,
  pub value: String,
}

/// A lead being created (`editing == None`) or edited.
#[derive(Debug, Clone)]
pub struct LeadForm {
  pub editing: Option<Uuid>,
  pub fields:  Vec<FormField>,
  pub cursor:  usize,
}

impl LeadForm {
  /// A fresh, empty form for a new lead.
  pub fn blank() -> Self {
    Self {
      editing: None,
      fields:  FIELDS
        .iter()
        .map(|&(key, label)| FormField { key, label, value: String::new() })
        .collect(),
      cursor:  0,
    }
  }

  /// A form pre-filled from `lead`. Sentinel values show as empty.
  pub fn from_lead(lead: &Lead) -> Self {
    let mut form = Self::blank();
    form.editing = Some(lead.id);
    for field in &mut form.fields {
      field.value = match field.key {
        APOLLO_ID => lead.apollo_id.clone(),
        FULL_NAME => lead.full_name.clone(),
        EMPLOYEES => lead.profile.employees.to_string(),
        key => match lead.profile.text(key) {
          Some(NOT_AVAILABLE) | None => String::new(),
          Some(text) => text.to_owned(),
        },
      };
    }
    form
  }

  pub fn title(&self) -> &'static str {
    if self.editing.is_some() { "Edit lead" } else { "New lead" }
  }

  pub fn next(&mut self) { self.cursor = (self.cursor + 1) % self.fields.len(); }

  pub fn prev(&mut self) {
    self.cursor = self.cursor.checked_sub(1).unwrap_or(self.fields.len() - 1);
  }

  pub fn push(&mut self, c: char) { self.fields[self.cursor].value.push(c); }

  pub fn backspace(&mut self) { self.fields[self.cursor].value.pop(); }

  /// Build the request body.
  ///
  /// A new lead sends only the filled-in fields. An edit sends every field,
  /// so a cleared field resets to the server-side sentinel.
  pub fn to_input(&self) -> Result<LeadInput, String> {
    let mut input = LeadInput::default();
    for field in &self.fields {
      let value = field.value.trim();
      if value.is_empty() && self.editing.is_none() {
        continue;
      }
      if field.key == EMPLOYEES {
        input.employees = Some(match value {
          "" => 0,
          v => v.parse().map_err(|_| "Employees must be a whole number".to_owned())?,
        });
      } else {
        input.set_text(field.key, value);
      }
    }
    Ok(input)
  }
}
