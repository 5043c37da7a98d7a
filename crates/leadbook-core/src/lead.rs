//! Lead types: the sole record kept by the store.
//!
//! A [`Lead`] is always fully shaped: every optional profile field resolves to
//! a defined default (`"N/A"`, or `0` for `employees`) when the caller omits
//! it. Callers speak in [`LeadInput`], where everything is optional; the store
//! only ever sees resolved [`NewLead`] values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{Error, Result, validate};

/// Sentinel stored for text fields the caller did not supply.
pub const NOT_AVAILABLE: &str = "N/A";

/// Wire names of the two required fields.
pub const APOLLO_ID: &str = "apolloId";
pub const FULL_NAME: &str = "fullName";
pub const EMPLOYEES: &str = "employees";

/// Wire names of every text profile field, in display order.
pub const PROFILE_TEXT_FIELDS: [&str; 22] = [
  "linkedinUrl",
  "firstName",
  "lastName",
  "email",
  "emailStatus",
  "jobTitle",
  "companyName",
  "companyWebsite",
  "city",
  "state",
  "country",
  "industry",
  "keywords",
  "companyCity",
  "companyState",
  "companyCountry",
  "companyLinkedinUrl",
  "companyTwitterUrl",
  "companyFacebookUrl",
  "companyPhoneNumbers",
  "twitterUrl",
  "facebookUrl",
];

// ─── Profile ─────────────────────────────────────────────────────────────────

/// The descriptive part of a lead. Never partially shaped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadProfile {
  pub linkedin_url:          String,
  pub first_name:            String,
  pub last_name:             String,
  /// Not unique; several leads may share an address.
  pub email:                 String,
  pub email_status:          String,
  pub job_title:             String,
  pub company_name:          String,
  pub company_website:       String,
  pub city:                  String,
  pub state:                 String,
  pub country:               String,
  pub industry:              String,
  pub keywords:              String,
  pub employees:             i64,
  pub company_city:          String,
  pub company_state:         String,
  pub company_country:       String,
  pub company_linkedin_url:  String,
  pub company_twitter_url:   String,
  pub company_facebook_url:  String,
  pub company_phone_numbers: String,
  pub twitter_url:           String,
  pub facebook_url:          String,
}

impl Default for LeadProfile {
  fn default() -> Self {
    let na = || NOT_AVAILABLE.to_owned();
    Self {
      linkedin_url:          na(),
      first_name:            na(),
      last_name:             na(),
      email:                 na(),
      email_status:          na(),
      job_title:             na(),
      company_name:          na(),
      company_website:       na(),
      city:                  na(),
      state:                 na(),
      country:               na(),
      industry:              na(),
      keywords:              na(),
      employees:             0,
      company_city:          na(),
      company_state:         na(),
      company_country:       na(),
      company_linkedin_url:  na(),
      company_twitter_url:   na(),
      company_facebook_url:  na(),
      company_phone_numbers: na(),
      twitter_url:           na(),
      facebook_url:          na(),
    }
  }
}

impl LeadProfile {
  /// Read a text field by its wire name.
  pub fn text(&self, key: &str) -> Option<&str> {
    let value = match key {
      "linkedinUrl" => &self.linkedin_url,
      "firstName" => &self.first_name,
      "lastName" => &self.last_name,
      "email" => &self.email,
      "emailStatus" => &self.email_status,
      "jobTitle" => &self.job_title,
      "companyName" => &self.company_name,
      "companyWebsite" => &self.company_website,
      "city" => &self.city,
      "state" => &self.state,
      "country" => &self.country,
      "industry" => &self.industry,
      "keywords" => &self.keywords,
      "companyCity" => &self.company_city,
      "companyState" => &self.company_state,
      "companyCountry" => &self.company_country,
      "companyLinkedinUrl" => &self.company_linkedin_url,
      "companyTwitterUrl" => &self.company_twitter_url,
      "companyFacebookUrl" => &self.company_facebook_url,
      "companyPhoneNumbers" => &self.company_phone_numbers,
      "twitterUrl" => &self.twitter_url,
      "facebookUrl" => &self.facebook_url,
      _ => return None,
    };
    Some(value.as_str())
  }

  fn text_mut(&mut self, key: &str) -> Option<&mut String> {
    Some(match key {
      "linkedinUrl" => &mut self.linkedin_url,
      "firstName" => &mut self.first_name,
      "lastName" => &mut self.last_name,
      "email" => &mut self.email,
      "emailStatus" => &mut self.email_status,
      "jobTitle" => &mut self.job_title,
      "companyName" => &mut self.company_name,
      "companyWebsite" => &mut self.company_website,
      "city" => &mut self.city,
      "state" => &mut self.state,
      "country" => &mut self.country,
      "industry" => &mut self.industry,
      "keywords" => &mut self.keywords,
      "companyCity" => &mut self.company_city,
      "companyState" => &mut self.company_state,
      "companyCountry" => &mut self.company_country,
      "companyLinkedinUrl" => &mut self.company_linkedin_url,
      "companyTwitterUrl" => &mut self.company_twitter_url,
      "companyFacebookUrl" => &mut self.company_facebook_url,
      "companyPhoneNumbers" => &mut self.company_phone_numbers,
      "twitterUrl" => &mut self.twitter_url,
      "facebookUrl" => &mut self.facebook_url,
      _ => return None,
    })
  }
}

// ─── Lead ────────────────────────────────────────────────────────────────────

/// A stored lead. `id` and `created_at` are assigned by the store exactly
/// once and never change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
  pub id:         Uuid,
  /// Externally assigned identifier; unique within the store.
  pub apollo_id:  String,
  pub full_name:  String,
  #[serde(flatten)]
  pub profile:    LeadProfile,
  /// Attributes outside the fixed schema, kept as supplied.
  #[serde(default)]
  pub extra:      Map<String, Value>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

// ─── NewLead ─────────────────────────────────────────────────────────────────

/// Input to [`crate::store::LeadStore::insert_lead`]: validated and fully
/// defaulted. `id` and timestamps are always set by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLead {
  pub apollo_id: String,
  pub full_name: String,
  pub profile:   LeadProfile,
  pub extra:     Map<String, Value>,
}

// ─── LeadInput ───────────────────────────────────────────────────────────────

/// The caller-facing shape of a lead: every field optional.
///
/// Used for single create, bulk elements, and updates. Unknown top-level keys
/// (e.g. `id`, `createdAt` when a client echoes a stored lead back) are
/// ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadInput {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub apollo_id:             Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub full_name:             Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub linkedin_url:          Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub first_name:            Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub last_name:             Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub email:                 Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub email_status:          Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub job_title:             Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub company_name:          Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub company_website:       Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub city:                  Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub state:                 Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub country:               Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub industry:              Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub keywords:              Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub employees:             Option<i64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub company_city:          Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub company_state:         Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub company_country:       Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub company_linkedin_url:  Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub company_twitter_url:   Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub company_facebook_url:  Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub company_phone_numbers: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub twitter_url:           Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub facebook_url:          Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub extra:                 Option<Map<String, Value>>,
}

impl LeadInput {
  /// Read a text field (required or profile) by its wire name.
  pub fn text(&self, key: &str) -> Option<&str> {
    self.slot(key).and_then(Option::as_deref)
  }

  /// Set a text field by its wire name. Returns `false` for keys that are not
  /// text fields of the lead schema.
  pub fn set_text(&mut self, key: &str, value: impl Into<String>) -> bool {
    match self.slot_mut(key) {
      Some(slot) => {
        *slot = Some(value.into());
        true
      }
      None => false,
    }
  }

  fn slot(&self, key: &str) -> Option<&Option<String>> {
    Some(match key {
      APOLLO_ID => &self.apollo_id,
      FULL_NAME => &self.full_name,
      "linkedinUrl" => &self.linkedin_url,
      "firstName" => &self.first_name,
      "lastName" => &self.last_name,
      "email" => &self.email,
      "emailStatus" => &self.email_status,
      "jobTitle" => &self.job_title,
      "companyName" => &self.company_name,
      "companyWebsite" => &self.company_website,
      "city" => &self.city,
      "state" => &self.state,
      "country" => &self.country,
      "industry" => &self.industry,
      "keywords" => &self.keywords,
      "companyCity" => &self.company_city,
      "companyState" => &self.company_state,
      "companyCountry" => &self.company_country,
      "companyLinkedinUrl" => &self.company_linkedin_url,
      "companyTwitterUrl" => &self.company_twitter_url,
      "companyFacebookUrl" => &self.company_facebook_url,
      "companyPhoneNumbers" => &self.company_phone_numbers,
      "twitterUrl" => &self.twitter_url,
      "facebookUrl" => &self.facebook_url,
      _ => return None,
    })
  }

  fn slot_mut(&mut self, key: &str) -> Option<&mut Option<String>> {
    Some(match key {
      APOLLO_ID => &mut self.apollo_id,
      FULL_NAME => &mut self.full_name,
      "linkedinUrl" => &mut self.linkedin_url,
      "firstName" => &mut self.first_name,
      "lastName" => &mut self.last_name,
      "email" => &mut self.email,
      "emailStatus" => &mut self.email_status,
      "jobTitle" => &mut self.job_title,
      "companyName" => &mut self.company_name,
      "companyWebsite" => &mut self.company_website,
      "city" => &mut self.city,
      "state" => &mut self.state,
      "country" => &mut self.country,
      "industry" => &mut self.industry,
      "keywords" => &mut self.keywords,
      "companyCity" => &mut self.company_city,
      "companyState" => &mut self.company_state,
      "companyCountry" => &mut self.company_country,
      "companyLinkedinUrl" => &mut self.company_linkedin_url,
      "companyTwitterUrl" => &mut self.company_twitter_url,
      "companyFacebookUrl" => &mut self.company_facebook_url,
      "companyPhoneNumbers" => &mut self.company_phone_numbers,
      "twitterUrl" => &mut self.twitter_url,
      "facebookUrl" => &mut self.facebook_url,
      _ => return None,
    })
  }

  /// Validate and substitute defaults for every omitted field.
  pub fn resolve(self) -> Result<NewLead> {
    let errors = validate::lead_input(&self);
    if !errors.is_empty() {
      return Err(Error::Validation(errors));
    }

    let mut profile = LeadProfile::default();
    for key in PROFILE_TEXT_FIELDS {
      if let (Some(value), Some(field)) =
        (self.text(key).and_then(present), profile.text_mut(key))
      {
        *field = value.to_owned();
      }
    }
    profile.employees = self.employees.unwrap_or(0);

    Ok(NewLead {
      apollo_id: self.apollo_id.as_deref().map(str::trim).unwrap_or_default().to_owned(),
      full_name: self.full_name.as_deref().map(str::trim).unwrap_or_default().to_owned(),
      profile,
      extra: self.extra.unwrap_or_default(),
    })
  }

  /// Produce the replacement for `lead`: every field present in `self`
  /// overwrites the stored value, absent fields are kept. A present but blank
  /// profile field resets to the sentinel. `id` and `created_at` never change.
  pub fn apply_to(&self, lead: &Lead) -> Result<Lead> {
    let mut next = lead.clone();

    if let Some(apollo_id) = &self.apollo_id {
      next.apollo_id = apollo_id.trim().to_owned();
    }
    if let Some(full_name) = &self.full_name {
      next.full_name = full_name.trim().to_owned();
    }
    for key in PROFILE_TEXT_FIELDS {
      if let (Some(value), Some(field)) = (self.text(key), next.profile.text_mut(key)) {
        *field = present(value).unwrap_or(NOT_AVAILABLE).to_owned();
      }
    }
    if let Some(employees) = self.employees {
      next.profile.employees = employees;
    }
    if let Some(extra) = &self.extra {
      next.extra = extra.clone();
    }

    let errors = validate::lead(&next);
    if !errors.is_empty() {
      return Err(Error::Validation(errors));
    }
    Ok(next)
  }
}

/// `Some(trimmed)` for non-blank text.
fn present(value: &str) -> Option<&str> {
  let trimmed = value.trim();
  (!trimmed.is_empty()).then_some(trimmed)
}
