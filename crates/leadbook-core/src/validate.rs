//! Field validation shared by create, bulk import, and update.

use crate::{
  FieldError,
  lead::{APOLLO_ID, EMPLOYEES, FULL_NAME, Lead, LeadInput, NOT_AVAILABLE},
};

/// Validate caller input before defaults are applied.
pub fn lead_input(input: &LeadInput) -> Vec<FieldError> {
  check(
    input.apollo_id.as_deref(),
    input.full_name.as_deref(),
    input.email.as_deref(),
    input.employees,
  )
}

/// Validate a fully-shaped lead (after an update has been applied).
pub fn lead(lead: &Lead) -> Vec<FieldError> {
  check(
    Some(&lead.apollo_id),
    Some(&lead.full_name),
    Some(&lead.profile.email),
    Some(lead.profile.employees),
  )
}

fn check(
  apollo_id: Option<&str>,
  full_name: Option<&str>,
  email: Option<&str>,
  employees: Option<i64>,
) -> Vec<FieldError> {
  let mut errors = Vec::new();

  if is_blank(apollo_id) {
    errors.push(FieldError::new(APOLLO_ID, "Apollo ID is required"));
  }
  if is_blank(full_name) {
    errors.push(FieldError::new(FULL_NAME, "Full Name is required"));
  }
  if let Some(email) = email.map(str::trim)
    && !email.is_empty()
    && email != NOT_AVAILABLE
    && !is_email(email)
  {
    errors.push(FieldError::new("email", "Provide a valid email"));
  }
  if employees.is_some_and(|n| n < 0) {
    errors.push(FieldError::new(EMPLOYEES, "Employee count cannot be negative"));
  }

  errors
}

fn is_blank(value: Option<&str>) -> bool {
  value.is_none_or(|v| v.trim().is_empty())
}

/// Syntactic address check: one `@`, a non-empty local part, and a dotted
/// domain with no empty labels.
pub fn is_email(candidate: &str) -> bool {
  if candidate.chars().any(char::is_whitespace) {
    return false;
  }
  let Some((local, domain)) = candidate.split_once('@') else {
    return false;
  };
  !local.is_empty()
    && !domain.contains('@')
    && domain.contains('.')
    && domain.split('.').all(|label| !label.is_empty())
}
