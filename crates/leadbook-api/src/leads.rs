//! Handlers for `/api/leads` endpoints.
//!
//! | Method   | Path              | Notes |
//! |----------|-------------------|-------|
//! | `GET`    | `/api/leads`      | All leads, creation order |
//! | `POST`   | `/api/leads`      | Body: a lead; 201 with the stored lead |
//! | `POST`   | `/api/leads/bulk` | Body: `{"leads":[…]}`; all or nothing |
//! | `GET`    | `/api/leads/{id}` | 404 if not found |
//! | `PUT`    | `/api/leads/{id}` | Present fields overwrite stored ones |
//! | `DELETE` | `/api/leads/{id}` | 404 if not found |

use std::collections::HashMap;

use axum::{
  Extension, Json,
  extract::{Path, State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use leadbook_core::{
  FieldError,
  lead::{Lead, LeadInput, NewLead},
  store::LeadStore,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{AppState, auth::Claims, error::ApiError};

type Payload<T> = Result<Json<T>, JsonRejection>;

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
  Uuid::parse_str(raw).map_err(|_| ApiError::invalid_id())
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /api/leads`
pub async fn list<S: LeadStore>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<Lead>>, ApiError> {
  let leads = state.store.list_leads().await.map_err(ApiError::store)?;
  Ok(Json(leads))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /api/leads`
pub async fn create<S: LeadStore>(
  State(state): State<AppState<S>>,
  Extension(claims): Extension<Claims>,
  payload: Payload<LeadInput>,
) -> Result<impl IntoResponse, ApiError> {
  let Json(input) = payload?;
  let lead = state
    .store
    .insert_lead(input.resolve()?)
    .await
    .map_err(ApiError::store)?;

  tracing::info!(lead = %lead.id, apollo_id = %lead.apollo_id, by = %claims.email, "lead created");
  Ok((StatusCode::CREATED, Json(lead)))
}

// ─── Bulk ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct BulkBody {
  /// Elements stay untyped until each is checked, so a bad element can be
  /// reported by position.
  #[serde(default)]
  pub leads: Option<Vec<Value>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkResponse {
  pub message:        String,
  pub inserted_leads: Vec<Lead>,
}

/// `POST /api/leads/bulk`, body: `{"leads":[…]}`
pub async fn bulk<S: LeadStore>(
  State(state): State<AppState<S>>,
  Extension(claims): Extension<Claims>,
  payload: Payload<BulkBody>,
) -> Result<(StatusCode, Json<BulkResponse>), ApiError> {
  let Json(body) = payload?;
  let raw = body.leads.unwrap_or_default();

  if raw.is_empty() {
    return Err(ApiError::BadRequest("Leads must be a non-empty array".into()));
  }
  let limit = state.settings.max_bulk_leads;
  if raw.len() > limit {
    return Err(ApiError::BadRequest(format!(
      "A single import may hold at most {limit} leads, got {}",
      raw.len()
    )));
  }

  let batch = resolve_batch(raw)?;
  let inserted = state.store.insert_leads(batch).await.map_err(ApiError::store)?;

  tracing::info!(count = inserted.len(), by = %claims.email, "bulk import committed");
  Ok((
    StatusCode::CREATED,
    Json(BulkResponse {
      message:        format!("{} leads imported successfully", inserted.len()),
      inserted_leads: inserted,
    }),
  ))
}

/// Validate every element and reject duplicate `apolloId`s inside the batch
/// before anything is written.
fn resolve_batch(raw: Vec<Value>) -> Result<Vec<NewLead>, ApiError> {
  let mut seen: HashMap<String, usize> = HashMap::with_capacity(raw.len());
  let mut batch = Vec::with_capacity(raw.len());

  for (index, value) in raw.into_iter().enumerate() {
    let input: LeadInput = serde_json::from_value(value).map_err(|e| ApiError::Validation {
      message: format!("Lead at index {index} is malformed"),
      errors:  vec![FieldError::new("lead", e.to_string())],
      index:   Some(index),
    })?;

    let lead = input.resolve().map_err(|leadbook_core::Error::Validation(errors)| {
      ApiError::Validation {
        message: format!("Lead at index {index} is invalid"),
        errors,
        index: Some(index),
      }
    })?;

    if let Some(first) = seen.insert(lead.apollo_id.clone(), index) {
      return Err(ApiError::Conflict {
        message: format!(
          "Duplicate apolloId {:?} at indices {first} and {index}",
          lead.apollo_id
        ),
        index:   Some(index),
      });
    }
    batch.push(lead);
  }

  Ok(batch)
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /api/leads/{id}`
pub async fn get_one<S: LeadStore>(
  State(state): State<AppState<S>>,
  Path(raw_id): Path<String>,
) -> Result<Json<Lead>, ApiError> {
  let id = parse_id(&raw_id)?;
  let lead = state
    .store
    .get_lead(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(ApiError::lead_not_found)?;
  Ok(Json(lead))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /api/leads/{id}`
pub async fn update<S: LeadStore>(
  State(state): State<AppState<S>>,
  Extension(claims): Extension<Claims>,
  Path(raw_id): Path<String>,
  payload: Payload<LeadInput>,
) -> Result<Json<Lead>, ApiError> {
  let id = parse_id(&raw_id)?;
  let Json(input) = payload?;

  let current = state
    .store
    .get_lead(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(ApiError::lead_not_found)?;
  let next = input.apply_to(&current)?;

  let saved = state
    .store
    .replace_lead(next)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(ApiError::lead_not_found)?;

  tracing::info!(lead = %id, by = %claims.email, "lead updated");
  Ok(Json(saved))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /api/leads/{id}`
pub async fn delete<S: LeadStore>(
  State(state): State<AppState<S>>,
  Extension(claims): Extension<Claims>,
  Path(raw_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
  let id = parse_id(&raw_id)?;
  if !state.store.delete_lead(id).await.map_err(ApiError::store)? {
    return Err(ApiError::lead_not_found());
  }

  tracing::info!(lead = %id, by = %claims.email, "lead deleted");
  Ok(Json(json!({ "message": "Lead deleted successfully" })))
}
