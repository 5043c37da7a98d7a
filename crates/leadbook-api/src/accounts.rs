//! Handlers for `/api/auth` endpoints.

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
  http::StatusCode,
};
use leadbook_core::{
  FieldError,
  account::{Account, NewAccount},
  store::AccountStore,
  validate,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
  AppState,
  auth::{DUMMY_PASSWORD_HASH, hash_password, verify_password},
  error::ApiError,
};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Run an argon2 computation off the async workers.
async fn blocking<T: Send + 'static>(
  f: impl FnOnce() -> T + Send + 'static,
) -> Result<T, ApiError> {
  tokio::task::spawn_blocking(f)
    .await
    .map_err(|e| ApiError::Internal(Box::new(e)))
}

// ─── Register ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  #[serde(default)]
  pub name:     String,
  pub email:    String,
  pub password: String,
}

/// `POST /api/auth/register`, only when registration is enabled.
pub async fn register<S: AccountStore>(
  State(state): State<AppState<S>>,
  payload: Result<Json<RegisterBody>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
  if !state.settings.allow_registration {
    return Err(ApiError::Forbidden("Registration is disabled".into()));
  }
  let Json(body) = payload?;

  let email = body.email.trim().to_owned();
  let mut errors = Vec::new();
  if !validate::is_email(&email) {
    errors.push(FieldError::new("email", "Provide a valid email"));
  }
  if body.password.is_empty() {
    errors.push(FieldError::new("password", "Password is required"));
  }
  if !errors.is_empty() {
    return Err(ApiError::Validation { message: "Validation failed".into(), errors, index: None });
  }

  let exists = state
    .store
    .find_account_by_email(&email)
    .await
    .map_err(ApiError::store)?
    .is_some();
  if exists {
    return Err(ApiError::BadRequest("Account already exists".into()));
  }

  let password = body.password;
  let password_hash = blocking(move || hash_password(&password))
    .await?
    .map_err(|e| ApiError::Internal(e.to_string().into()))?;

  let account = state
    .store
    .create_account(NewAccount { email, name: body.name, password_hash })
    .await
    .map_err(|e| match ApiError::store(e) {
      ApiError::Conflict { .. } => ApiError::BadRequest("Account already exists".into()),
      other => other,
    })?;

  tracing::info!(account = %account.id, email = %account.email, "account registered");
  Ok((StatusCode::CREATED, Json(json!({ "message": "Account registered successfully" }))))
}

// ─── Login ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub email:    String,
  pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
  pub token:   String,
  pub account: Account,
}

/// `POST /api/auth/login`
pub async fn login<S: AccountStore>(
  State(state): State<AppState<S>>,
  payload: Result<Json<LoginBody>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
  let Json(body) = payload?;

  let found = state
    .store
    .find_account_by_email(&body.email)
    .await
    .map_err(ApiError::store)?;

  // Unknown emails still pay for one argon2 verification.
  let hash = match &found {
    Some(account) => account.password_hash.clone(),
    None => DUMMY_PASSWORD_HASH.clone(),
  };
  let password = body.password;
  let matched = blocking(move || verify_password(&hash, &password)).await?;

  let Some(account) = found.filter(|_| matched) else {
    tracing::warn!(email = %body.email, "login rejected");
    return Err(ApiError::BadRequest(INVALID_CREDENTIALS.into()));
  };

  let token = state.tokens.issue(&account)?;
  tracing::info!(account = %account.id, "login");
  Ok(Json(LoginResponse { token, account }))
}
