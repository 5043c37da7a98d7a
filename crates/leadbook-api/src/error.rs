//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every error body is JSON with at least a `message` key. Server-side
//! failures are logged in full and answered with a generic message.

use axum::{
  Json,
  extract::rejection::JsonRejection,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use leadbook_core::{FieldError, store::StoreError};
use serde_json::{Value, json};
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// Field-level rejection. `index` is the element position in a bulk batch.
  #[error("{message}")]
  Validation {
    message: String,
    errors:  Vec<FieldError>,
    index:   Option<usize>,
  },

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("unauthorized: {0}")]
  Unauthorized(String),

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("payload too large: {0}")]
  PayloadTooLarge(String),

  #[error("conflict: {message}")]
  Conflict { message: String, index: Option<usize> },

  #[error("internal error: {0}")]
  Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Classify a backend error: uniqueness conflicts become `409`, everything
  /// else is a server error.
  pub fn store<E: StoreError>(err: E) -> Self {
    match err.conflict().cloned() {
      Some(conflict) => ApiError::Conflict {
        message: format!("Duplicate {} {:?}", conflict.field, conflict.value),
        index:   conflict.index,
      },
      None => ApiError::Internal(Box::new(err)),
    }
  }

  pub fn invalid_id() -> Self { ApiError::BadRequest("Invalid ID format".into()) }

  pub fn lead_not_found() -> Self { ApiError::NotFound("Lead not found".into()) }
}

impl From<leadbook_core::Error> for ApiError {
  fn from(err: leadbook_core::Error) -> Self {
    let leadbook_core::Error::Validation(errors) = err;
    ApiError::Validation {
      message: "Validation failed".into(),
      errors,
      index: None,
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
      ApiError::PayloadTooLarge(rejection.body_text())
    } else {
      ApiError::BadRequest(rejection.body_text())
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, body): (StatusCode, Value) = match &self {
      ApiError::Validation { message, errors, index } => {
        let mut body = json!({ "message": message, "errors": errors });
        if let Some(index) = index {
          body["index"] = json!(index);
        }
        (StatusCode::BAD_REQUEST, body)
      }
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, json!({ "message": m })),
      ApiError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, json!({ "message": m })),
      ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, json!({ "message": m })),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, json!({ "message": m })),
      ApiError::PayloadTooLarge(m) => (StatusCode::PAYLOAD_TOO_LARGE, json!({ "message": m })),
      ApiError::Conflict { message, index } => {
        let mut body = json!({ "message": message });
        if let Some(index) = index {
          body["index"] = json!(index);
        }
        (StatusCode::CONFLICT, body)
      }
      ApiError::Internal(e) => {
        tracing::error!(error = %e, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, json!({ "message": "Server error" }))
      }
    };

    let mut res = (status, Json(body)).into_response();
    if status == StatusCode::UNAUTHORIZED {
      res
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    }
    res
  }
}
