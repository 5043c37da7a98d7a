//! JSON REST API for Leadbook.
//!
//! Exposes an axum [`Router`] backed by any
//! [`leadbook_core::store::AccountStore`]. Bearer-token authentication is
//! applied per route from the [`policy::POLICY`] table. TLS, CORS, and
//! request tracing are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = leadbook_api::api_router(state).layer(TraceLayer::new_for_http());
//! ```

pub mod accounts;
pub mod auth;
pub mod error;
pub mod leads;
pub mod policy;

use std::sync::Arc;

use axum::{
  Router, middleware,
  routing::{get, post},
};
use leadbook_core::store::AccountStore;

pub use auth::{Claims, TokenService};
pub use error::ApiError;

// ─── State ────────────────────────────────────────────────────────────────────

/// Behavioural switches for the API.
#[derive(Debug, Clone)]
pub struct ApiSettings {
  /// Whether `POST /api/auth/register` accepts new accounts.
  pub allow_registration: bool,
  /// Upper bound on the number of leads in one bulk import.
  pub max_bulk_leads:     usize,
}

impl Default for ApiSettings {
  fn default() -> Self { Self { allow_registration: false, max_bulk_leads: 5000 } }
}

/// Shared state threaded through all handlers.
pub struct AppState<S> {
  pub store:    Arc<S>,
  pub tokens:   Arc<TokenService>,
  pub settings: ApiSettings,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      tokens:   Arc::clone(&self.tokens),
      settings: self.settings.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router.
///
/// Unknown paths answer `404 {"message":"API route not found"}`.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: AccountStore + 'static,
{
  let guard = middleware::from_fn_with_state(Arc::clone(&state.tokens), policy::guard);

  Router::new()
    // Accounts
    .route("/api/auth/register", post(accounts::register::<S>))
    .route("/api/auth/login", post(accounts::login::<S>))
    // Leads
    .route("/api/leads", get(leads::list::<S>).post(leads::create::<S>))
    .route("/api/leads/bulk", post(leads::bulk::<S>))
    .route(
      "/api/leads/{id}",
      get(leads::get_one::<S>)
        .put(leads::update::<S>)
        .delete(leads::delete::<S>),
    )
    .route_layer(guard)
    .fallback(not_found)
    .with_state(state)
}

async fn not_found() -> ApiError { ApiError::NotFound("API route not found".into()) }

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode, header},
  };
  use leadbook_core::{account::NewAccount, store::LeadStore};
  use leadbook_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  use super::*;

  async fn make_state(allow_registration: bool) -> AppState<SqliteStore> {
    AppState {
      store:    Arc::new(SqliteStore::open_in_memory().await.unwrap()),
      tokens:   Arc::new(TokenService::new(b"test-secret", 3600).unwrap()),
      settings: ApiSettings { allow_registration, max_bulk_leads: 3 },
    }
  }

  /// Create an account directly in the store and return a token for it.
  async fn token_for(state: &AppState<SqliteStore>) -> String {
    let account = state
      .store
      .create_account(NewAccount {
        email:         "ops@example.com".into(),
        name:          "Ops".into(),
        password_hash: auth::hash_password("secret-pass").unwrap(),
      })
      .await
      .unwrap();
    state.tokens.issue(&account).unwrap()
  }

  async fn send(
    state:  &AppState<SqliteStore>,
    method: &str,
    uri:    &str,
    token:  Option<&str>,
    body:   Option<Value>,
  ) -> (StatusCode, HeaderMap, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
      builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
      Some(json) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(json.to_string())
      }
      None => Body::empty(),
    };

    let resp = api_router(state.clone())
      .oneshot(builder.body(body).unwrap())
      .await
      .unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, headers, json)
  }

  fn lead(apollo_id: &str, full_name: &str) -> Value {
    json!({ "apolloId": apollo_id, "fullName": full_name })
  }

  // ── Routing & guard ────────────────────────────────────────────────────────

  #[tokio::test]
  async fn unknown_route_is_json_404() {
    let state = make_state(false).await;
    let (status, _, body) = send(&state, "GET", "/api/nothing-here", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "API route not found");
  }

  #[tokio::test]
  async fn lead_routes_require_a_token() {
    let state = make_state(false).await;
    for (method, uri) in [
      ("GET", "/api/leads"),
      ("POST", "/api/leads"),
      ("POST", "/api/leads/bulk"),
      ("DELETE", "/api/leads/2c9a5b53-7d5e-4a59-9a59-5b0e1f1e8f7a"),
    ] {
      let (status, headers, body) = send(&state, method, uri, None, Some(lead("a", "b"))).await;
      assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
      assert_eq!(headers[header::WWW_AUTHENTICATE], "Bearer");
      assert_eq!(body["message"], "Access denied");
    }
    assert!(state.store.list_leads().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn forged_token_is_rejected() {
    let state = make_state(false).await;
    let (status, _, body) = send(&state, "GET", "/api/leads", Some("a.b.c"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid token");
  }

  // ── Accounts ───────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn registration_disabled_by_default() {
    let state = make_state(false).await;
    let body = json!({ "name": "Ops", "email": "ops@example.com", "password": "pw" });
    let (status, _, _) = send(&state, "POST", "/api/auth/register", None, Some(body)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
  }

  #[tokio::test]
  async fn register_login_and_use_token() {
    let state = make_state(true).await;
    let creds = json!({ "name": "Ops", "email": "ops@example.com", "password": "secret-pass" });

    let (status, _, _) =
      send(&state, "POST", "/api/auth/register", None, Some(creds.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _, body) = send(&state, "POST", "/api/auth/register", None, Some(creds)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Account already exists");

    let wrong = json!({ "email": "ops@example.com", "password": "nope" });
    let (status, _, wrong_body) =
      send(&state, "POST", "/api/auth/login", None, Some(wrong)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(wrong_body["message"], "Invalid credentials");

    // Unknown email and wrong password are indistinguishable.
    let unknown = json!({ "email": "who@example.com", "password": "secret-pass" });
    let (status, _, unknown_body) =
      send(&state, "POST", "/api/auth/login", None, Some(unknown)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(unknown_body, wrong_body);

    let right = json!({ "email": "OPS@example.com", "password": "secret-pass" });
    let (status, _, body) = send(&state, "POST", "/api/auth/login", None, Some(right)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["account"]["email"], "ops@example.com");
    assert!(body["account"].get("passwordHash").is_none());

    let token = body["token"].as_str().unwrap().to_owned();
    let (status, _, body) = send(&state, "GET", "/api/leads", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
  }

  #[tokio::test]
  async fn register_rejects_bad_email() {
    let state = make_state(true).await;
    let body = json!({ "email": "not-an-email", "password": "pw" });
    let (status, _, body) = send(&state, "POST", "/api/auth/register", None, Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "email");
  }

  // ── Single leads ───────────────────────────────────────────────────────────

  #[tokio::test]
  async fn create_applies_defaults() {
    let state = make_state(false).await;
    let token = token_for(&state).await;

    let (status, _, body) =
      send(&state, "POST", "/api/leads", Some(&token), Some(lead("ap-1", "Ada"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["apolloId"], "ap-1");
    assert_eq!(body["jobTitle"], "N/A");
    assert_eq!(body["employees"], 0);
    assert!(body["id"].is_string());
  }

  #[tokio::test]
  async fn create_reports_field_errors() {
    let state = make_state(false).await;
    let token = token_for(&state).await;

    let body = json!({ "apolloId": "ap-1", "email": "broken" });
    let (status, _, body) = send(&state, "POST", "/api/leads", Some(&token), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<_> = body["errors"]
      .as_array()
      .unwrap()
      .iter()
      .map(|e| e["field"].as_str().unwrap())
      .collect();
    assert_eq!(fields, ["fullName", "email"]);
  }

  #[tokio::test]
  async fn create_rejects_malformed_json() {
    let state = make_state(false).await;
    let token = token_for(&state).await;

    let resp = api_router(state.clone())
      .oneshot(
        Request::builder()
          .method("POST")
          .uri("/api/leads")
          .header(header::AUTHORIZATION, format!("Bearer {token}"))
          .header(header::CONTENT_TYPE, "application/json")
          .body(Body::from("{ not json"))
          .unwrap(),
      )
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn duplicate_apollo_id_is_409() {
    let state = make_state(false).await;
    let token = token_for(&state).await;

    send(&state, "POST", "/api/leads", Some(&token), Some(lead("ap-1", "Ada"))).await;
    let (status, _, body) =
      send(&state, "POST", "/api/leads", Some(&token), Some(lead("ap-1", "Other"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["message"].as_str().unwrap().contains("ap-1"));
  }

  #[tokio::test]
  async fn get_update_and_delete() {
    let state = make_state(false).await;
    let token = token_for(&state).await;

    let (_, _, created) =
      send(&state, "POST", "/api/leads", Some(&token), Some(lead("ap-1", "Ada"))).await;
    let uri = format!("/api/leads/{}", created["id"].as_str().unwrap());

    let (status, _, fetched) = send(&state, "GET", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["fullName"], "Ada");

    // Echo the record back with one field changed, the way the form does.
    let mut edited = fetched.clone();
    edited["jobTitle"] = json!("Countess");
    let (status, _, updated) = send(&state, "PUT", &uri, Some(&token), Some(edited)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["jobTitle"], "Countess");
    assert_eq!(updated["createdAt"], created["createdAt"]);
    assert_eq!(updated["id"], created["id"]);

    let (status, _, body) = send(&state, "DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Lead deleted successfully");

    let (status, _, body) = send(&state, "DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Lead not found");
  }

  #[tokio::test]
  async fn update_missing_lead_is_404_and_store_unchanged() {
    let state = make_state(false).await;
    let token = token_for(&state).await;
    send(&state, "POST", "/api/leads", Some(&token), Some(lead("ap-1", "Ada"))).await;

    let uri = format!("/api/leads/{}", uuid::Uuid::new_v4());
    let (status, _, _) = send(&state, "PUT", &uri, Some(&token), Some(lead("ap-9", "X"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let leads = state.store.list_leads().await.unwrap();
    assert_eq!(leads.len(), 1);
    assert_eq!(leads[0].apollo_id, "ap-1");
  }

  #[tokio::test]
  async fn malformed_id_is_400() {
    let state = make_state(false).await;
    let token = token_for(&state).await;

    for method in ["GET", "PUT", "DELETE"] {
      let (status, _, body) =
        send(&state, method, "/api/leads/12345", Some(&token), Some(json!({}))).await;
      assert_eq!(status, StatusCode::BAD_REQUEST, "{method}");
      assert_eq!(body["message"], "Invalid ID format");
    }
  }

  // ── Bulk ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn bulk_inserts_every_lead() {
    let state = make_state(false).await;
    let token = token_for(&state).await;

    let body = json!({ "leads": [lead("ap-1", "Ada"), lead("ap-2", "Grace")] });
    let (status, _, body) = send(&state, "POST", "/api/leads/bulk", Some(&token), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);

    let inserted = body["insertedLeads"].as_array().unwrap();
    assert_eq!(inserted.len(), 2);
    assert_ne!(inserted[0]["id"], inserted[1]["id"]);
    assert_eq!(state.store.list_leads().await.unwrap().len(), 2);
  }

  #[tokio::test]
  async fn bulk_empty_or_missing_array_is_400() {
    let state = make_state(false).await;
    let token = token_for(&state).await;

    for body in [json!({ "leads": [] }), json!({})] {
      let (status, _, _) = send(&state, "POST", "/api/leads/bulk", Some(&token), Some(body)).await;
      assert_eq!(status, StatusCode::BAD_REQUEST);
    }
  }

  #[tokio::test]
  async fn bulk_with_invalid_element_persists_nothing() {
    let state = make_state(false).await;
    let token = token_for(&state).await;

    let body = json!({ "leads": [lead("ap-1", "Ada"), { "apolloId": "ap-2" }] });
    let (status, _, body) = send(&state, "POST", "/api/leads/bulk", Some(&token), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["index"], 1);
    assert_eq!(body["errors"][0]["field"], "fullName");
    assert!(state.store.list_leads().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn bulk_conflicting_with_stored_lead_persists_nothing() {
    let state = make_state(false).await;
    let token = token_for(&state).await;
    send(&state, "POST", "/api/leads", Some(&token), Some(lead("ap-2", "Grace"))).await;

    let body = json!({ "leads": [lead("ap-1", "Ada"), lead("ap-2", "Grace Hopper")] });
    let (status, _, body) = send(&state, "POST", "/api/leads/bulk", Some(&token), Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["index"], 1);
    assert_eq!(state.store.list_leads().await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn bulk_over_limit_is_400() {
    let state = make_state(false).await;
    let token = token_for(&state).await;

    let leads: Vec<_> = (0..4).map(|i| lead(&format!("ap-{i}"), "X")).collect();
    let (status, _, _) =
      send(&state, "POST", "/api/leads/bulk", Some(&token), Some(json!({ "leads": leads }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(state.store.list_leads().await.unwrap().is_empty());
  }
}
