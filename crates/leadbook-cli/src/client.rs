//! Async HTTP client for the Leadbook JSON API.
//!
//! The client knows an ordered list of candidate base URLs. A request that
//! cannot reach the active server is retried against the next candidate, and
//! the first server that answers becomes the active one. Any HTTP response,
//! success or not, ends the attempt.
//!
//! Reads fall back on connect failures and timeouts. Writes fall back on
//! connect failures only: a timed-out write may already have been applied.

use std::{
  sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
  },
  time::Duration,
};

use leadbook_core::{
  FieldError,
  account::Account,
  lead::{Lead, LeadInput},
};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use uuid::Uuid;

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ClientError {
  /// No candidate server could be reached.
  #[error("could not reach any server ({tried}): {source}")]
  Unreachable {
    tried:  String,
    #[source]
    source: reqwest::Error,
  },

  /// The server answered with an error status.
  #[error("{message} ({status})")]
  Status {
    status:  StatusCode,
    message: String,
    errors:  Vec<FieldError>,
  },

  #[error("request failed: {0}")]
  Request(#[source] reqwest::Error),

  #[error("unexpected response: {0}")]
  Decode(#[source] reqwest::Error),

  #[error("no server URLs configured")]
  NoServers,
}

impl ClientError {
  /// Transport failures may succeed on a later attempt; a status answer will
  /// not change without a different request.
  pub fn is_retryable(&self) -> bool { matches!(self, ClientError::Unreachable { .. }) }

  /// The error as a single status-bar line, field errors included.
  pub fn summary(&self) -> String {
    match self {
      ClientError::Status { message, errors, .. } if !errors.is_empty() => {
        let fields = errors
          .iter()
          .map(|e| format!("{}: {}", e.field, e.message))
          .collect::<Vec<_>>()
          .join("; ");
        format!("{message}: {fields}")
      }
      ClientError::Status { message, .. } => message.clone(),
      other => other.to_string(),
    }
  }
}

pub type Result<T, E = ClientError> = std::result::Result<T, E>;

/// JSON error body returned by the API.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
  #[serde(default)]
  message: String,
  #[serde(default)]
  errors:  Vec<FieldError>,
}

// ─── Wire shapes ─────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct LoginBody<'a> {
  email:    &'a str,
  password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
  token:   String,
  account: Account,
}

#[derive(Serialize)]
struct BulkBody<'a> {
  leads: &'a [LeadInput],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkResponse {
  pub message:        String,
  pub inserted_leads: Vec<Lead>,
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// Connection settings for the Leadbook API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  /// Candidate base URLs, tried in order.
  pub urls:     Vec<String>,
  pub email:    String,
  pub password: String,
  pub timeout:  Duration,
}

pub struct ApiClient {
  client: Client,
  config: ApiConfig,
  active: AtomicUsize,
  token:  Mutex<Option<String>>,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    if config.urls.is_empty() {
      return Err(ClientError::NoServers);
    }
    let client = Client::builder()
      .timeout(config.timeout)
      .build()
      .map_err(ClientError::Request)?;
    Ok(Self { client, config, active: AtomicUsize::new(0), token: Mutex::new(None) })
  }

  /// Base URL of the server that last answered.
  pub fn active_url(&self) -> &str {
    let i = self.active.load(Ordering::Relaxed);
    self.config.urls[i].trim_end_matches('/')
  }

  fn bearer(&self) -> Option<String> {
    self.token.lock().ok().and_then(|t| t.clone())
  }

  fn set_bearer(&self, token: String) {
    if let Ok(mut slot) = self.token.lock() {
      *slot = Some(token);
    }
  }

  /// Send a request, walking the candidate list on transport failure only.
  async fn execute<F>(&self, build: &F) -> Result<Response>
  where
    F: Fn(&Client, &str) -> RequestBuilder,
  {
    let n = self.config.urls.len();
    let start = self.active.load(Ordering::Relaxed);
    let mut last = None;

    for offset in 0..n {
      let i = (start + offset) % n;
      let base = self.config.urls[i].trim_end_matches('/');
      let mut req = build(&self.client, base);
      if let Some(token) = self.bearer() {
        req = req.bearer_auth(token);
      }
      let request = req.build().map_err(ClientError::Request)?;
      let safe = request.method().is_safe();
      match self.client.execute(request).await {
        Ok(resp) => {
          if i != start {
            tracing::info!(url = base, "switched server");
            self.active.store(i, Ordering::Relaxed);
          }
          return Ok(resp);
        }
        Err(e) if e.is_connect() || (safe && e.is_timeout()) => {
          tracing::warn!(url = base, error = %e, "server unreachable");
          last = Some(e);
        }
        Err(e) => return Err(ClientError::Request(e)),
      }
    }

    match last {
      Some(source) => Err(ClientError::Unreachable { tried: self.config.urls.join(", "), source }),
      None => Err(ClientError::NoServers),
    }
  }

  /// Send a request and decode a JSON success body.
  async fn call<T, F>(&self, build: &F) -> Result<T>
  where
    T: DeserializeOwned,
    F: Fn(&Client, &str) -> RequestBuilder,
  {
    let resp = check(self.execute(build).await?).await?;
    resp.json().await.map_err(ClientError::Decode)
  }

  /// Like [`Self::call`], logging in again once if the token was rejected.
  async fn authed<T, F>(&self, build: F) -> Result<T>
  where
    T: DeserializeOwned,
    F: Fn(&Client, &str) -> RequestBuilder,
  {
    match self.call(&build).await {
      Err(ClientError::Status { status: StatusCode::UNAUTHORIZED, .. }) => {
        tracing::info!("token rejected, logging in again");
        self.login().await?;
        self.call(&build).await
      }
      other => other,
    }
  }

  // ── Auth ──────────────────────────────────────────────────────────────────

  /// `POST /api/auth/login`. Stores the bearer token for later calls.
  pub async fn login(&self) -> Result<Account> {
    let body = LoginBody { email: &self.config.email, password: &self.config.password };
    let resp: LoginResponse = self
      .call(&|c: &Client, base: &str| c.post(format!("{base}/api/auth/login")).json(&body))
      .await?;
    self.set_bearer(resp.token);
    tracing::info!(email = %resp.account.email, url = self.active_url(), "logged in");
    Ok(resp.account)
  }

  // ── Leads ─────────────────────────────────────────────────────────────────

  /// `GET /api/leads`
  pub async fn list_leads(&self) -> Result<Vec<Lead>> {
    self
      .authed(|c: &Client, base: &str| c.get(format!("{base}/api/leads")))
      .await
  }

  /// `POST /api/leads`
  pub async fn create_lead(&self, input: &LeadInput) -> Result<Lead> {
    self
      .authed(|c: &Client, base: &str| c.post(format!("{base}/api/leads")).json(input))
      .await
  }

  /// `PUT /api/leads/{id}`
  pub async fn update_lead(&self, id: Uuid, input: &LeadInput) -> Result<Lead> {
    self
      .authed(|c: &Client, base: &str| c.put(format!("{base}/api/leads/{id}")).json(input))
      .await
  }

  /// `DELETE /api/leads/{id}`
  pub async fn delete_lead(&self, id: Uuid) -> Result<()> {
    let _: serde_json::Value = self
      .authed(|c: &Client, base: &str| c.delete(format!("{base}/api/leads/{id}")))
      .await?;
    Ok(())
  }

  /// `POST /api/leads/bulk`
  pub async fn bulk_import(&self, leads: &[LeadInput]) -> Result<BulkResponse> {
    let body = BulkBody { leads };
    self
      .authed(|c: &Client, base: &str| c.post(format!("{base}/api/leads/bulk")).json(&body))
      .await
  }
}

/// Turn a non-success response into [`ClientError::Status`].
async fn check(resp: Response) -> Result<Response> {
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }
  let body: ErrorBody = resp.json().await.unwrap_or_default();
  let message = if body.message.is_empty() {
    status.canonical_reason().unwrap_or("request failed").to_owned()
  } else {
    body.message
  };
  Err(ClientError::Status { status, message, errors: body.errors })
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use tokio::net::TcpListener;

  use super::*;
  use crate::testing::{EMAIL, PASSWORD, spawn_server};

  fn config(urls: Vec<String>) -> ApiConfig {
    ApiConfig {
      urls,
      email: EMAIL.into(),
      password: PASSWORD.into(),
      timeout: Duration::from_secs(5),
    }
  }

  fn input(apollo_id: &str, full_name: &str) -> LeadInput {
    let mut input = LeadInput::default();
    input.set_text(leadbook_core::lead::APOLLO_ID, apollo_id);
    input.set_text(leadbook_core::lead::FULL_NAME, full_name);
    input
  }

  #[test]
  fn empty_url_list_is_rejected() {
    assert!(matches!(ApiClient::new(config(Vec::new())), Err(ClientError::NoServers)));
  }

  #[tokio::test(flavor = "multi_thread")]
  async fn falls_back_past_an_unreachable_server() {
    let base = spawn_server().await;
    let client = ApiClient::new(config(vec!["http://127.0.0.1:1".into(), base.clone()])).unwrap();

    let account = client.login().await.unwrap();
    assert_eq!(account.email, EMAIL);
    assert_eq!(client.active_url(), base);

    // Stays on the server that answered.
    assert!(client.list_leads().await.unwrap().is_empty());
    assert_eq!(client.active_url(), base);
  }

  #[tokio::test(flavor = "multi_thread")]
  async fn all_servers_down_is_retryable() {
    let client = ApiClient::new(config(vec!["http://127.0.0.1:1".into()])).unwrap();
    let err = client.login().await.unwrap_err();
    assert!(err.is_retryable(), "{err}");
  }

  /// A server that accepts connections and never answers.
  async fn silent_server() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    (listener, url)
  }

  #[tokio::test(flavor = "multi_thread")]
  async fn reads_fall_back_past_a_silent_server() {
    let (_silent, silent_url) = silent_server().await;
    let base = spawn_server().await;
    let mut cfg = config(vec![silent_url, base.clone()]);
    cfg.timeout = Duration::from_millis(500);
    let client = ApiClient::new(cfg).unwrap();

    assert!(client.list_leads().await.unwrap().is_empty());
    assert_eq!(client.active_url(), base);
  }

  #[tokio::test(flavor = "multi_thread")]
  async fn timed_out_writes_are_not_resent() {
    let (_silent, silent_url) = silent_server().await;
    let base = spawn_server().await;
    let mut cfg = config(vec![silent_url.clone(), base.clone()]);
    cfg.timeout = Duration::from_millis(500);
    let client = ApiClient::new(cfg).unwrap();

    let err = client.create_lead(&input("ap-1", "Ada")).await.unwrap_err();
    assert!(matches!(err, ClientError::Request(_)), "{err}");
    assert!(!err.is_retryable());
    assert_eq!(client.active_url(), silent_url);

    // The second server never saw the write.
    let direct = ApiClient::new(config(vec![base])).unwrap();
    assert!(direct.list_leads().await.unwrap().is_empty());
  }

  #[tokio::test(flavor = "multi_thread")]
  async fn status_errors_do_not_fall_back() {
    let base = spawn_server().await;
    let mut cfg = config(vec![base.clone(), "http://127.0.0.1:1".into()]);
    cfg.password = "wrong".into();
    let client = ApiClient::new(cfg).unwrap();

    let err = client.login().await.unwrap_err();
    assert!(!err.is_retryable());
    assert!(matches!(err, ClientError::Status { status: StatusCode::BAD_REQUEST, .. }));
    assert_eq!(client.active_url(), base);
  }

  #[tokio::test(flavor = "multi_thread")]
  async fn lead_round_trip() {
    let base = spawn_server().await;
    let client = ApiClient::new(config(vec![base])).unwrap();
    client.login().await.unwrap();

    let created = client.create_lead(&input("ap-1", "Ada Lovelace")).await.unwrap();
    assert_eq!(created.profile.email, "N/A");

    let mut change = LeadInput::default();
    change.set_text("jobTitle", "Analyst");
    let updated = client.update_lead(created.id, &change).await.unwrap();
    assert_eq!(updated.profile.job_title, "Analyst");
    assert_eq!(updated.full_name, "Ada Lovelace");

    client.delete_lead(created.id).await.unwrap();
    assert!(client.list_leads().await.unwrap().is_empty());

    let err = client.delete_lead(created.id).await.unwrap_err();
    assert!(matches!(err, ClientError::Status { status: StatusCode::NOT_FOUND, .. }));
  }

  #[tokio::test(flavor = "multi_thread")]
  async fn validation_errors_carry_fields() {
    let base = spawn_server().await;
    let client = ApiClient::new(config(vec![base])).unwrap();
    client.login().await.unwrap();

    let err = client.create_lead(&input("", "Nobody")).await.unwrap_err();
    let ClientError::Status { status, errors, .. } = &err else { panic!("{err}") };
    assert_eq!(*status, StatusCode::BAD_REQUEST);
    assert!(errors.iter().any(|e| e.field == "apolloId"));
    assert!(err.summary().contains("apolloId"));
  }

  #[tokio::test(flavor = "multi_thread")]
  async fn bulk_import_inserts_in_order() {
    let base = spawn_server().await;
    let client = ApiClient::new(config(vec![base])).unwrap();
    client.login().await.unwrap();

    let batch = [input("ap-1", "One"), input("ap-2", "Two")];
    let resp = client.bulk_import(&batch).await.unwrap();
    assert_eq!(resp.inserted_leads.len(), 2);
    assert_eq!(resp.inserted_leads[0].apollo_id, "ap-1");
    assert_eq!(client.list_leads().await.unwrap().len(), 2);
  }

  #[tokio::test(flavor = "multi_thread")]
  async fn calls_without_login_log_in_on_401() {
    let base = spawn_server().await;
    let client = ApiClient::new(config(vec![base])).unwrap();
    assert!(client.list_leads().await.unwrap().is_empty());
  }
}
