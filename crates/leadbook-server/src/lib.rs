//! HTTP server assembly for Leadbook.
//!
//! Loads [`ServerConfig`] and wraps the API router with the transport
//! layers: request tracing, CORS for browser clients, and the body size
//! limit.

use std::path::{Path, PathBuf};

use axum::{Router, extract::DefaultBodyLimit};
use config::{Config, ConfigBuilder, ConfigError, Environment, File, builder::DefaultState};
use leadbook_api::{ApiSettings, AppState, TokenService, auth::TtlOutOfRange};
use leadbook_core::store::AccountStore;
use serde::Deserialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `leadbook.toml` and
/// `LEADBOOK_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:               String,
  #[serde(default = "default_port")]
  pub port:               u16,
  #[serde(default = "default_store_path")]
  pub store_path:         PathBuf,
  /// HMAC secret for bearer tokens. Required.
  pub jwt_secret:         String,
  #[serde(default = "default_token_ttl_secs")]
  pub token_ttl_secs:     u64,
  #[serde(default)]
  pub allow_registration: bool,
  #[serde(default = "default_max_bulk_leads")]
  pub max_bulk_leads:     usize,
  #[serde(default = "default_max_body_bytes")]
  pub max_body_bytes:     usize,
}

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 5000 }
fn default_store_path() -> PathBuf { PathBuf::from("leadbook.db") }
fn default_token_ttl_secs() -> u64 { 3600 }
fn default_max_bulk_leads() -> usize { ApiSettings::default().max_bulk_leads }
fn default_max_body_bytes() -> usize { 8 * 1024 * 1024 }

impl ServerConfig {
  /// Read `path` (optional) and overlay `LEADBOOK_*` environment variables.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    Self::from_builder(Config::builder().add_source(File::from(path).required(false)))
  }

  fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
    builder
      .add_source(Environment::with_prefix("LEADBOOK"))
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  /// Token signer for `jwt_secret` and `token_ttl_secs`.
  pub fn token_service(&self) -> Result<TokenService, TtlOutOfRange> {
    TokenService::new(self.jwt_secret.as_bytes(), self.token_ttl_secs)
  }

  pub fn api_settings(&self) -> ApiSettings {
    ApiSettings {
      allow_registration: self.allow_registration,
      max_bulk_leads:     self.max_bulk_leads,
    }
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Application ──────────────────────────────────────────────────────────────

/// The complete HTTP application.
pub fn app<S>(state: AppState<S>, config: &ServerConfig) -> Router
where
  S: AccountStore + 'static,
{
  leadbook_api::api_router(state)
    .layer(DefaultBodyLimit::max(config.max_body_bytes))
    .layer(CorsLayer::permissive())
    .layer(TraceLayer::new_for_http())
}

// ─── Tests ────────────────────────────────────────────────────────────────────
