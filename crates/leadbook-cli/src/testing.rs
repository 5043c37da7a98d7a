//! A real API server on an ephemeral port, for client tests.

use std::sync::Arc;

use leadbook_api::{ApiSettings, AppState, TokenService, auth::hash_password};
use leadbook_core::{account::NewAccount, store::AccountStore};
use leadbook_store_sqlite::SqliteStore;
use tokio::net::TcpListener;

pub const EMAIL: &str = "ops@example.com";
pub const PASSWORD: &str = "hunter2";

/// Serve a fresh in-memory store with one account; returns the base URL.
pub async fn spawn_server() -> String {
  let store = SqliteStore::open_in_memory().await.unwrap();
  store
    .create_account(NewAccount {
      email:         EMAIL.into(),
      name:          "Ops".into(),
      password_hash: hash_password(PASSWORD).unwrap(),
    })
    .await
    .unwrap();

  let state = AppState {
    store:    Arc::new(store),
    tokens:   Arc::new(TokenService::new(b"test-secret", 3600).unwrap()),
    settings: ApiSettings::default(),
  };

  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let address = listener.local_addr().unwrap();
  tokio::spawn(async move {
    axum::serve(listener, leadbook_api::api_router(state)).await.unwrap();
  });
  format!("http://{address}")
}
