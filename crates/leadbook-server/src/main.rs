//! leadbook-server binary.
//!
//! Reads `leadbook.toml` (or the path specified with `--config`) overlaid
//! with `LEADBOOK_*` environment variables, opens the SQLite store, and
//! serves the REST API over HTTP.
//!
//! # Operator helpers
//!
//! ```text
//! leadbook-server --hash-password               # print an argon2 hash
//! leadbook-server --add-account ops@example.com # create an account
//! ```

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use leadbook_api::{AppState, auth::hash_password};
use leadbook_core::{account::NewAccount, store::AccountStore};
use leadbook_server::{ServerConfig, expand_tilde};
use leadbook_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Leadbook lead store server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "leadbook.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,

  /// Create an account with this email (password read from stdin) and exit.
  #[arg(long, value_name = "EMAIL")]
  add_account: Option<String>,

  /// Display name for `--add-account`.
  #[arg(long, default_value = "", requires = "add_account")]
  name: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Helper mode: hash a password and exit.
  if cli.hash_password {
    let password = read_password()?;
    let hash = hash_password(&password).map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?;
    println!("{hash}");
    return Ok(());
  }

  let server_cfg = ServerConfig::load(&cli.config)
    .with_context(|| format!("failed to load configuration from {:?}", cli.config))?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  // Helper mode: create an account and exit.
  if let Some(email) = cli.add_account {
    let password = read_password()?;
    anyhow::ensure!(!password.is_empty(), "password must not be empty");
    let password_hash =
      hash_password(&password).map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?;
    let account = store
      .create_account(NewAccount { email, name: cli.name, password_hash })
      .await
      .context("failed to create account")?;
    println!("created account {} ({})", account.email, account.id);
    return Ok(());
  }

  anyhow::ensure!(
    !server_cfg.jwt_secret.trim().is_empty(),
    "jwt_secret must not be empty"
  );

  let tokens = server_cfg
    .token_service()
    .context("invalid token_ttl_secs")?;

  let state = AppState {
    store:    Arc::new(store),
    tokens:   Arc::new(tokens),
    settings: server_cfg.api_settings(),
  };

  let app = leadbook_server::app(state, &server_cfg);
  let address = server_cfg.address();

  tracing::info!(
    store = %store_path.display(),
    registration = server_cfg.allow_registration,
    "Listening on http://{address}"
  );
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(error = %e, "failed to listen for ctrl-c");
    std::future::pending::<()>().await;
  }
  tracing::info!("shutting down");
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  let stdin = io::stdin();
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  stdin.lock().read_line(&mut line)?;
  Ok(
    line
      .trim_end_matches('\n')
      .trim_end_matches('\r')
      .to_string(),
  )
}
