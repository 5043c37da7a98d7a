//! `leadbook`: terminal UI for the Leadbook lead store.
//!
//! # Usage
//!
//! ```text
//! leadbook --url http://localhost:5000 --email ops@example.com --password secret
//! leadbook --url http://localhost:5000,https://leads.example.com
//! leadbook --config ~/.config/leadbook/cli.toml --log-file /tmp/leadbook.log
//! ```

mod app;
mod client;
mod form;
mod staging;
#[cfg(test)]
mod testing;
mod ui;

use std::{io, path::PathBuf, sync::Mutex, time::Duration};

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use client::{ApiClient, ApiConfig};
use crossterm::{
  event::{self, Event},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

const DEFAULT_URL: &str = "http://localhost:5000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "leadbook", about = "Terminal UI for the Leadbook lead store")]
struct Args {
  /// Path to a TOML config file (urls, email, password, timeout_secs).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Server base URLs, comma-separated, tried in order when one is
  /// unreachable (default: http://localhost:5000).
  #[arg(long = "url", env = "LEADBOOK_URLS", value_delimiter = ',')]
  urls: Vec<String>,

  /// Account email.
  #[arg(long, env = "LEADBOOK_EMAIL")]
  email: Option<String>,

  /// Account password.
  #[arg(long, env = "LEADBOOK_PASSWORD", hide_env_values = true)]
  password: Option<String>,

  /// Write logs to this file. Nothing is logged otherwise.
  #[arg(long, value_name = "FILE")]
  log_file: Option<PathBuf>,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  urls:         Vec<String>,
  #[serde(default)]
  email:        String,
  #[serde(default)]
  password:     String,
  timeout_secs: Option<u64>,
}

impl ConfigFile {
  fn read(path: &std::path::Path) -> Result<Self> {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")
  }
}

/// CLI flags override the config file, which overrides defaults.
fn api_config(args: Args, file: ConfigFile) -> ApiConfig {
  let non_empty = |s: String| (!s.is_empty()).then_some(s);
  let urls = [args.urls, file.urls]
    .into_iter()
    .map(|urls| {
      urls
        .into_iter()
        .map(|u| u.trim().to_owned())
        .filter(|u| !u.is_empty())
        .collect::<Vec<_>>()
    })
    .find(|urls| !urls.is_empty())
    .unwrap_or_else(|| vec![DEFAULT_URL.to_owned()]);

  ApiConfig {
    urls,
    email: args.email.or_else(|| non_empty(file.email)).unwrap_or_default(),
    password: args.password.or_else(|| non_empty(file.password)).unwrap_or_default(),
    timeout: Duration::from_secs(file.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
  }
}

/// Log to `path` only; the terminal belongs to the UI.
fn init_tracing(path: &std::path::Path) -> Result<()> {
  let file = std::fs::OpenOptions::new()
    .create(true)
    .append(true)
    .open(path)
    .with_context(|| format!("opening log file {}", path.display()))?;
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_ansi(false)
    .with_writer(Mutex::new(file))
    .init();
  Ok(())
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let mut args = Args::parse();

  if let Some(path) = &args.log_file {
    init_tracing(path)?;
  }

  let file_cfg = match args.config.take() {
    Some(path) => ConfigFile::read(&path)?,
    None => ConfigFile::default(),
  };
  let config = api_config(args, file_cfg);
  anyhow::ensure!(!config.email.is_empty(), "no account email given (--email or LEADBOOK_EMAIL)");

  let client = ApiClient::new(config).context("creating API client")?;
  let mut app = App::new(client);

  // Set up the terminal.
  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  // Run the event loop; restore terminal even on error.
  let run_result = match app.connect().await {
    Ok(()) => run_event_loop(&mut terminal, &mut app).await,
    Err(e) => Err(e),
  };

  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  run_result
}

// ─── Event loop ───────────────────────────────────────────────────────────────

async fn run_event_loop(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App,
) -> Result<()> {
  loop {
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // Poll for an event, yielding control to tokio while waiting.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(50))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    if let Some(Event::Key(key)) = maybe_event
      && !app.handle_key(key).await?
    {
      break;
    }
  }

  Ok(())
}
