//! hansard-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens an
//! in-process SQLite store, and serves the browse/sync API over HTTP.
//! `--sync <type>` runs one sync in the foreground and exits instead.
//!
//! # Password hash generation
//!
//! To generate the argon2 PHC string for `auth_password_hash` in config.toml:
//!
//! ```
//! cargo run -p hansard-server -- --hash-password
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use clap::Parser;
use hansard_api::{AppState, auth::AuthConfig};
use hansard_core::{store::BillStore as _, synclog::SyncType};
use hansard_store_sqlite::SqliteStore;
use hansard_sync::{Orchestrator, SyncService};
use hansard_upstream::{
  FetchClient, Gateway, ReqwestTransport, UpstreamConfig, limiter::RateLimiter,
};
use rand_core::OsRng;
use serde::Deserialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` layered
/// with `HANSARD_`-prefixed environment variables.
#[derive(Deserialize, Clone)]
struct ServerConfig {
  host:               String,
  port:               u16,
  db_path:            PathBuf,
  auth_username:      String,
  auth_password_hash: String,
  #[serde(default = "default_bills_base")]
  bills_api_base:     String,
  #[serde(default = "default_members_base")]
  members_api_base:   String,
  #[serde(default = "default_page_size")]
  page_size:          usize,
}

fn default_bills_base() -> String {
  UpstreamConfig::default().bills_base_url
}

fn default_members_base() -> String {
  UpstreamConfig::default().members_base_url
}

fn default_page_size() -> usize { UpstreamConfig::default().page_size }

// ─── CLI ─────────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(author, version, about = "Hansard bill-tracking server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,

  /// Run one sync in the foreground instead of serving, then exit.
  #[arg(long, value_name = "TYPE")]
  sync: Option<SyncType>,
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
    let password = password_from_stdin()?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
      .to_string();
    println!("{hash}");
    return Ok(());
  }

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("HANSARD"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Open SQLite store.
  let db_path = expand_tilde(&server_cfg.db_path);
  let store = SqliteStore::open(&db_path)
    .await
    .with_context(|| format!("failed to open store at {db_path:?}"))?;

  // Wire the upstream gateway through the shared rate limiter.
  let transport = ReqwestTransport::new()
    .map_err(|e| anyhow::anyhow!("failed to build HTTP client: {e}"))?;
  let client = FetchClient::new(transport, RateLimiter::default());
  let gateway = Gateway::new(client, UpstreamConfig {
    bills_base_url:   server_cfg.bills_api_base.clone(),
    members_base_url: server_cfg.members_api_base.clone(),
    page_size:        server_cfg.page_size,
  });

  let orchestrator = Orchestrator::new(gateway, store.clone());

  // One-shot mode: run a sync in the foreground and exit.
  if let Some(sync_type) = cli.sync {
    if store.running_sync().await?.is_some() {
      anyhow::bail!("a sync is already running");
    }
    let stats = orchestrator.run(sync_type).await?;
    tracing::info!(
      bills = stats.bills_processed,
      skipped = stats.bills_skipped,
      amendments = stats.amendments,
      members = stats.members_enriched,
      errors = stats.errors.len(),
      "one-shot sync finished"
    );
    return Ok(());
  }

  // Build application state and serve.
  let state = AppState {
    store: Arc::new(store),
    sync:  Arc::new(SyncService::new(orchestrator)),
    auth:  Arc::new(AuthConfig {
      username:      server_cfg.auth_username.clone(),
      password_hash: server_cfg.auth_password_hash.clone(),
    }),
  };

  let app = hansard_api::router(state).layer(TraceLayer::new_for_http());
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read a password from stdin.
fn password_from_stdin() -> anyhow::Result<String> {
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

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
