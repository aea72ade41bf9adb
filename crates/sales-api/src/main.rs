//! sales-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) and
//! `PLUGIN_SALES__*` environment overrides, opens the SQLite store, then
//! either serves the reporting API over HTTP or runs a single refresh.
//!
//! Remote credentials are never built in; supply them through
//! `[remote] login_name / password` or `PLUGIN_SALES__REMOTE__PASSWORD`.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use sales_api::{AppState, ServerConfig};
use sales_core::rate::FixedRate;
use sales_store_sqlite::SqliteStore;
use sales_sync::{RefreshJob, RefreshState, SalesClient};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Plugin sales reporting server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
  /// Serve the reporting API (default).
  Serve,
  /// Fetch new sales once and exit.
  Refresh,
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

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config.as_path()).required(false))
    .add_source(
      config::Environment::with_prefix("PLUGIN_SALES")
        .separator("__")
        .try_parsing(true),
    )
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  // Open SQLite store.
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let client = SalesClient::new(server_cfg.remote.clone())
    .context("failed to build remote sales client")?;

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => serve(&server_cfg, store, client).await,
    Command::Refresh => refresh_once(store, client).await,
  }
}

async fn serve(
  server_cfg: &ServerConfig,
  store: SqliteStore,
  client: SalesClient,
) -> anyhow::Result<()> {
  let state = AppState::new(store, FixedRate(server_cfg.exchange_rate), client);
  let app = sales_api::router(state).layer(TraceLayer::new_for_http());
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Run one refresh in the foreground, logging progress as it goes.
async fn refresh_once(
  store: SqliteStore,
  client: SalesClient,
) -> anyhow::Result<()> {
  let handle = RefreshJob::new(client, store).spawn();

  let mut states = handle.subscribe();
  tokio::spawn(async move {
    while states.changed().await.is_ok() {
      if let RefreshState::Running { processed, total, fraction } =
        *states.borrow_and_update()
        && total > 0
      {
        tracing::info!(processed, total, "{:.0}%", fraction * 100.0);
      }
    }
  });

  let outcome = handle.join().await.context("refresh failed")?;
  tracing::info!(
    remote_total = outcome.remote_total,
    inserted = outcome.inserted,
    updated = outcome.updated,
    "refresh finished"
  );
  Ok(())
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
