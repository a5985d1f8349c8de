//! campus-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), applies
//! `CAMPUS_*` environment overrides, opens the SQLite store and serves the
//! JSON API over HTTP.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use campus_server::ServerConfig;
use campus_store_sqlite::SqliteStore;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "College Connect API server")]
struct Cli {
  /// TOML configuration file; missing is fine, defaults apply.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  init_tracing();

  let cli = Cli::parse();
  let cfg = load_config(cli.config)?;

  let store = open_store(&cfg.store_path).await?;
  let app = campus_server::router(Arc::new(store), &cfg)
    .context("invalid server configuration")?;

  let address = format!("{}:{}", cfg.host, cfg.port);
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;
  tracing::info!(
    %address,
    identity_header = %cfg.identity_header,
    vote_retry_limit = cfg.vote_retry_limit,
    "serving"
  );

  axum::serve(listener, app).await.context("server error")
}

fn init_tracing() {
  let filter = EnvFilter::builder()
    .with_default_directive(LevelFilter::INFO.into())
    .from_env_lossy();
  tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(path: PathBuf) -> anyhow::Result<ServerConfig> {
  config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(config::Environment::with_prefix("CAMPUS"))
    .build()
    .context("failed to read configuration")?
    .try_deserialize()
    .context("failed to deserialise ServerConfig")
}

/// Open the store, creating its parent directory on first run.
async fn open_store(path: &Path) -> anyhow::Result<SqliteStore> {
  let path = expand_tilde(path);
  if let Some(dir) = path.parent()
    && !dir.as_os_str().is_empty()
  {
    std::fs::create_dir_all(dir)
      .with_context(|| format!("failed to create {}", dir.display()))?;
  }

  let store = SqliteStore::open(&path)
    .await
    .with_context(|| format!("failed to open store at {}", path.display()))?;
  tracing::info!(path = %path.display(), "store opened");
  Ok(store)
}

/// Expand a leading `~/` to `$HOME`.
fn expand_tilde(path: &Path) -> PathBuf {
  match path.strip_prefix("~") {
    Ok(rest) => match std::env::var_os("HOME") {
      Some(home) => PathBuf::from(home).join(rest),
      None => path.to_path_buf(),
    },
    Err(_) => path.to_path_buf(),
  }
}
