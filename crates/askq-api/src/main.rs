//! askq API server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens the
//! JSON document store, and serves the website API over HTTP.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use askq_api::{AppState, ServerConfig};
use askq_store_json::JsonStore;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "askq website API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
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
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("ASKQ"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Expand `~` in document paths.
  let questions_path = expand_tilde(&server_cfg.questions_path);
  let denylist_path = expand_tilde(&server_cfg.denylist_path);

  let store = JsonStore::open(questions_path, denylist_path);

  let state = AppState {
    store:  Arc::new(store),
    secret: Arc::new(server_cfg.api_secret.clone()),
  };

  let app = askq_api::api_router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~/` using `$HOME`.
fn expand_tilde(path: &Path) -> PathBuf {
  if let Ok(stripped) = path.strip_prefix("~") {
    if let Some(home) = std::env::var_os("HOME") {
      return PathBuf::from(home).join(stripped);
    }
  }
  path.to_path_buf()
}
