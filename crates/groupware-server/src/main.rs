//! groupware-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), seeds an
//! in-memory store, and serves the REST API over HTTP. Any setting can be
//! overridden with a `GROUPWARE_` environment variable, e.g.
//! `GROUPWARE_PORT=9000`.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use groupware_server::{ServerConfig, build_store, router};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Groupware API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Seed file to load instead of the one in the configuration.
  #[arg(long)]
  fixtures: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("GROUPWARE"))
    .build()
    .context("failed to read config file")?;

  let mut server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;
  if let Some(fixtures) = cli.fixtures {
    server_cfg.fixtures = Some(fixtures);
  }

  let store = build_store(&server_cfg).await.with_context(|| match &server_cfg.fixtures {
    Some(path) => format!("failed to load fixtures from {path:?}"),
    None => "failed to load demo data".to_string(),
  })?;

  let app = router(Arc::new(store));
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
