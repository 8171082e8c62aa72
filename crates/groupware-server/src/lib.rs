//! Serves the groupware REST API over an in-memory store.
//!
//! The store is seeded from a JSON fixtures file, or from the bundled demo
//! data set when none is configured. Everything lives under `/api`.

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::Router;
use groupware_store_memory::{Latency, MemoryStore, Seed};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `GROUPWARE_*` environment variables.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
  pub host:             String,
  pub port:             u16,
  /// Seed file in the fixtures format; the demo data set when unset.
  pub fixtures:         Option<PathBuf>,
  pub read_latency_ms:  u64,
  pub write_latency_ms: u64,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:             "127.0.0.1".to_string(),
      port:             8080,
      fixtures:         None,
      read_latency_ms:  0,
      write_latency_ms: 0,
    }
  }
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn latency(&self) -> Latency {
    Latency {
      read:  Duration::from_millis(self.read_latency_ms),
      write: Duration::from_millis(self.write_latency_ms),
    }
  }
}

// ─── Store ────────────────────────────────────────────────────────────────────

/// Seed a [`MemoryStore`] as `config` describes.
pub async fn build_store(config: &ServerConfig) -> groupware_store_memory::Result<MemoryStore> {
  let seed = match &config.fixtures {
    Some(path) => Seed::from_path(path).await?,
    None => Seed::demo()?,
  };
  tracing::info!(
    profiles = seed.profiles.len(),
    messages = seed.messages.len(),
    events = seed.events.len(),
    "seeded store"
  );
  Ok(MemoryStore::new(seed).with_latency(config.latency()))
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The API nested under `/api`, with request tracing.
pub fn router(store: Arc<MemoryStore>) -> Router {
  Router::new()
    .nest("/api", groupware_api::api_router(store))
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use config::{Config, File, FileFormat};
  use groupware_core::profile::Profile;
  use groupware_store_memory::DEMO_USER_ID;
  use tower::ServiceExt as _;

  use super::*;

  #[test]
  fn missing_settings_fall_back_to_defaults() {
    let config: ServerConfig = Config::builder().build().unwrap().try_deserialize().unwrap();
    assert_eq!(config, ServerConfig::default());
    assert_eq!(config.address(), "127.0.0.1:8080");
    assert_eq!(config.latency(), Latency::none());
  }

  #[test]
  fn file_settings_override_defaults() {
    let toml = r#"
      port = 9000
      fixtures = "seed.json"
      read_latency_ms = 200
      write_latency_ms = 300
    "#;
    let config: ServerConfig = Config::builder()
      .add_source(File::from_str(toml, FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap();
    assert_eq!(config.port, 9000);
    assert_eq!(config.host, "127.0.0.1");
    assert_eq!(config.fixtures, Some(PathBuf::from("seed.json")));
    assert_eq!(config.latency(), Latency::simulated());
  }

  #[tokio::test]
  async fn missing_fixtures_file_is_an_error() {
    let config = ServerConfig {
      fixtures: Some(PathBuf::from("/nonexistent/seed.json")),
      ..ServerConfig::default()
    };
    assert!(build_store(&config).await.is_err());
  }

  #[tokio::test]
  async fn api_is_served_under_prefix() {
    let store = build_store(&ServerConfig::default()).await.unwrap();
    let req = Request::builder()
      .uri("/api/profiles")
      .header(groupware_api::USER_ID_HEADER, DEMO_USER_ID.to_string())
      .body(Body::empty())
      .unwrap();
    let resp = router(Arc::new(store)).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let profiles: Vec<Profile> = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(profiles.len(), 4);
  }
}
