//! HTTP server assembly for College Connect.
//!
//! Glues the [`campus_api`] router to a concrete store, adds `/health` and
//! request tracing, and owns the deserialised [`ServerConfig`].

use std::{path::PathBuf, sync::Arc};

use axum::{Json, Router, http::HeaderName, routing::get};
use campus_api::{ApiOptions, CampusStore, identity::DEFAULT_IDENTITY_HEADER};
use campus_core::aggregator::DEFAULT_RETRY_LIMIT;
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `CAMPUS_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:             String,
  #[serde(default = "default_port")]
  pub port:             u16,
  #[serde(default = "default_store_path")]
  pub store_path:       PathBuf,
  #[serde(default = "default_identity_header")]
  pub identity_header:  String,
  #[serde(default = "default_retry_limit")]
  pub vote_retry_limit: u32,
}

fn default_host() -> String { "127.0.0.1".to_owned() }
fn default_port() -> u16 { 8080 }
fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/campus/campus.db") }
fn default_identity_header() -> String { DEFAULT_IDENTITY_HEADER.to_owned() }
fn default_retry_limit() -> u32 { DEFAULT_RETRY_LIMIT }

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:             default_host(),
      port:             default_port(),
      store_path:       default_store_path(),
      identity_header:  default_identity_header(),
      vote_retry_limit: default_retry_limit(),
    }
  }
}

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("invalid identity header name {0:?}")]
  IdentityHeader(String),
}

impl ServerConfig {
  pub fn api_options(&self) -> Result<ApiOptions, ConfigError> {
    let identity_header = HeaderName::try_from(self.identity_header.trim())
      .map_err(|_| ConfigError::IdentityHeader(self.identity_header.clone()))?;
    Ok(ApiOptions { identity_header, vote_retry_limit: self.vote_retry_limit })
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router: the API under `/api` plus `/health`.
pub fn router<S: CampusStore>(
  store: Arc<S>,
  config: &ServerConfig,
) -> Result<Router, ConfigError> {
  let api = campus_api::api_router(store, config.api_options()?);
  Ok(
    Router::new()
      .route("/health", get(health))
      .nest("/api", api)
      .layer(TraceLayer::new_for_http()),
  )
}

async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }

// ─── Tests ────────────────────────────────────────────────────────────────────
