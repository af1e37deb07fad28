//! Website-facing HTTP API for askq.
//!
//! Exposes an axum [`Router`] backed by any
//! [`askq_core::store::SubmissionStore`]. `GET /api/questions` serves the
//! approved, non-cancelled records; `POST /api/questions` replaces the whole
//! persisted collection and is gated by a shared-secret bearer token.
//! TLS and anything beyond that one credential are the deployment's concern.

pub mod error;
pub mod questions;

use std::{path::PathBuf, sync::Arc};

use askq_core::store::SubmissionStore;
use axum::{Router, routing::get};
use serde::Deserialize;

pub use error::ApiError;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:           String,
  pub port:           u16,
  pub questions_path: PathBuf,
  pub denylist_path:  PathBuf,
  pub api_secret:     String,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<S> {
  pub store:  Arc<S>,
  /// Shared secret expected as `Authorization: Bearer …` on write requests.
  pub secret: Arc<String>,
}

// Manual impl: `Arc` clones regardless of whether `S` does.
impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:  Arc::clone(&self.store),
      secret: Arc::clone(&self.secret),
    }
  }
}

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: SubmissionStore + 'static,
{
  Router::new()
    .route(
      "/api/questions",
      get(questions::published::<S>).post(questions::overwrite::<S>),
    )
    .with_state(state)
}
