//! Handlers for `/api/questions`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/api/questions` | Approved, non-cancelled records only |
//! | `POST` | `/api/questions` | Whole-collection overwrite, bearer-gated |

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
  http::HeaderMap,
};
use askq_core::{
  store::SubmissionStore,
  submission::{Collection, Status, Submission},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{AppState, error::ApiError};

// ─── Published projection ─────────────────────────────────────────────────────

/// The subset of a record the website gets to see.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublishedQuestion {
  pub id:       u64,
  pub username: String,
  pub question: String,
  pub answer:   String,
}

impl From<&Submission> for PublishedQuestion {
  fn from(s: &Submission) -> Self {
    Self {
      id:       s.id,
      username: s.display_name.clone(),
      question: s.text.clone(),
      answer:   s.response_text.clone().unwrap_or_default(),
    }
  }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PublishedDoc {
  pub questions: Vec<PublishedQuestion>,
}

// ─── Read ─────────────────────────────────────────────────────────────────────

/// `GET /api/questions`
pub async fn published<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<PublishedDoc>, ApiError>
where
  S: SubmissionStore,
{
  let collection = state
    .store
    .snapshot()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  let questions = collection
    .questions
    .iter()
    .filter(|q| q.status == Status::Approved && !q.is_cancelled)
    .map(PublishedQuestion::from)
    .collect();
  Ok(Json(PublishedDoc { questions }))
}

// ─── Overwrite ────────────────────────────────────────────────────────────────

/// `POST /api/questions` — body: the full persisted collection.
///
/// The secret check runs before the body is even looked at, so a caller with
/// the wrong credential learns nothing about what would have been rejected as
/// malformed.
pub async fn overwrite<S>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
  body: Result<Json<Collection>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: SubmissionStore,
{
  verify_secret(&headers, &state.secret)?;
  let Json(collection) =
    body.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
  state
    .store
    .replace(collection)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(json!({ "message": "Вопросы успешно обновлены" })))
}

fn verify_secret(
  headers: &HeaderMap,
  expected: &str,
) -> Result<(), ApiError> {
  let presented = headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "));
  match presented {
    Some(secret) if secret == expected => Ok(()),
    _ => Err(ApiError::Unauthorized),
  }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
