//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("invalid or missing shared secret")]
  Unauthorized,

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, format!("bad request: {m}")),
      ApiError::Store(e) => {
        // The backing document's problems are not the caller's business.
        tracing::error!(error = %e, "store failure while serving api request");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          "внутренняя ошибка, свяжитесь с оператором".to_string(),
        )
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
