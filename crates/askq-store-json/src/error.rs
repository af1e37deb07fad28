//! Error type for `askq-store-json`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("i/o error: {0}")]
  Io(#[from] std::io::Error),

  /// The persisted document failed to parse. Read paths degrade to an empty
  /// collection; mutating paths surface this instead of clobbering whatever
  /// is left of the document.
  #[error("malformed store document: {0}")]
  Corruption(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
