//! Error types for `askq-core`.

use thiserror::Error;

/// An error from a moderation-queue operation.
///
/// Admission rejections are deliberately not errors: they are the `Rejected`
/// variant of [`AdmissionOutcome`](crate::queue::AdmissionOutcome) and always
/// reach the submitter as an ordinary reply.
#[derive(Debug, Error)]
pub enum QueueError<E> {
  /// The operation referenced a submission that does not exist or is not in
  /// an eligible state (e.g. approving a record that is no longer pending).
  #[error("submission not found: {0}")]
  NotFound(u64),

  #[error("store error: {0}")]
  Store(#[source] E),
}

pub type QueueResult<T, E> = std::result::Result<T, QueueError<E>>;
