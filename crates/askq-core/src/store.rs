//! The `SubmissionStore` trait and the mutation wrapper.
//!
//! The trait is implemented by storage backends (e.g. `askq-store-json`).
//! Higher layers depend on this abstraction, not on any concrete backend.

use std::future::Future;

use crate::submission::Collection;

// ─── Mutation ────────────────────────────────────────────────────────────────

/// What an [`SubmissionStore::update`] closure decided: whether the mutated
/// collection should be written back.
#[derive(Debug)]
pub enum Mutation<R> {
  /// Persist the mutated collection, then return the value.
  Commit(R),
  /// Drop the staged mutation and return the value without writing.
  Discard(R),
}

impl<R> Mutation<R> {
  pub fn into_inner(self) -> R {
    match self {
      Self::Commit(r) | Self::Discard(r) => r,
    }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the persisted submission collection.
///
/// The collection is one logical document. Implementations must serialise
/// every operation through a single per-store lock, and [`update`] must hold
/// that lock across the whole read-mutate-write sequence — two interleaved
/// command handlers must never see each other's half-applied mutation.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
///
/// [`update`]: SubmissionStore::update
pub trait SubmissionStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Read the current collection.
  ///
  /// Implementations degrade on a corrupt document: log it and return an
  /// empty collection rather than failing the read.
  fn snapshot(
    &self,
  ) -> impl Future<Output = Result<Collection, Self::Error>> + Send + '_;

  /// Atomically replace the whole persisted document.
  fn replace(
    &self,
    collection: Collection,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Apply `mutate` to the collection under the store lock, writing the
  /// result back only when the closure returns [`Mutation::Commit`].
  ///
  /// Unlike [`snapshot`](SubmissionStore::snapshot), a corrupt document
  /// fails this call: a mutation derived from a silently-emptied collection
  /// would overwrite whatever is left of the damaged document.
  fn update<R, F>(
    &self,
    mutate: F,
  ) -> impl Future<Output = Result<R, Self::Error>> + Send
  where
    R: Send,
    F: FnOnce(&mut Collection) -> Mutation<R> + Send;

  /// Read the configured denylist of banned substrings.
  fn denylist(
    &self,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;
}
