//! Core types and trait definitions for the askq moderation queue.
//!
//! This crate is deliberately free of HTTP and filesystem dependencies.
//! It holds the admission pipeline, the moderation state machine, the
//! notification dispatcher, and the [`SubmissionStore`](store::SubmissionStore)
//! trait that storage backends implement.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod admission;
pub mod error;
pub mod notify;
pub mod queue;
pub mod similarity;
pub mod store;
pub mod submission;

pub use error::QueueError;
