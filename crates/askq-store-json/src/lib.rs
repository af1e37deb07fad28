//! JSON-file backend for the askq submission store.
//!
//! Two human-editable UTF-8 documents: the submission collection and the
//! denylist of banned substrings. Every operation holds a single per-store
//! async mutex for its full duration, so read-modify-write sequences from
//! concurrent command handlers cannot interleave.

mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::JsonStore;

#[cfg(test)]
mod tests;
