//! Submission records and the persisted collection document.
//!
//! A submission is created `pending` and is mutated only by
//! administrator-invoked transitions. Terminal records are retained for
//! audit and listing; only the explicit `delete`/`clear` operations remove
//! them physically.

use serde::{Deserialize, Serialize};

/// Placeholder used when the submitter has no usable display name.
pub const ANONYMOUS: &str = "Аноним";

// ─── Status ──────────────────────────────────────────────────────────────────

/// Moderation disposition of a submission. Everything but `Pending` is
/// terminal (barring retroactive cancellation, see
/// [`CancelPolicy`](crate::queue::CancelPolicy)).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
  Pending,
  Approved,
  Rejected,
  Cancelled,
}

impl Status {
  pub fn is_terminal(&self) -> bool { !matches!(self, Self::Pending) }

  /// Russian display string used in user-facing listings.
  pub fn display_ru(&self) -> &'static str {
    match self {
      Self::Pending => "Рассматривается",
      Self::Approved => "Принят",
      Self::Rejected => "Отклонён",
      Self::Cancelled => "Аннулирован",
    }
  }
}

// ─── Submission ──────────────────────────────────────────────────────────────

/// One moderated question. Field names double as the persisted JSON layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
  pub id:           u64,
  pub submitter_id: i64,
  pub display_name: String,
  pub text:         String,
  pub status:       Status,
  /// Set only by the submitter's own opt-in action, never by the admin.
  #[serde(default)]
  pub notify_requested: bool,
  /// Kept alongside `status` for backward-compatible filtering; `true` iff
  /// `status` is [`Status::Cancelled`].
  #[serde(default)]
  pub is_cancelled: bool,
  #[serde(default)]
  pub cancel_reason: String,
  #[serde(default)]
  pub reject_reason: String,
  /// Present exactly when `status` is [`Status::Approved`].
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub response_text: Option<String>,
}

impl Submission {
  /// A fresh `pending` record.
  pub fn new(
    id: u64,
    submitter_id: i64,
    display_name: String,
    text: String,
  ) -> Self {
    Self {
      id,
      submitter_id,
      display_name,
      text,
      status: Status::Pending,
      notify_requested: false,
      is_cancelled: false,
      cancel_reason: String::new(),
      reject_reason: String::new(),
      response_text: None,
    }
  }

  pub fn is_active(&self) -> bool { !self.is_cancelled }

  /// Whether this record occupies one of the submitter's pending slots.
  pub fn counts_against_quota(&self) -> bool {
    self.status == Status::Pending && !self.is_cancelled
  }
}

// ─── Collection ──────────────────────────────────────────────────────────────

/// The whole persisted document: a single array of submission records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
  #[serde(default)]
  pub questions: Vec<Submission>,
}

impl Collection {
  /// Next id to assign: `max(id) + 1`, decoupled from the collection length
  /// so deleting a non-latest record cannot cause id reuse.
  pub fn next_id(&self) -> u64 {
    self.questions.iter().map(|q| q.id).max().unwrap_or(0) + 1
  }

  /// All non-cancelled records.
  pub fn active(&self) -> impl Iterator<Item = &Submission> {
    self.questions.iter().filter(|q| q.is_active())
  }

  /// How many pending slots `submitter_id` currently occupies.
  pub fn pending_for(&self, submitter_id: i64) -> usize {
    self
      .questions
      .iter()
      .filter(|q| q.submitter_id == submitter_id && q.counts_against_quota())
      .count()
  }
}
