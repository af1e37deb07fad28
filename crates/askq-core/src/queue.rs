//! The moderation queue: admission, administrator transitions, listings.
//!
//! Every mutating operation is a single [`SubmissionStore::update`]
//! transaction, written back immediately; nothing is batched.

use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::{
  admission::{self, AdmissionPolicy, RejectReason, ThroughputTracker},
  error::{QueueError, QueueResult},
  store::{Mutation, SubmissionStore},
  submission::{ANONYMOUS, Collection, Status, Submission},
};

// ─── Policies ────────────────────────────────────────────────────────────────

/// Whether `cancel` may target records that already reached `approved` or
/// `rejected`. Both policies existed historically; the choice is explicit,
/// never implied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CancelPolicy {
  /// Cancellation is a retroactive correction: any non-cancelled record.
  #[default]
  AnyStatus,
  /// Only `pending` records may be cancelled.
  PendingOnly,
}

/// Policy for the administrator-facing transitions.
#[derive(Debug, Clone, Default)]
pub struct ModerationPolicy {
  pub cancel: CancelPolicy,
}

// ─── Results ─────────────────────────────────────────────────────────────────

/// Outcome of a submission attempt. Both variants carry the submitter's
/// remaining pending slots, surfaced as user feedback.
#[derive(Debug)]
pub enum AdmissionOutcome {
  Accepted {
    submission: Submission,
    slots_left: usize,
  },
  Rejected {
    reason:     RejectReason,
    slots_left: usize,
  },
}

/// A submitter's own view of the queue: their non-cancelled records plus the
/// computed remaining quota.
#[derive(Debug)]
pub struct SubmitterListing {
  pub submissions: Vec<Submission>,
  pub slots_left:  usize,
}

// ─── Queue ───────────────────────────────────────────────────────────────────

/// The moderation queue over a storage backend `S`.
///
/// One instance per process: the throughput tracker inside is the
/// session-scoped rate-limit and duplicate memory, so two instances over the
/// same store would not share it.
pub struct ModerationQueue<S> {
  store:      S,
  admission:  AdmissionPolicy,
  moderation: ModerationPolicy,
  throughput: Mutex<ThroughputTracker>,
}

impl<S: SubmissionStore> ModerationQueue<S> {
  pub fn new(store: S) -> Self {
    Self::with_policies(store, AdmissionPolicy::default(), ModerationPolicy::default())
  }

  pub fn with_policies(
    store: S,
    admission: AdmissionPolicy,
    moderation: ModerationPolicy,
  ) -> Self {
    Self {
      store,
      admission,
      moderation,
      throughput: Mutex::new(ThroughputTracker::default()),
    }
  }

  pub fn store(&self) -> &S { &self.store }

  // ── Admission ─────────────────────────────────────────────────────────

  /// Run `raw_text` through the admission pipeline; on success the record
  /// is created `pending` and persisted before this returns.
  pub async fn submit(
    &self,
    submitter_id: i64,
    display_name: &str,
    raw_text: &str,
  ) -> Result<AdmissionOutcome, S::Error> {
    self.submit_at(submitter_id, display_name, raw_text, Utc::now()).await
  }

  /// [`submit`](Self::submit) with an explicit clock, for cooldown-sensitive
  /// callers and tests.
  pub async fn submit_at(
    &self,
    submitter_id: i64,
    display_name: &str,
    raw_text: &str,
    now: DateTime<Utc>,
  ) -> Result<AdmissionOutcome, S::Error> {
    let text = raw_text.trim().to_owned();

    // Gates 1–2: local text checks.
    if let Some(reason) = admission::check_text(&self.admission, &text) {
      return self.rejected(submitter_id, reason).await;
    }

    // Gates 3–4: session throughput state.
    let fingerprint = admission::fingerprint(&text);
    let throughput_reason = {
      let tracker = self.lock_throughput();
      if let Some(wait_secs) =
        tracker.rate_limit_hit(submitter_id, now, self.admission.cooldown)
      {
        Some(RejectReason::RateLimited { wait_secs })
      } else if tracker.is_duplicate(submitter_id, &fingerprint) {
        Some(RejectReason::ExactDuplicate)
      } else {
        None
      }
    };
    if let Some(reason) = throughput_reason {
      return self.rejected(submitter_id, reason).await;
    }

    // Gates 5–8 and record creation share one transaction, so no other
    // command can slip in between the scan and the insert.
    let denylist = self.store.denylist().await?;
    let policy = self.admission.clone();
    let display_name = display_name.trim();
    let name = if display_name.is_empty() {
      ANONYMOUS.to_owned()
    } else {
      display_name.to_owned()
    };
    let candidate = text.clone();
    let outcome = self
      .store
      .update(move |collection| {
        if let Some(reason) = admission::check_against_collection(
          &policy,
          collection,
          submitter_id,
          &candidate,
          &denylist,
        ) {
          let slots_left = slots_left(&policy, collection, submitter_id);
          return Mutation::Discard(AdmissionOutcome::Rejected { reason, slots_left });
        }

        let submission =
          Submission::new(collection.next_id(), submitter_id, name, candidate);
        collection.questions.push(submission.clone());
        let slots_left = slots_left(&policy, collection, submitter_id);
        Mutation::Commit(AdmissionOutcome::Accepted { submission, slots_left })
      })
      .await?;

    match &outcome {
      AdmissionOutcome::Accepted { submission, .. } => {
        // Only after the write committed: a failed write must leave the
        // session memory untouched.
        self.lock_throughput().record_accepted(submitter_id, fingerprint, now);
        tracing::info!(id = submission.id, submitter_id, "submission accepted");
      }
      AdmissionOutcome::Rejected { reason, .. } => {
        tracing::info!(submitter_id, %reason, "submission rejected");
      }
    }
    Ok(outcome)
  }

  /// Build the rejection reply for the early gates. Remaining quota is user
  /// feedback on every path, so even these read the store once.
  async fn rejected(
    &self,
    submitter_id: i64,
    reason: RejectReason,
  ) -> Result<AdmissionOutcome, S::Error> {
    let collection = self.store.snapshot().await?;
    let slots_left = slots_left(&self.admission, &collection, submitter_id);
    tracing::info!(submitter_id, %reason, "submission rejected");
    Ok(AdmissionOutcome::Rejected { reason, slots_left })
  }

  fn lock_throughput(&self) -> std::sync::MutexGuard<'_, ThroughputTracker> {
    self.throughput.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
  }

  // ── Administrator transitions ─────────────────────────────────────────

  /// `pending → approved`, storing the admin-supplied response text.
  pub async fn approve(
    &self,
    id: u64,
    response: &str,
  ) -> QueueResult<Submission, S::Error> {
    let response = response.to_owned();
    let updated = self
      .store
      .update(move |collection| {
        match collection
          .questions
          .iter_mut()
          .find(|q| q.id == id && q.status == Status::Pending && !q.is_cancelled)
        {
          Some(q) => {
            q.status = Status::Approved;
            q.response_text = Some(response);
            Mutation::Commit(Some(q.clone()))
          }
          None => Mutation::Discard(None),
        }
      })
      .await
      .map_err(QueueError::Store)?;

    let submission = updated.ok_or(QueueError::NotFound(id))?;
    tracing::info!(id, "submission approved");
    Ok(submission)
  }

  /// `pending → rejected`, storing the admin-supplied reason.
  pub async fn reject(
    &self,
    id: u64,
    reason: &str,
  ) -> QueueResult<Submission, S::Error> {
    let reason = reason.to_owned();
    let updated = self
      .store
      .update(move |collection| {
        match collection
          .questions
          .iter_mut()
          .find(|q| q.id == id && q.status == Status::Pending && !q.is_cancelled)
        {
          Some(q) => {
            q.status = Status::Rejected;
            q.reject_reason = reason;
            Mutation::Commit(Some(q.clone()))
          }
          None => Mutation::Discard(None),
        }
      })
      .await
      .map_err(QueueError::Store)?;

    let submission = updated.ok_or(QueueError::NotFound(id))?;
    tracing::info!(id, "submission rejected by admin");
    Ok(submission)
  }

  /// Cancel a record, preserving it with terminal status for the audit
  /// trail. Eligible statuses depend on [`CancelPolicy`].
  pub async fn cancel(
    &self,
    id: u64,
    reason: &str,
  ) -> QueueResult<Submission, S::Error> {
    let reason = reason.to_owned();
    let allow_terminal = self.moderation.cancel == CancelPolicy::AnyStatus;
    let updated = self
      .store
      .update(move |collection| {
        match collection.questions.iter_mut().find(|q| {
          q.id == id
            && !q.is_cancelled
            && (allow_terminal || q.status == Status::Pending)
        }) {
          Some(q) => {
            q.status = Status::Cancelled;
            q.is_cancelled = true;
            q.cancel_reason = reason;
            Mutation::Commit(Some(q.clone()))
          }
          None => Mutation::Discard(None),
        }
      })
      .await
      .map_err(QueueError::Store)?;

    let submission = updated.ok_or(QueueError::NotFound(id))?;
    tracing::info!(id, "submission cancelled");
    Ok(submission)
  }

  /// Rewrite the text of any non-cancelled record, regardless of status.
  /// Does not re-run the admission pipeline.
  pub async fn edit(
    &self,
    id: u64,
    new_text: &str,
  ) -> QueueResult<Submission, S::Error> {
    let new_text = new_text.trim().to_owned();
    let updated = self
      .store
      .update(move |collection| {
        match collection
          .questions
          .iter_mut()
          .find(|q| q.id == id && !q.is_cancelled)
        {
          Some(q) => {
            q.text = new_text;
            Mutation::Commit(Some(q.clone()))
          }
          None => Mutation::Discard(None),
        }
      })
      .await
      .map_err(QueueError::Store)?;

    let submission = updated.ok_or(QueueError::NotFound(id))?;
    tracing::info!(id, "submission edited");
    Ok(submission)
  }

  /// Physically remove a record. Unlike [`cancel`](Self::cancel) this loses
  /// the audit trail.
  pub async fn delete(&self, id: u64) -> QueueResult<(), S::Error> {
    let removed = self
      .store
      .update(move |collection| {
        let before = collection.questions.len();
        collection.questions.retain(|q| q.id != id);
        if collection.questions.len() == before {
          Mutation::Discard(false)
        } else {
          Mutation::Commit(true)
        }
      })
      .await
      .map_err(QueueError::Store)?;

    if !removed {
      return Err(QueueError::NotFound(id));
    }
    tracing::info!(id, "submission deleted");
    Ok(())
  }

  /// Truncate the whole collection.
  pub async fn clear(&self) -> Result<(), S::Error> {
    self.store.replace(Collection::default()).await?;
    tracing::info!("collection cleared");
    Ok(())
  }

  // ── Listings ──────────────────────────────────────────────────────────

  /// All non-cancelled records, for administrator review.
  pub async fn list_active(&self) -> Result<Vec<Submission>, S::Error> {
    let collection = self.store.snapshot().await?;
    Ok(collection.active().cloned().collect())
  }

  /// One submitter's non-cancelled records with their remaining quota.
  pub async fn list_for(
    &self,
    submitter_id: i64,
  ) -> Result<SubmitterListing, S::Error> {
    let collection = self.store.snapshot().await?;
    let submissions = collection
      .active()
      .filter(|q| q.submitter_id == submitter_id)
      .cloned()
      .collect();
    let slots_left = slots_left(&self.admission, &collection, submitter_id);
    Ok(SubmitterListing { submissions, slots_left })
  }

  /// Opt the submitter in to status-change notifications for their own
  /// record. Returns `false` when the record does not exist, is cancelled,
  /// or belongs to someone else. Idempotent.
  pub async fn opt_in_notify(
    &self,
    id: u64,
    submitter_id: i64,
  ) -> Result<bool, S::Error> {
    self
      .store
      .update(move |collection| {
        match collection.questions.iter_mut().find(|q| {
          q.id == id && q.submitter_id == submitter_id && !q.is_cancelled
        }) {
          Some(q) if !q.notify_requested => {
            q.notify_requested = true;
            Mutation::Commit(true)
          }
          Some(_) => Mutation::Discard(true),
          None => Mutation::Discard(false),
        }
      })
      .await
  }
}

fn slots_left(
  policy: &AdmissionPolicy,
  collection: &Collection,
  submitter_id: i64,
) -> usize {
  policy.pending_quota.saturating_sub(collection.pending_for(submitter_id))
}

// ─── Tests ───────────────────────────────────────────────────────────────────
