//! Deciding whether, and how, to tell a submitter about a state change.
//!
//! The chat adapter implements [`NotifyChannel`]; the dispatcher decides per
//! record whether to message at all (the submitter's opt-in flag) and falls
//! back to plain text when the rich variant is refused. Delivery failure is
//! reported and logged, never propagated: the moderation action that
//! triggered it has already succeeded.

use std::{fmt, future::Future};

use crate::submission::Submission;

// ─── Types ───────────────────────────────────────────────────────────────────

/// The state change a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
  Approved,
  Rejected,
  Cancelled,
}

/// What happened to a notification attempt.
#[derive(Debug, PartialEq, Eq)]
pub enum NotifyOutcome {
  Sent,
  Skipped { reason: &'static str },
  Failed { error: String },
}

/// Outbound message channel to a submitter, implemented by the chat adapter.
///
/// `send_rich` may carry markup; `send_plain` is the unformatted fallback
/// used when the transport refuses the rich variant.
pub trait NotifyChannel: Send + Sync {
  type Error: fmt::Display + Send;

  fn send_rich(
    &self,
    submitter_id: i64,
    text: &str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send;

  fn send_plain(
    &self,
    submitter_id: i64,
    text: &str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

// ─── Dispatcher ──────────────────────────────────────────────────────────────

/// Notify the submission's author about `transition`, honouring the record's
/// opt-in flag.
///
/// `admin_text` overrides the text taken from the record (the response for
/// an approval, the reason for a cancellation).
pub async fn notify<C: NotifyChannel>(
  channel: &C,
  submission: &Submission,
  transition: Transition,
  admin_text: Option<&str>,
) -> NotifyOutcome {
  if !submission.notify_requested {
    return NotifyOutcome::Skipped { reason: "notifications not requested" };
  }

  let text = message(transition, submission, admin_text);
  if channel.send_rich(submission.submitter_id, &text).await.is_ok() {
    return NotifyOutcome::Sent;
  }

  tracing::debug!(
    submitter_id = submission.submitter_id,
    "rich notification refused, retrying plain"
  );
  match channel.send_plain(submission.submitter_id, &text).await {
    Ok(()) => NotifyOutcome::Sent,
    Err(e) => {
      tracing::warn!(
        submitter_id = submission.submitter_id,
        error = %e,
        "notification delivery failed"
      );
      NotifyOutcome::Failed { error: e.to_string() }
    }
  }
}

/// Message body for a transition, in the bot's voice.
fn message(
  transition: Transition,
  submission: &Submission,
  admin_text: Option<&str>,
) -> String {
  match transition {
    Transition::Approved => {
      let answer = admin_text
        .or(submission.response_text.as_deref())
        .unwrap_or_default();
      format!("Твой вопрос принят! 😎 Ответ: {answer}\nСмотри на сайте!")
    }
    Transition::Rejected => {
      "Твой вопрос отклонён 😕 Попробуй задать другой!".to_owned()
    }
    Transition::Cancelled => {
      let reason = admin_text.unwrap_or(&submission.cancel_reason);
      if reason.is_empty() {
        "Твой вопрос аннулирован.".to_owned()
      } else {
        format!("Твой вопрос аннулирован: {reason}")
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use super::*;
  use crate::submission::{Status, Submission};

  /// Channel double that records deliveries and can refuse either variant.
  #[derive(Default)]
  struct Channel {
    refuse_rich:  bool,
    refuse_plain: bool,
    rich:         Mutex<Vec<(i64, String)>>,
    plain:        Mutex<Vec<(i64, String)>>,
  }

  impl NotifyChannel for Channel {
    type Error = String;

    async fn send_rich(&self, submitter_id: i64, text: &str) -> Result<(), String> {
      if self.refuse_rich {
        return Err("bad markup".to_owned());
      }
      self.rich.lock().unwrap().push((submitter_id, text.to_owned()));
      Ok(())
    }

    async fn send_plain(&self, submitter_id: i64, text: &str) -> Result<(), String> {
      if self.refuse_plain {
        return Err("blocked by user".to_owned());
      }
      self.plain.lock().unwrap().push((submitter_id, text.to_owned()));
      Ok(())
    }
  }

  fn approved_submission(notify_requested: bool) -> Submission {
    let mut s =
      Submission::new(1, 42, "tester".into(), "Какая твоя любимая игра?".into());
    s.status = Status::Approved;
    s.response_text = Some("Minecraft".into());
    s.notify_requested = notify_requested;
    s
  }

  #[tokio::test]
  async fn skips_when_not_requested() {
    let channel = Channel::default();
    let outcome =
      notify(&channel, &approved_submission(false), Transition::Approved, None)
        .await;
    assert_eq!(outcome, NotifyOutcome::Skipped { reason: "notifications not requested" });
    assert!(channel.rich.lock().unwrap().is_empty());
  }

  #[tokio::test]
  async fn sends_rich_with_the_stored_response() {
    let channel = Channel::default();
    let outcome =
      notify(&channel, &approved_submission(true), Transition::Approved, None)
        .await;
    assert_eq!(outcome, NotifyOutcome::Sent);

    let sent = channel.rich.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, 42);
    assert!(sent[0].1.contains("Minecraft"));
  }

  #[tokio::test]
  async fn falls_back_to_plain_when_rich_fails() {
    let channel = Channel { refuse_rich: true, ..Channel::default() };
    let outcome =
      notify(&channel, &approved_submission(true), Transition::Approved, None)
        .await;
    assert_eq!(outcome, NotifyOutcome::Sent);
    assert!(channel.rich.lock().unwrap().is_empty());
    assert_eq!(channel.plain.lock().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn reports_failure_when_both_variants_fail() {
    let channel =
      Channel { refuse_rich: true, refuse_plain: true, ..Channel::default() };
    let outcome =
      notify(&channel, &approved_submission(true), Transition::Approved, None)
        .await;
    assert_eq!(outcome, NotifyOutcome::Failed { error: "blocked by user".to_owned() });
  }

  #[tokio::test]
  async fn cancellation_uses_the_admin_reason() {
    let channel = Channel::default();
    let mut submission = approved_submission(true);
    submission.status = Status::Cancelled;
    submission.is_cancelled = true;

    let outcome =
      notify(&channel, &submission, Transition::Cancelled, Some("ответ устарел"))
        .await;
    assert_eq!(outcome, NotifyOutcome::Sent);
    let sent = channel.rich.lock().unwrap();
    assert!(sent[0].1.contains("ответ устарел"));
  }
}
