//! Integration tests for `JsonStore` against temporary directories.

use askq_core::{
  queue::{AdmissionOutcome, ModerationQueue},
  store::{Mutation, SubmissionStore},
  submission::{Collection, Status, Submission},
};
use tempfile::TempDir;

use crate::{Error, JsonStore};

fn store(dir: &TempDir) -> JsonStore {
  JsonStore::open(
    dir.path().join("questions.json"),
    dir.path().join("blacklist.json"),
  )
}

fn sample(id: u64, submitter_id: i64, text: &str) -> Submission {
  Submission::new(id, submitter_id, "tester".into(), text.into())
}

// ─── Reads ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_documents_read_as_empty() {
  let dir = TempDir::new().unwrap();
  let s = store(&dir);

  assert_eq!(s.snapshot().await.unwrap(), Collection::default());
  assert!(s.denylist().await.unwrap().is_empty());
}

#[tokio::test]
async fn write_then_read_round_trips() {
  let dir = TempDir::new().unwrap();
  let s = store(&dir);

  let mut collection = Collection::default();
  collection.questions.push(sample(1, 42, "Какая твоя любимая игра?"));
  let mut approved = sample(2, 43, "Когда выйдет новое видео про майнкрафт?");
  approved.status = Status::Approved;
  approved.response_text = Some("скоро".into());
  collection.questions.push(approved);

  s.replace(collection.clone()).await.unwrap();
  let read = s.snapshot().await.unwrap();
  assert_eq!(read, collection);

  // Writing back an unmodified collection is idempotent.
  s.replace(read.clone()).await.unwrap();
  assert_eq!(s.snapshot().await.unwrap(), read);
}

#[tokio::test]
async fn denylist_document_is_parsed() {
  let dir = TempDir::new().unwrap();
  let s = store(&dir);
  std::fs::write(
    dir.path().join("blacklist.json"),
    r#"{"blacklist": ["казино", "спам"]}"#,
  )
  .unwrap();

  assert_eq!(s.denylist().await.unwrap(), vec!["казино", "спам"]);
}

// ─── Update transactions ─────────────────────────────────────────────────────

#[tokio::test]
async fn committed_update_is_persisted() {
  let dir = TempDir::new().unwrap();
  let s = store(&dir);

  let id = s
    .update(|collection| {
      let submission = sample(collection.next_id(), 42, "Какая твоя любимая игра?");
      let id = submission.id;
      collection.questions.push(submission);
      Mutation::Commit(id)
    })
    .await
    .unwrap();
  assert_eq!(id, 1);

  // A fresh store over the same files sees the write.
  let reopened = store(&dir);
  let read = reopened.snapshot().await.unwrap();
  assert_eq!(read.questions.len(), 1);
  assert_eq!(read.questions[0].id, 1);
}

#[tokio::test]
async fn discarded_update_leaves_the_document_alone() {
  let dir = TempDir::new().unwrap();
  let s = store(&dir);
  let mut collection = Collection::default();
  collection.questions.push(sample(1, 42, "Какая твоя любимая игра?"));
  s.replace(collection.clone()).await.unwrap();

  let value = s
    .update(|collection| {
      collection.questions.clear();
      Mutation::Discard("nope")
    })
    .await
    .unwrap();
  assert_eq!(value, "nope");
  assert_eq!(s.snapshot().await.unwrap(), collection);
}

// ─── Corruption and backups ──────────────────────────────────────────────────

#[tokio::test]
async fn corrupt_document_degrades_reads_and_fails_updates() {
  let dir = TempDir::new().unwrap();
  let s = store(&dir);
  std::fs::write(dir.path().join("questions.json"), "{ not json").unwrap();

  // Reads degrade to empty.
  assert_eq!(s.snapshot().await.unwrap(), Collection::default());

  // Mutations fail closed instead of clobbering the damaged document.
  let result = s
    .update(|collection| {
      collection.questions.push(sample(1, 42, "Какая твоя любимая игра?"));
      Mutation::Commit(())
    })
    .await;
  assert!(matches!(result, Err(Error::Corruption(_))));
  assert_eq!(
    std::fs::read_to_string(dir.path().join("questions.json")).unwrap(),
    "{ not json"
  );
}

#[tokio::test]
async fn corrupt_denylist_is_ignored() {
  let dir = TempDir::new().unwrap();
  let s = store(&dir);
  std::fs::write(dir.path().join("blacklist.json"), "[[[").unwrap();
  assert!(s.denylist().await.unwrap().is_empty());
}

#[tokio::test]
async fn previous_version_is_kept_as_backup() {
  let dir = TempDir::new().unwrap();
  let s = store(&dir);

  let mut first = Collection::default();
  first.questions.push(sample(1, 42, "Какая твоя любимая игра?"));
  s.replace(first.clone()).await.unwrap();

  let mut second = first.clone();
  second.questions.push(sample(2, 43, "Почему ты решил стать стримером?"));
  s.replace(second).await.unwrap();

  let backup = dir.path().join("questions.json.bak");
  let restored: Collection =
    serde_json::from_slice(&std::fs::read(backup).unwrap()).unwrap();
  assert_eq!(restored, first);
}

// ─── Through the moderation queue ────────────────────────────────────────────

#[tokio::test]
async fn queue_state_survives_reopening_the_store() {
  let dir = TempDir::new().unwrap();
  let queue = ModerationQueue::new(store(&dir));

  let id = match queue
    .submit(42, "tester", "Какая твоя любимая игра?")
    .await
    .unwrap()
  {
    AdmissionOutcome::Accepted { submission, .. } => submission.id,
    AdmissionOutcome::Rejected { reason, .. } => panic!("rejected: {reason}"),
  };
  queue.approve(id, "Minecraft").await.unwrap();

  let reopened = ModerationQueue::new(store(&dir));
  let listing = reopened.list_for(42).await.unwrap();
  assert_eq!(listing.submissions.len(), 1);
  assert_eq!(listing.submissions[0].status, Status::Approved);
  assert_eq!(listing.submissions[0].response_text.as_deref(), Some("Minecraft"));
}
