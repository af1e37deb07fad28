//! The admission pipeline: the ordered chain of validation gates a raw
//! submission must pass before a `pending` record is created.
//!
//! Gate order is cheapest-first: purely textual checks (emptiness,
//! plausibility) run before the per-submitter throughput checks (rate limit,
//! exact duplicate), which run before the gates that scan the whole
//! persisted collection (near duplicate, quota, length bounds, denylist).
//! Each failing gate short-circuits with its own user-facing reason.

use std::{
  collections::{HashMap, HashSet},
  fmt,
  sync::LazyLock,
};

use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use sha2::{Digest, Sha256};

use crate::{similarity, submission::Collection};

static WORDS: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"[\p{L}\p{N}]+").expect("static word pattern"));

// ─── Policy ──────────────────────────────────────────────────────────────────

/// Tunable knobs of the admission pipeline. `Default` reflects the latest
/// production policy.
#[derive(Debug, Clone)]
pub struct AdmissionPolicy {
  /// Length bounds on the trimmed character count (gate 7).
  pub min_chars: usize,
  pub max_chars: usize,
  /// Shorter than this is implausible regardless of content (gate 2).
  pub min_plausible_chars: usize,
  /// A single character repeated this many times in a row (gate 2).
  pub max_char_run: usize,
  /// Texts with no interrogative marker need at least this many words
  /// (gate 2).
  pub min_words: usize,
  /// Texts shorter than this must mention a context keyword (gate 2).
  pub short_context_chars: usize,
  /// Cooldown between accepted submissions per submitter (gate 3).
  pub cooldown: Duration,
  /// Reject when similarity to any active record exceeds this (gate 5).
  /// Too low rejects unrelated short questions; too high lets paraphrased
  /// spam through.
  pub similarity_threshold: f64,
  /// Maximum simultaneous pending submissions per submitter (gate 6).
  pub pending_quota: usize,
  /// Interrogative words accepted in place of a question mark.
  pub question_words: Vec<String>,
  /// Domain keywords a short question must mention. Empty disables the
  /// check.
  pub context_keywords: Vec<String>,
  /// Whole words about the bot or platform itself; always rejected.
  pub meta_keywords: Vec<String>,
}

impl Default for AdmissionPolicy {
  fn default() -> Self {
    Self {
      min_chars: 5,
      max_chars: 500,
      min_plausible_chars: 10,
      max_char_run: 5,
      min_words: 3,
      short_context_chars: 25,
      cooldown: Duration::seconds(60),
      similarity_threshold: 0.7,
      pending_quota: 3,
      question_words: owned(&[
        "что", "чем", "как", "какой", "какая", "какое", "какие", "почему",
        "зачем", "когда", "где", "куда", "откуда", "кто", "кого", "кому",
        "сколько", "чей", "чья", "чьё", "ли",
      ]),
      context_keywords: owned(&[
        "игра", "игры", "игр", "игру", "стрим", "стримы", "стриме", "видео",
        "канал", "канале", "сайт", "сайте", "прохождение", "майнкрафт",
        "minecraft",
      ]),
      meta_keywords: owned(&["бот", "бота", "боту", "ботом", "телеграм", "telegram"]),
    }
  }
}

fn owned(words: &[&str]) -> Vec<String> {
  words.iter().map(|w| (*w).to_owned()).collect()
}

// ─── Rejection reasons ───────────────────────────────────────────────────────

/// Why a submission attempt was turned away, one variant per pipeline rule.
///
/// The `Display` impl is the user-facing reply, in the bot's voice. These
/// are ordinary feedback and are never logged as errors.
#[derive(Debug, Clone, PartialEq)]
pub enum RejectReason {
  Empty,
  TooShort { chars: usize },
  RepeatedCharacters,
  RepeatedWords,
  NotAQuestion,
  NoContext,
  MetaTopic,
  RateLimited { wait_secs: i64 },
  ExactDuplicate,
  NearDuplicate { existing: String },
  QuotaExhausted { quota: usize },
  OutOfBounds { min: usize, max: usize },
  Denylisted,
}

impl fmt::Display for RejectReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Empty => {
        write!(f, "Напиши вопрос после команды, например: Какая твоя любимая игра?")
      }
      Self::TooShort { chars } => {
        write!(f, "Вопрос из {chars} символов — это слишком коротко, добавь пару слов!")
      }
      Self::RepeatedCharacters => {
        write!(f, "Похоже на набор повторяющихся символов, а не вопрос 😕")
      }
      Self::RepeatedWords => {
        write!(f, "Одно и то же слово по кругу — это ещё не вопрос 😕")
      }
      Self::NotAQuestion => write!(
        f,
        "Не похоже на вопрос — поставь вопросительный знак или сформулируй подробнее!"
      ),
      Self::NoContext => write!(
        f,
        "Слишком коротко и непонятно, о чём это. Спроси про игры, стримы или сайт!"
      ),
      Self::MetaTopic => write!(f, "Вопросы про самого бота не принимаются 😎"),
      Self::RateLimited { wait_secs } => write!(
        f,
        "Йоу, не так быстро! Один вопрос в минуту, подожди ещё {wait_secs} сек."
      ),
      Self::ExactDuplicate => {
        write!(f, "Эй, ты уже спрашивал это! Попробуй другой вопрос.")
      }
      Self::NearDuplicate { existing } => {
        write!(f, "Очень похоже на уже заданный вопрос: «{existing}»")
      }
      Self::QuotaExhausted { quota } => write!(
        f,
        "У тебя уже {quota} вопроса на рассмотрении — дождись ответа на них!"
      ),
      Self::OutOfBounds { min, max } => {
        write!(f, "Вопрос должен быть от {min} до {max} символов!")
      }
      Self::Denylisted => {
        write!(f, "Вопрос содержит запрещённые слова 😿 Попробуй другой.")
      }
    }
  }
}

// ─── Gates 1–2: local text checks ────────────────────────────────────────────

/// Gates 1 and 2: everything that needs nothing but the text itself.
pub fn check_text(policy: &AdmissionPolicy, text: &str) -> Option<RejectReason> {
  if text.is_empty() {
    return Some(RejectReason::Empty);
  }

  // The run scan goes first: a five-character text of one repeated character
  // should report the repetition, not the length.
  if has_char_run(text, policy.max_char_run) {
    return Some(RejectReason::RepeatedCharacters);
  }

  let chars = text.chars().count();
  if chars < policy.min_plausible_chars {
    return Some(RejectReason::TooShort { chars });
  }

  let folded = text.to_lowercase();
  let words: Vec<&str> = WORDS.find_iter(&folded).map(|m| m.as_str()).collect();

  if words.len() > 1 && words.iter().all(|w| *w == words[0]) {
    return Some(RejectReason::RepeatedWords);
  }

  let interrogative = text.contains('?')
    || words.iter().any(|w| policy.question_words.iter().any(|q| q == w));
  if !interrogative && words.len() < policy.min_words {
    return Some(RejectReason::NotAQuestion);
  }

  if !policy.context_keywords.is_empty()
    && chars < policy.short_context_chars
    && !words.iter().any(|w| policy.context_keywords.iter().any(|k| k == w))
  {
    return Some(RejectReason::NoContext);
  }

  if words.iter().any(|w| policy.meta_keywords.iter().any(|m| m == w)) {
    return Some(RejectReason::MetaTopic);
  }

  None
}

fn has_char_run(text: &str, limit: usize) -> bool {
  let mut last = None;
  let mut run = 0;
  for c in text.chars() {
    if Some(c) == last {
      run += 1;
    } else {
      last = Some(c);
      run = 1;
    }
    if run >= limit {
      return true;
    }
  }
  false
}

// ─── Gates 5–8: collection scans ─────────────────────────────────────────────

/// Gates 5 through 8: the checks against the persisted collection and the
/// denylist.
/// Runs inside the same store transaction that will create the record.
pub fn check_against_collection(
  policy: &AdmissionPolicy,
  collection: &Collection,
  submitter_id: i64,
  text: &str,
  denylist: &[String],
) -> Option<RejectReason> {
  let folded = text.to_lowercase();

  for existing in collection.active() {
    let score = similarity::ratio(&folded, &existing.text.to_lowercase());
    if score > policy.similarity_threshold {
      return Some(RejectReason::NearDuplicate { existing: existing.text.clone() });
    }
  }

  if collection.pending_for(submitter_id) >= policy.pending_quota {
    return Some(RejectReason::QuotaExhausted { quota: policy.pending_quota });
  }

  let chars = text.chars().count();
  if chars < policy.min_chars || chars > policy.max_chars {
    return Some(RejectReason::OutOfBounds {
      min: policy.min_chars,
      max: policy.max_chars,
    });
  }

  if denylist
    .iter()
    .filter(|banned| !banned.is_empty())
    .any(|banned| folded.contains(&banned.to_lowercase()))
  {
    return Some(RejectReason::Denylisted);
  }

  None
}

// ─── Gates 3–4: throughput state ─────────────────────────────────────────────

/// SHA-256 hex digest of the case-folded, trimmed text, used as the
/// session-scoped exact-duplicate fingerprint.
pub fn fingerprint(text: &str) -> String {
  let digest = Sha256::digest(text.trim().to_lowercase().as_bytes());
  format!("{digest:x}")
}

/// One submitter's process-lifetime throughput state. Not persisted, so a
/// restart forgets it; the near-duplicate gate still checks stored records.
#[derive(Debug, Default)]
struct SubmitterState {
  last_accepted_at: Option<DateTime<Utc>>,
  fingerprints:     HashSet<String>,
}

/// Session-scoped rate-limit and exact-duplicate memory for all submitters.
#[derive(Debug, Default)]
pub struct ThroughputTracker {
  submitters: HashMap<i64, SubmitterState>,
}

impl ThroughputTracker {
  /// Gate 3: seconds the submitter still has to wait, if inside the
  /// cooldown window.
  pub fn rate_limit_hit(
    &self,
    submitter_id: i64,
    now: DateTime<Utc>,
    cooldown: Duration,
  ) -> Option<i64> {
    let last = self.submitters.get(&submitter_id)?.last_accepted_at?;
    let elapsed = now - last;
    if elapsed < cooldown {
      Some((cooldown - elapsed).num_seconds().max(1))
    } else {
      None
    }
  }

  /// Gate 4: has this submitter already had this exact text accepted during
  /// this process lifetime?
  pub fn is_duplicate(&self, submitter_id: i64, fingerprint: &str) -> bool {
    self
      .submitters
      .get(&submitter_id)
      .is_some_and(|s| s.fingerprints.contains(fingerprint))
  }

  /// Record an accepted submission. Callers invoke this only after the
  /// store write committed, so a failed write leaves the session memory
  /// untouched.
  pub fn record_accepted(
    &mut self,
    submitter_id: i64,
    fingerprint: String,
    now: DateTime<Utc>,
  ) {
    let state = self.submitters.entry(submitter_id).or_default();
    state.last_accepted_at = Some(now);
    state.fingerprints.insert(fingerprint);
  }
}
