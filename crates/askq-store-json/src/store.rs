//! [`JsonStore`], the JSON-file implementation of [`SubmissionStore`].

use std::{
  io,
  path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tokio::{fs, sync::Mutex};

use askq_core::{
  store::{Mutation, SubmissionStore},
  submission::Collection,
};

use crate::{Error, Result};

/// Sibling document holding the banned-substring list.
#[derive(Debug, Default, Serialize, Deserialize)]
struct DenylistDoc {
  #[serde(default)]
  blacklist: Vec<String>,
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A submission store backed by one JSON document, with a sibling denylist
/// document and a `.bak` backup of the previous collection version.
///
/// The mutex serialises whole operations, not just file handles: an
/// [`update`](SubmissionStore::update) holds it from the read through the
/// write-back. Cross-process writers are not coordinated; last writer wins.
pub struct JsonStore {
  questions_path: PathBuf,
  denylist_path:  PathBuf,
  lock:           Mutex<()>,
}

impl JsonStore {
  /// A store over `questions_path` and `denylist_path`. Neither file needs
  /// to exist yet; missing documents read as empty.
  pub fn open(
    questions_path: impl Into<PathBuf>,
    denylist_path: impl Into<PathBuf>,
  ) -> Self {
    Self {
      questions_path: questions_path.into(),
      denylist_path:  denylist_path.into(),
      lock:           Mutex::new(()),
    }
  }

  /// Strict read: a corrupt document is an error here. Callers must hold
  /// the store lock.
  async fn load_locked(&self) -> Result<Collection> {
    let bytes = match fs::read(&self.questions_path).await {
      Ok(bytes) => bytes,
      Err(e) if e.kind() == io::ErrorKind::NotFound => {
        return Ok(Collection::default());
      }
      Err(e) => return Err(e.into()),
    };
    Ok(serde_json::from_slice(&bytes)?)
  }

  /// Write the collection, keeping the previous version as `.bak`. If the
  /// write fails, the backup is moved back into place before the error
  /// surfaces. Callers must hold the store lock.
  async fn persist_locked(&self, collection: &Collection) -> Result<()> {
    let body = serde_json::to_vec_pretty(collection)?;
    let backup = backup_path(&self.questions_path);

    let had_previous = fs::try_exists(&self.questions_path).await?;
    if had_previous {
      fs::rename(&self.questions_path, &backup).await?;
    }

    match fs::write(&self.questions_path, &body).await {
      Ok(()) => Ok(()),
      Err(e) => {
        if had_previous
          && fs::rename(&backup, &self.questions_path).await.is_err()
        {
          tracing::error!(
            path = %self.questions_path.display(),
            "failed to restore backup after write failure"
          );
        }
        Err(e.into())
      }
    }
  }
}

impl SubmissionStore for JsonStore {
  type Error = Error;

  async fn snapshot(&self) -> Result<Collection> {
    let _guard = self.lock.lock().await;
    match self.load_locked().await {
      Ok(collection) => Ok(collection),
      Err(Error::Corruption(e)) => {
        tracing::warn!(
          path = %self.questions_path.display(),
          error = %e,
          "store document is corrupt, reading as empty"
        );
        Ok(Collection::default())
      }
      Err(e) => Err(e),
    }
  }

  async fn replace(&self, collection: Collection) -> Result<()> {
    let _guard = self.lock.lock().await;
    self.persist_locked(&collection).await
  }

  async fn update<R, F>(&self, mutate: F) -> Result<R>
  where
    R: Send,
    F: FnOnce(&mut Collection) -> Mutation<R> + Send,
  {
    let _guard = self.lock.lock().await;
    let mut collection = self.load_locked().await?;
    match mutate(&mut collection) {
      Mutation::Commit(value) => {
        self.persist_locked(&collection).await?;
        Ok(value)
      }
      Mutation::Discard(value) => Ok(value),
    }
  }

  async fn denylist(&self) -> Result<Vec<String>> {
    let _guard = self.lock.lock().await;
    let bytes = match fs::read(&self.denylist_path).await {
      Ok(bytes) => bytes,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
      Err(e) => return Err(e.into()),
    };
    // A broken denylist disables filtering rather than blocking every
    // submission.
    match serde_json::from_slice::<DenylistDoc>(&bytes) {
      Ok(doc) => Ok(doc.blacklist),
      Err(e) => {
        tracing::warn!(
          path = %self.denylist_path.display(),
          error = %e,
          "denylist document is corrupt, ignoring it"
        );
        Ok(Vec::new())
      }
    }
  }
}

/// `questions.json` → `questions.json.bak`.
fn backup_path(path: &Path) -> PathBuf {
  let mut name = path.as_os_str().to_owned();
  name.push(".bak");
  PathBuf::from(name)
}
