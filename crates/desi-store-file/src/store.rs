//! [`JsonFileStore`] — the JSON-file implementation of [`KbStore`].

use std::{
  io::ErrorKind,
  path::{Path, PathBuf},
  sync::Arc,
};

use desi_core::{KbEntry, KbStore};
use tokio::sync::Mutex;

use crate::{Error, Result};

/// A knowledge-base store backed by a single JSON file.
///
/// Writes are read-modify-write of the whole file and are serialised through
/// an async mutex shared by all clones.
#[derive(Clone)]
pub struct JsonFileStore {
  path:  PathBuf,
  write: Arc<Mutex<()>>,
}

impl JsonFileStore {
  /// Use the file at `path`. The file is created on first write.
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self {
      path:  path.into(),
      write: Arc::new(Mutex::new(())),
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  async fn read_all(&self) -> Result<Vec<KbEntry>> {
    let raw = match tokio::fs::read_to_string(&self.path).await {
      Ok(raw) => raw,
      Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
      Err(source) => {
        return Err(Error::Io {
          path: self.path.clone(),
          source,
        });
      }
    };
    if raw.trim().is_empty() {
      return Ok(Vec::new());
    }
    serde_json::from_str(&raw).map_err(|source| Error::Json {
      path: self.path.clone(),
      source,
    })
  }

  async fn write_all(&self, entries: &[KbEntry]) -> Result<()> {
    let json = serde_json::to_string_pretty(entries).map_err(|source| Error::Json {
      path: self.path.clone(),
      source,
    })?;
    tokio::fs::write(&self.path, json)
      .await
      .map_err(|source| Error::Io {
        path: self.path.clone(),
        source,
      })
  }
}

// ─── KbStore impl ────────────────────────────────────────────────────────────

impl KbStore for JsonFileStore {
  type Error = Error;

  async fn load(&self) -> Result<Vec<KbEntry>> {
    let entries = self.read_all().await?;
    tracing::debug!(count = entries.len(), path = ?self.path, "loaded kb file");
    Ok(entries)
  }

  async fn upsert(&self, entry: &KbEntry) -> Result<()> {
    entry.validate()?;

    let _guard = self.write.lock().await;
    let mut entries = self.read_all().await?;
    match entries.iter_mut().find(|e| e.id == entry.id) {
      Some(existing) => *existing = entry.clone(),
      None => entries.push(entry.clone()),
    }
    self.write_all(&entries).await
  }
}
