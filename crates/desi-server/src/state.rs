//! [`KbState`] — the process-wide KB collection and its index.
//!
//! Readers take an `Arc` of the current [`KbSnapshot`] and release the lock
//! at once, so a chat request sees either the collection before a write or
//! the one after it, never a mix. Writers are serialised by a separate mutex
//! held across the whole add/import: build entries, persist, rebuild the
//! index, swap.

use std::{collections::HashSet, sync::Arc};

use chrono::Utc;
use desi_core::{KbEntry, KbStore};
use desi_match::KbSnapshot;
use tokio::sync::{Mutex, RwLock};

/// An entry as submitted by an admin, before an id is assigned.
#[derive(Debug, Clone, Default)]
pub struct Draft {
  pub id:        Option<String>,
  pub templates: Vec<String>,
  pub answer:    String,
}

pub struct KbState<S> {
  store:   S,
  current: RwLock<Arc<KbSnapshot>>,
  write:   Mutex<()>,
}

impl<S: KbStore> KbState<S> {
  /// Serve `entries` from memory, persisting future writes to `store`.
  pub fn new(store: S, entries: Vec<KbEntry>) -> Self {
    Self {
      store,
      current: RwLock::new(Arc::new(KbSnapshot::build(entries))),
      write: Mutex::new(()),
    }
  }

  /// Load the initial collection from `store`. A failing load is logged and
  /// the service starts with an empty KB.
  pub async fn load(store: S) -> Self {
    let entries = match store.load().await {
      Ok(entries) => entries,
      Err(e) => {
        tracing::warn!(error = %e, "failed to load kb, starting empty");
        Vec::new()
      }
    };
    tracing::info!(entries = entries.len(), "kb loaded");
    Self::new(store, entries)
  }

  pub fn store(&self) -> &S {
    &self.store
  }

  /// The current snapshot.
  pub async fn snapshot(&self) -> Arc<KbSnapshot> {
    self.current.read().await.clone()
  }

  /// Add one entry, or replace the entry with the same id in place.
  pub async fn add(&self, draft: Draft) -> KbEntry {
    let _writer = self.write.lock().await;
    let current = self.snapshot().await;

    let id = match non_blank(draft.id) {
      Some(id) => id,
      None => unique_id(Utc::now().timestamp_millis(), |c| current.contains(c)),
    };
    let entry = KbEntry::new(id, draft.templates, draft.answer);

    self.persist(&entry).await;

    let mut entries = current.entries().to_vec();
    match entries.iter_mut().find(|e| e.id == entry.id) {
      Some(existing) => *existing = entry.clone(),
      None => entries.push(entry.clone()),
    }
    self.swap(KbSnapshot::build(entries)).await;

    entry
  }

  /// Replace the whole collection with `drafts`. Returns the number of
  /// entries now served.
  pub async fn import(&self, drafts: Vec<Draft>) -> usize {
    let _writer = self.write.lock().await;

    let base = Utc::now().timestamp_millis();
    let mut taken: HashSet<String> = drafts
      .iter()
      .filter_map(|d| d.id.as_deref())
      .filter(|id| !id.trim().is_empty())
      .map(str::to_owned)
      .collect();

    let entries: Vec<KbEntry> = drafts
      .into_iter()
      .enumerate()
      .map(|(i, draft)| {
        let id = match non_blank(draft.id) {
          Some(id) => id,
          None => {
            let id = unique_id(base + i as i64, |c| taken.contains(c));
            taken.insert(id.clone());
            id
          }
        };
        KbEntry::new(id, draft.templates, draft.answer)
      })
      .collect();

    let next = KbSnapshot::build(entries);
    for entry in next.entries() {
      self.persist(entry).await;
    }
    let count = next.len();
    self.swap(next).await;

    count
  }

  async fn persist(&self, entry: &KbEntry) {
    if let Err(e) = self.store.upsert(entry).await {
      tracing::error!(error = %e, id = %entry.id, "failed to persist kb entry");
    }
  }

  async fn swap(&self, next: KbSnapshot) {
    *self.current.write().await = Arc::new(next);
  }
}

fn non_blank(id: Option<String>) -> Option<String> {
  id.filter(|id| !id.trim().is_empty())
}

/// `kb_<n>` for the first `n >= start` that is not taken.
fn unique_id(start: i64, taken: impl Fn(&str) -> bool) -> String {
  let mut n = start;
  loop {
    let candidate = format!("kb_{n}");
    if !taken(&candidate) {
      return candidate;
    }
    n += 1;
  }
}
