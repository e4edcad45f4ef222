//! [`KbSnapshot`] — an immutable KB collection paired with its index.

use std::collections::HashMap;

use desi_core::KbEntry;

use crate::{
  index::DocumentIndex,
  rank::{BestMatch, find_best_match},
};

/// The KB entries and the document index derived from exactly those entries.
///
/// Never mutated after [`KbSnapshot::build`]; a write produces a new snapshot
/// which replaces the old one wholesale, so readers always see a consistent
/// pair.
#[derive(Debug, Clone, Default)]
pub struct KbSnapshot {
  entries: Vec<KbEntry>,
  by_id:   HashMap<String, usize>,
  index:   DocumentIndex,
}

impl KbSnapshot {
  /// Take ownership of `entries` and rebuild the full index over them.
  ///
  /// Later entries with an id already seen replace the earlier one in place.
  pub fn build(entries: Vec<KbEntry>) -> Self {
    let mut unique: Vec<KbEntry> = Vec::with_capacity(entries.len());
    let mut by_id: HashMap<String, usize> = HashMap::new();
    for entry in entries {
      match by_id.get(&entry.id) {
        Some(&pos) => unique[pos] = entry,
        None => {
          by_id.insert(entry.id.clone(), unique.len());
          unique.push(entry);
        }
      }
    }

    let index = DocumentIndex::build(&unique);
    Self {
      entries: unique,
      by_id,
      index,
    }
  }

  pub fn entries(&self) -> &[KbEntry] {
    &self.entries
  }

  pub fn get(&self, id: &str) -> Option<&KbEntry> {
    self.by_id.get(id).map(|&pos| &self.entries[pos])
  }

  pub fn contains(&self, id: &str) -> bool {
    self.by_id.contains_key(id)
  }

  pub fn index(&self) -> &DocumentIndex {
    &self.index
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn best_match(&self, raw_query: &str) -> Option<BestMatch> {
    find_best_match(&self.index, raw_query)
  }
}
