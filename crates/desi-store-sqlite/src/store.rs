//! [`SqliteStore`] — the SQLite implementation of [`KbStore`].

use std::path::Path;

use desi_core::{KbEntry, KbStore};

use crate::{
  Result,
  encode::RawEntry,
  schema::SCHEMA,
};

/// A knowledge-base store backed by a single SQLite table.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Number of persisted entries.
  pub async fn count(&self) -> Result<usize> {
    let n: i64 = self
      .conn
      .call(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM kb", [], |r| r.get(0))?))
      .await?;
    Ok(usize::try_from(n).unwrap_or_default())
  }
}

// ─── KbStore impl ────────────────────────────────────────────────────────────

impl KbStore for SqliteStore {
  type Error = crate::Error;

  async fn load(&self) -> Result<Vec<KbEntry>> {
    let raws: Vec<RawEntry> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT id, templates, answer FROM kb ORDER BY rowid")?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawEntry {
              id:        row.get(0)?,
              templates: row.get(1)?,
              answer:    row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let entries = raws
      .into_iter()
      .map(RawEntry::into_entry)
      .collect::<Result<Vec<_>>>()?;
    tracing::debug!(count = entries.len(), "loaded kb from sqlite");
    Ok(entries)
  }

  async fn upsert(&self, entry: &KbEntry) -> Result<()> {
    entry.validate()?;

    let id        = entry.id.clone();
    let templates = entry.templates_json()?;
    let answer    = entry.answer.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO kb (id, templates, answer) VALUES (?1, ?2, ?3)
           ON CONFLICT(id) DO UPDATE SET
             templates = excluded.templates,
             answer    = excluded.answer",
          rusqlite::params![id, templates, answer],
        )?;
        Ok(())
      })
      .await?;

    Ok(())
  }
}
