//! The `KbStore` trait.
//!
//! The trait is implemented by persistence backends (`desi-store-file`,
//! `desi-store-sqlite`). The server depends on this abstraction, not on any
//! concrete backend; the backend is chosen once at startup.

use std::future::Future;

use crate::entry::KbEntry;

/// Abstraction over a knowledge-base persistence backend.
///
/// The in-memory collection is authoritative while the process runs; the
/// store only has to give it back on the next [`KbStore::load`].
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait KbStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Load every persisted entry, in insertion order.
  fn load(
    &self,
  ) -> impl Future<Output = Result<Vec<KbEntry>, Self::Error>> + Send + '_;

  /// Insert `entry`, or replace the persisted entry with the same id.
  fn upsert<'a>(
    &'a self,
    entry: &'a KbEntry,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
