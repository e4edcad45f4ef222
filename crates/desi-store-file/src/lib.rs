//! Flat-file backend for the knowledge-base store.
//!
//! The whole KB lives in one pretty-printed JSON array (conventionally
//! `kb.json`), the same shape `/api/kb/import` accepts.

pub mod error;
mod store;

pub use error::{Error, Result};
pub use store::JsonFileStore;
