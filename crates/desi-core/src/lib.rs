//! Core types and trait definitions for the Desi Food knowledge base.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

pub mod entry;
pub mod error;
pub mod store;

pub use entry::KbEntry;
pub use error::{Error, Result};
pub use store::KbStore;
