//! Error types for `desi-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("kb entry id must not be empty")]
  EmptyId,

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
