//! [`KbEntry`] — one curated question/answer record.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A knowledge-base entry: a set of question templates sharing one canned
/// answer.
///
/// `id` is unique across the in-memory collection once a write completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KbEntry {
  pub id:        String,
  #[serde(default)]
  pub templates: Vec<String>,
  #[serde(default)]
  pub answer:    String,
}

impl KbEntry {
  pub fn new(
    id: impl Into<String>,
    templates: Vec<String>,
    answer: impl Into<String>,
  ) -> Self {
    Self {
      id: id.into(),
      templates,
      answer: answer.into(),
    }
  }

  /// Reject entries that can never be addressed by id.
  pub fn validate(&self) -> Result<()> {
    if self.id.trim().is_empty() {
      return Err(Error::EmptyId);
    }
    Ok(())
  }

  /// The first `n` templates, used for listings.
  pub fn sample_templates(&self, n: usize) -> &[String] {
    &self.templates[..self.templates.len().min(n)]
  }

  /// Encode the templates as a JSON array string (storage column format).
  pub fn templates_json(&self) -> Result<String> {
    Ok(serde_json::to_string(&self.templates)?)
  }

  /// Decode a templates column previously produced by
  /// [`KbEntry::templates_json`].
  pub fn parse_templates(raw: &str) -> Result<Vec<String>> {
    if raw.trim().is_empty() {
      return Ok(Vec::new());
    }
    Ok(serde_json::from_str(raw)?)
  }
}
