//! Decoding from SQLite rows to [`KbEntry`].

use desi_core::KbEntry;

use crate::Result;

/// Raw strings read directly from a `kb` row.
pub struct RawEntry {
  pub id:        String,
  pub templates: String,
  pub answer:    String,
}

impl RawEntry {
  pub fn into_entry(self) -> Result<KbEntry> {
    Ok(KbEntry {
      id:        self.id,
      templates: KbEntry::parse_templates(&self.templates)?,
      answer:    self.answer,
    })
  }
}
