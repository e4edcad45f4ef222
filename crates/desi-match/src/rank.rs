//! Best-match ranker: combines the three scorers with fixed weights and
//! picks the arg-max document.

use serde::Serialize;

use crate::{
  index::DocumentIndex,
  normalize::normalize,
  score::{edit_similarity, normalize_statistical, token_overlap},
  tokenize::tokenize,
};

pub const STATISTICAL_WEIGHT: f64 = 0.55;
pub const OVERLAP_WEIGHT: f64 = 0.25;
pub const EDIT_WEIGHT: f64 = 0.20;

/// Per-scorer breakdown of a combined score.
///
/// Serialised with the short keys clients already read (`tf`, `overlap`,
/// `lev`).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ComponentScores {
  #[serde(rename = "tf")]
  pub statistical: f64,
  pub overlap:     f64,
  #[serde(rename = "lev")]
  pub edit:        f64,
}

impl ComponentScores {
  pub fn combined(&self) -> f64 {
    STATISTICAL_WEIGHT * self.statistical
      + OVERLAP_WEIGHT * self.overlap
      + EDIT_WEIGHT * self.edit
  }
}

/// The winning document for a query.
#[derive(Debug, Clone, PartialEq)]
pub struct BestMatch {
  pub doc_index:  usize,
  pub combined:   f64,
  pub components: ComponentScores,
  pub owner_id:   String,
  pub doc_text:   String,
}

/// Score `raw_query` against every document and return the document with the
/// strictly greatest combined score; the first one wins ties.
///
/// Returns `None` when the index is empty or no document scores above zero.
pub fn find_best_match(index: &DocumentIndex, raw_query: &str) -> Option<BestMatch> {
  let query = normalize(raw_query);
  let query_tokens = tokenize(&query);
  let statistical = normalize_statistical(&index.tfidf().scores(&query));

  let mut best: Option<BestMatch> = None;
  let mut best_score = 0.0;

  for (i, doc) in index.documents().iter().enumerate() {
    let components = ComponentScores {
      statistical: statistical.get(i).copied().unwrap_or(0.0),
      overlap:     token_overlap(&query_tokens, index.tokens(i)),
      edit:        edit_similarity(&query, &doc.text),
    };
    let combined = components.combined();

    if combined > best_score {
      best_score = combined;
      best = Some(BestMatch {
        doc_index: i,
        combined,
        components,
        owner_id: doc.owner_id.clone(),
        doc_text: doc.text.clone(),
      });
    }
  }

  best
}
