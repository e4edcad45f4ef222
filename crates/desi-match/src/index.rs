//! Scoring documents and the TF-IDF corpus model built over them.
//!
//! Every KB entry contributes one document per question template plus one
//! for its answer when the normalised answer is longer than 3 characters.
//! The index is always rebuilt from scratch; there is no incremental update.

use std::collections::HashMap;

use desi_core::KbEntry;

use crate::{normalize::normalize, tokenize};

/// Answers whose normalised form is this short or shorter are not indexed.
const MIN_ANSWER_CHARS: usize = 3;

/// English function words left out of the corpus model. Single letters and
/// digits are dropped as well.
const STOP_WORDS: &[&str] = &[
  "about", "above", "after", "again", "all", "also", "am", "an", "and", "another", "any", "are",
  "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
  "by", "came", "can", "cannot", "come", "could", "did", "do", "does", "doing", "during",
  "each", "few", "for", "from", "further", "get", "got", "has", "had", "he", "have", "her",
  "here", "him", "himself", "his", "how", "if", "in", "into", "is", "it", "its", "itself",
  "like", "make", "many", "me", "might", "more", "most", "much", "must", "my", "myself",
  "never", "now", "of", "on", "only", "or", "other", "our", "ours", "ourselves", "out", "over",
  "own", "said", "same", "see", "should", "since", "so", "some", "still", "such", "take",
  "than", "that", "the", "their", "theirs", "them", "themselves", "then", "there", "these",
  "they", "this", "those", "through", "to", "too", "under", "until", "up", "very", "was",
  "way", "we", "well", "were", "what", "where", "when", "which", "while", "who", "whom",
  "with", "would", "why", "you", "your", "yours", "yourself",
];

pub fn is_stop_word(term: &str) -> bool {
  term.chars().count() < 2 || STOP_WORDS.contains(&term)
}

// ─── Documents ───────────────────────────────────────────────────────────────

/// One scoring document, tagged with the id of the entry that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
  pub owner_id: String,
  /// Normalised text.
  pub text:     String,
}

// ─── Corpus model ────────────────────────────────────────────────────────────

/// Term-frequency/inverse-document-frequency model over unstemmed words.
///
/// Stop words are never counted, so they contribute nothing to any score.
/// `tf` is the raw count of a term in a document and
/// `idf = 1 + ln(N / (1 + df))`; a query's score against a document is the
/// sum of `tf * idf` over the query's terms, repeats included.
#[derive(Debug, Clone, Default)]
pub struct TfIdf {
  term_counts: Vec<HashMap<String, u32>>,
  doc_freq:    HashMap<String, usize>,
}

impl TfIdf {
  pub fn new<'a>(texts: impl IntoIterator<Item = &'a str>) -> Self {
    let mut model = Self::default();
    for text in texts {
      let mut counts: HashMap<String, u32> = HashMap::new();
      for word in tokenize::words(text) {
        let term = word.to_ascii_lowercase();
        if !is_stop_word(&term) {
          *counts.entry(term).or_insert(0) += 1;
        }
      }
      for term in counts.keys() {
        *model.doc_freq.entry(term.clone()).or_insert(0) += 1;
      }
      model.term_counts.push(counts);
    }
    model
  }

  pub fn len(&self) -> usize {
    self.term_counts.len()
  }

  pub fn is_empty(&self) -> bool {
    self.term_counts.is_empty()
  }

  pub fn idf(&self, term: &str) -> f64 {
    let df = self.doc_freq.get(term).copied().unwrap_or(0);
    1.0 + (self.len() as f64 / (1 + df) as f64).ln()
  }

  /// Raw score of `query` against the document at `doc`.
  pub fn score(&self, query: &str, doc: usize) -> f64 {
    let Some(counts) = self.term_counts.get(doc) else {
      return 0.0;
    };
    tokenize::words(query)
      .map(|w| w.to_ascii_lowercase())
      .map(|term| {
        let tf = counts.get(&term).copied().unwrap_or(0) as f64;
        tf * self.idf(&term)
      })
      .sum()
  }

  /// Raw scores of `query` against every document, in document order.
  pub fn scores(&self, query: &str) -> Vec<f64> {
    (0..self.len()).map(|i| self.score(query, i)).collect()
  }
}

// ─── Index ───────────────────────────────────────────────────────────────────

/// The flattened document set, the stemmed tokens of each document, and the
/// corpus model over the same ordering.
#[derive(Debug, Clone, Default)]
pub struct DocumentIndex {
  documents:  Vec<Document>,
  doc_tokens: Vec<Vec<String>>,
  tfidf:      TfIdf,
}

impl DocumentIndex {
  pub fn build(entries: &[KbEntry]) -> Self {
    let mut documents = Vec::new();
    for entry in entries {
      for template in &entry.templates {
        documents.push(Document {
          owner_id: entry.id.clone(),
          text:     normalize(template),
        });
      }
      let answer = normalize(&entry.answer);
      if answer.chars().count() > MIN_ANSWER_CHARS {
        documents.push(Document {
          owner_id: entry.id.clone(),
          text:     answer,
        });
      }
    }

    let doc_tokens = documents.iter().map(|d| tokenize::tokenize(&d.text)).collect();
    let tfidf = TfIdf::new(documents.iter().map(|d| d.text.as_str()));

    tracing::info!(docs = documents.len(), "kb index rebuilt");

    Self {
      documents,
      doc_tokens,
      tfidf,
    }
  }

  pub fn documents(&self) -> &[Document] {
    &self.documents
  }

  pub fn document(&self, idx: usize) -> Option<&Document> {
    self.documents.get(idx)
  }

  pub fn tokens(&self, idx: usize) -> &[String] {
    self.doc_tokens.get(idx).map(Vec::as_slice).unwrap_or(&[])
  }

  pub fn tfidf(&self) -> &TfIdf {
    &self.tfidf
  }

  pub fn len(&self) -> usize {
    self.documents.len()
  }

  pub fn is_empty(&self) -> bool {
    self.documents.is_empty()
  }
}
