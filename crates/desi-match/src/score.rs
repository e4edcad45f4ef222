//! The three per-document similarity scorers. Each returns a value in
//! `[0, 1]`.

use std::collections::HashSet;

/// Divide every raw corpus score by the largest one for this query.
///
/// When every score is zero the divisor is 1, so the result is all zeros.
pub fn normalize_statistical(raw: &[f64]) -> Vec<f64> {
  let max = raw.iter().copied().fold(0.0_f64, f64::max);
  let divisor = if max > 0.0 { max } else { 1.0 };
  raw.iter().map(|s| (s / divisor).clamp(0.0, 1.0)).collect()
}

/// `|query ∩ doc| / |query|` over stemmed token sets; 0 for an empty query.
pub fn token_overlap<S: AsRef<str>>(query: &[S], doc: &[S]) -> f64 {
  let query: HashSet<&str> = query.iter().map(AsRef::as_ref).collect();
  if query.is_empty() {
    return 0.0;
  }
  let doc: HashSet<&str> = doc.iter().map(AsRef::as_ref).collect();
  let shared = query.intersection(&doc).count();
  shared as f64 / query.len().max(1) as f64
}

/// `1 - levenshtein(a, b) / max(len(a), len(b))`, measured in characters.
///
/// Two empty strings are identical (1); one empty string matches nothing (0).
pub fn edit_similarity(a: &str, b: &str) -> f64 {
  match (a.is_empty(), b.is_empty()) {
    (true, true) => return 1.0,
    (true, false) | (false, true) => return 0.0,
    (false, false) => {}
  }
  let max_len = a.chars().count().max(b.chars().count());
  let distance = strsim::levenshtein(a, b);
  1.0 - distance as f64 / max_len as f64
}
