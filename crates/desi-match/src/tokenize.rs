//! Word splitting and stemming.

use std::sync::LazyLock;

use rust_stemmers::{Algorithm, Stemmer};

static STEMMER: LazyLock<Stemmer> =
  LazyLock::new(|| Stemmer::create(Algorithm::English));

/// Split text into word tokens on every run of characters outside
/// `[A-Za-z0-9_]`. Apostrophes split too (`don't` → `don`, `t`).
pub fn words(text: &str) -> impl Iterator<Item = &str> {
  text
    .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
    .filter(|w| !w.is_empty())
}

/// Tokenize already-normalised text and reduce every token to its stem, so
/// that `shipping`, `ships` and `shipped` compare equal.
pub fn tokenize(normalized: &str) -> Vec<String> {
  words(normalized)
    .map(|w| STEMMER.stem(&w.to_ascii_lowercase()).into_owned())
    .collect()
}
