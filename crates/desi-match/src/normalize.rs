//! Text normalisation shared by every matching stage.

/// Lowercase `text`, blank out everything except ASCII letters, digits,
/// whitespace and apostrophes, then collapse whitespace runs to one space.
///
/// Idempotent: `normalize(&normalize(s)) == normalize(s)`.
pub fn normalize(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  let mut pending_space = false;

  for c in text.chars().flat_map(char::to_lowercase) {
    let keep = c.is_ascii_lowercase() || c.is_ascii_digit() || c == '\'';
    if keep {
      if pending_space && !out.is_empty() {
        out.push(' ');
      }
      pending_space = false;
      out.push(c);
    } else {
      pending_space = true;
    }
  }

  out
}
