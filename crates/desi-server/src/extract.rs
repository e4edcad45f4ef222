//! Request body extraction.
//!
//! Bodies are read as loose JSON and fields are picked out by hand, so a
//! field of the wrong type reads as absent instead of failing the request.
//! Anything unreadable becomes a 400 with a JSON error body.

use axum::{
  body::Bytes,
  extract::{FromRequest, Request},
};
use serde_json::Value;

use crate::error::ApiError;

/// A request body parsed as JSON, whatever its `Content-Type`. An empty
/// body reads as `null`.
pub struct JsonBody(pub Value);

impl<S> FromRequest<S> for JsonBody
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
    let bytes = Bytes::from_request(req, state)
      .await
      .map_err(|e| ApiError::bad_request(e.body_text()))?;

    if bytes.iter().all(u8::is_ascii_whitespace) {
      return Ok(JsonBody(Value::Null));
    }
    serde_json::from_slice(&bytes)
      .map(JsonBody)
      .map_err(|e| ApiError::bad_request(format!("invalid JSON body: {e}")))
  }
}

/// A string field; missing, `null` or non-string values read as `None`.
pub fn string_field(body: &Value, key: &str) -> Option<String> {
  body.get(key).and_then(Value::as_str).map(str::to_owned)
}

/// An array-of-strings field. Anything but an array reads as empty and
/// non-string items are skipped.
pub fn string_list(body: &Value, key: &str) -> Vec<String> {
  body
    .get(key)
    .and_then(Value::as_array)
    .map(|items| {
      items
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_owned)
        .collect()
    })
    .unwrap_or_default()
}
