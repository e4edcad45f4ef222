//! Admin handlers: `POST /api/kb/add` and `POST /api/kb/import`.
//!
//! Both require the admin key (see [`crate::auth`]) and answer only after
//! the store write and the index rebuild have finished. Store failures are
//! logged, not reported.

use axum::{Json, extract::State};
use desi_core::{KbEntry, KbStore};
use serde::Serialize;
use serde_json::Value;

use crate::{
  AppState,
  auth::Admin,
  error::ApiError,
  extract::{JsonBody, string_field, string_list},
  state::Draft,
};

// ─── Add ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct AddResponse {
  pub ok:    bool,
  pub added: KbEntry,
}

/// `POST /api/kb/add`
///
/// Body: `{"id"?, "questionTemplates"?, "answerText"}`. A non-array
/// `questionTemplates` counts as no templates.
pub async fn add<S>(
  _admin: Admin,
  State(state): State<AppState<S>>,
  JsonBody(body): JsonBody,
) -> Result<Json<AddResponse>, ApiError>
where
  S: KbStore + Clone + Send + Sync + 'static,
{
  let answer = string_field(&body, "answerText")
    .filter(|a| !a.is_empty())
    .ok_or_else(|| ApiError::bad_request("answerText required"))?;

  let added = state
    .kb
    .add(Draft {
      id:        string_field(&body, "id"),
      templates: string_list(&body, "questionTemplates"),
      answer,
    })
    .await;

  tracing::info!(id = %added.id, "kb entry added");
  Ok(Json(AddResponse { ok: true, added }))
}

// ─── Import ──────────────────────────────────────────────────────────────────

/// One `{id?, templates?, answer?}` import item; wrongly typed fields fall
/// back to their defaults.
fn draft_from_item(item: &Value) -> Draft {
  Draft {
    id:        string_field(item, "id"),
    templates: string_list(item, "templates"),
    answer:    string_field(item, "answer").unwrap_or_default(),
  }
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
  pub ok:    bool,
  pub count: usize,
}

/// `POST /api/kb/import` — replaces the whole KB.
pub async fn import<S>(
  _admin: Admin,
  State(state): State<AppState<S>>,
  JsonBody(body): JsonBody,
) -> Result<Json<ImportResponse>, ApiError>
where
  S: KbStore + Clone + Send + Sync + 'static,
{
  let items = body
    .as_array()
    .ok_or_else(|| ApiError::bad_request("expected array of Q&A"))?;

  let count = state
    .kb
    .import(items.iter().map(draft_from_item).collect())
    .await;

  tracing::info!(count, "kb imported");
  Ok(Json(ImportResponse { ok: true, count }))
}
