//! `POST /api/chat`.

use axum::{Json, extract::State};
use chrono::{Local, NaiveDate};
use desi_core::KbStore;
use desi_match::{KbSnapshot, Reply, dialogue::Dialogue};

use crate::{
  AppState,
  error::ApiError,
  extract::{JsonBody, string_field},
};

/// `POST /api/chat`
///
/// Body: `{"message": "..."}`. Clients may also send `conversationHistory`;
/// it is accepted and ignored.
pub async fn handler<S>(
  State(state): State<AppState<S>>,
  JsonBody(body): JsonBody,
) -> Result<Json<Reply>, ApiError>
where
  S: KbStore + Clone + Send + Sync + 'static,
{
  let message = string_field(&body, "message")
    .filter(|m| !m.is_empty())
    .ok_or_else(|| ApiError::bad_request("message required"))?;

  let kb = state.kb.snapshot().await;
  let dialogue = Dialogue::new(state.config.match_threshold);
  Ok(Json(answer(&dialogue, &kb, &message, Local::now().date_naive())))
}

fn answer(dialogue: &Dialogue, kb: &KbSnapshot, message: &str, today: NaiveDate) -> Reply {
  let mut rng = rand::rng();
  dialogue.route(kb, message, today, &mut rng)
}
