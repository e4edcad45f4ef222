//! `GET /api/answers` — public listing of the KB.

use axum::{Json, extract::State};
use desi_core::KbStore;
use serde::Serialize;

use crate::AppState;

const SAMPLE_QUESTIONS: usize = 3;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerSummary {
  pub id:               String,
  pub sample_questions: Vec<String>,
  pub answer:           String,
}

pub async fn list<S>(State(state): State<AppState<S>>) -> Json<Vec<AnswerSummary>>
where
  S: KbStore + Clone + Send + Sync + 'static,
{
  let kb = state.kb.snapshot().await;
  let summaries = kb
    .entries()
    .iter()
    .map(|e| AnswerSummary {
      id:               e.id.clone(),
      sample_questions: e.sample_templates(SAMPLE_QUESTIONS).to_vec(),
      answer:           e.answer.clone(),
    })
    .collect();
  Json(summaries)
}
