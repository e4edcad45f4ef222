//! HTTP layer for the Desi Food support bot.
//!
//! Exposes an axum [`Router`] serving the chat and KB endpoints, backed by
//! any [`KbStore`].

pub mod auth;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod state;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  http::HeaderValue,
  routing::{get, post},
};
use desi_core::KbStore;
use desi_match::dialogue::DEFAULT_THRESHOLD;
use serde::Deserialize;
use tower_http::{
  cors::{AllowOrigin, Any, CorsLayer},
  services::ServeDir,
  trace::TraceLayer,
};

use auth::AdminAuth;
use state::KbState;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Which persistence backend holds the KB.
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
  /// A JSON array file.
  #[default]
  File,
  /// A SQLite database with a `kb` table.
  Sqlite,
}

/// Runtime server configuration, deserialised from `config.toml` and
/// `DESI_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:            String,
  #[serde(default = "default_port")]
  pub port:            u16,
  #[serde(default)]
  pub store_backend:   StoreBackend,
  #[serde(default = "default_store_path")]
  pub store_path:      PathBuf,
  /// argon2 PHC hash of the admin key. Unset rejects all admin requests.
  #[serde(default)]
  pub admin_key_hash:  Option<String>,
  /// CORS origins; empty allows any origin.
  #[serde(default)]
  pub allowed_origins: Vec<String>,
  /// Directory served for every path outside `/api`.
  #[serde(default)]
  pub static_dir:      Option<PathBuf>,
  #[serde(default = "default_threshold")]
  pub match_threshold: f64,
}

fn default_host() -> String { "0.0.0.0".to_string() }

fn default_port() -> u16 { 3000 }

fn default_store_path() -> PathBuf { PathBuf::from("kb.json") }

fn default_threshold() -> f64 { DEFAULT_THRESHOLD }

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:            default_host(),
      port:            default_port(),
      store_backend:   StoreBackend::default(),
      store_path:      default_store_path(),
      admin_key_hash:  None,
      allowed_origins: Vec::new(),
      static_dir:      None,
      match_threshold: default_threshold(),
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: KbStore> {
  pub kb:     Arc<KbState<S>>,
  pub config: Arc<ServerConfig>,
  pub auth:   Arc<AdminAuth>,
}

impl<S: KbStore> AppState<S> {
  pub fn new(kb: KbState<S>, config: ServerConfig) -> Self {
    Self {
      kb:     Arc::new(kb),
      auth:   Arc::new(AdminAuth::new(config.admin_key_hash.clone())),
      config: Arc::new(config),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build an axum [`Router`] for the bot.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: KbStore + Clone + Send + Sync + 'static,
{
  let cors = cors_layer(&state.config.allowed_origins);
  let static_dir = state.config.static_dir.clone();

  let api = Router::new()
    .route("/api/chat",      post(handlers::chat::handler::<S>))
    .route("/api/kb/add",    post(handlers::kb::add::<S>))
    .route("/api/kb/import", post(handlers::kb::import::<S>))
    .route("/api/answers",   get(handlers::answers::list::<S>))
    .with_state(state);

  let app = match static_dir {
    Some(dir) => api.fallback_service(ServeDir::new(dir)),
    None => api,
  };

  app.layer(cors).layer(TraceLayer::new_for_http())
}

/// CORS for the configured origins; an empty list allows any origin.
fn cors_layer(origins: &[String]) -> CorsLayer {
  let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
  if origins.is_empty() {
    return layer.allow_origin(Any);
  }

  let allowed: Vec<HeaderValue> = origins
    .iter()
    .filter_map(|o| match HeaderValue::from_str(o.trim()) {
      Ok(v) => Some(v),
      Err(_) => {
        tracing::warn!(origin = %o, "ignoring invalid CORS origin");
        None
      }
    })
    .collect();
  layer.allow_origin(AllowOrigin::list(allowed))
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use desi_core::KbEntry;
  use desi_store_sqlite::SqliteStore;
  use rand_core::OsRng;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  const ADMIN_KEY: &str = "open-sesame";

  fn hash(secret: &str) -> String {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
      .hash_password(secret.as_bytes(), &salt)
      .unwrap()
      .to_string()
  }

  fn seed() -> Vec<KbEntry> {
    vec![
      KbEntry::new(
        "greeting",
        vec!["hi".into(), "hello".into()],
        "Namaste! How can I help you today?",
      ),
      KbEntry::new(
        "shipping_cost",
        vec!["how much is shipping".into()],
        "Shipping is free on orders above $50.",
      ),
    ]
  }

  async fn make_state(key_hash: Option<String>) -> AppState<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    AppState::new(KbState::new(store, seed()), ServerConfig {
      admin_key_hash: key_hash,
      ..ServerConfig::default()
    })
  }

  async fn admin_state() -> AppState<SqliteStore> {
    make_state(Some(hash(ADMIN_KEY))).await
  }

  async fn call<S>(
    state: AppState<S>,
    method: &str,
    uri: &str,
    admin: Option<&str>,
    body: Option<Value>,
  ) -> (StatusCode, Value)
  where
    S: KbStore + Clone + Send + Sync + 'static,
  {
    let mut builder = Request::builder()
      .method(method)
      .uri(uri)
      .header(header::CONTENT_TYPE, "application/json");
    if let Some(key) = admin {
      builder = builder.header(auth::ADMIN_KEY_HEADER, key);
    }
    let body = body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty);
    let resp = router(state).oneshot(builder.body(body).unwrap()).await.unwrap();

    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
  }

  async fn chat<S>(state: AppState<S>, message: &str) -> Value
  where
    S: KbStore + Clone + Send + Sync + 'static,
  {
    let (status, body) =
      call(state, "POST", "/api/chat", None, Some(json!({ "message": message }))).await;
    assert_eq!(status, StatusCode::OK);
    body
  }

  // ── Chat ─────────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn chat_without_message_is_400() {
    let state = admin_state().await;
    let (status, body) =
      call(state, "POST", "/api/chat", None, Some(json!({ "conversationHistory": [] }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "message required");
  }

  #[tokio::test]
  async fn chat_intent_answer_reports_matched_id() {
    let state = admin_state().await;
    let body = chat(state, "how much is delivery fee").await;
    assert_eq!(body["reply"], "Shipping is free on orders above $50.");
    assert_eq!(body["matched"], "shipping_cost");
    assert!(body.get("debug").is_none());
  }

  #[tokio::test]
  async fn chat_order_id_is_extracted() {
    let state = admin_state().await;
    let body = chat(state.clone(), "where is my order ORD-123").await;
    assert_eq!(
      body["reply"],
      "Order ORD123 is currently: Demo status (replace with real lookup)."
    );
    let body = chat(state, "where is my order").await;
    assert_eq!(
      body["reply"],
      "Please provide your order id (e.g., ORD123) so I can check tracking."
    );
  }

  #[tokio::test]
  async fn chat_accepts_conversation_history() {
    let state = admin_state().await;
    let (status, body) = call(
      state,
      "POST",
      "/api/chat",
      None,
      Some(json!({ "message": "hello", "conversationHistory": [{ "role": "user" }] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["matched"], "greeting");
  }

  #[tokio::test]
  async fn chat_with_non_string_message_is_400() {
    let state = admin_state().await;
    let (status, body) =
      call(state, "POST", "/api/chat", None, Some(json!({ "message": 42 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "message required");
  }

  #[tokio::test]
  async fn chat_reads_json_without_a_content_type() {
    let state = admin_state().await;
    let req = Request::builder()
      .method("POST")
      .uri("/api/chat")
      .body(Body::from(json!({ "message": "hello" }).to_string()))
      .unwrap();
    let resp = router(state).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["matched"], "greeting");
  }

  #[tokio::test]
  async fn malformed_json_is_400_with_an_error_body() {
    let state = admin_state().await;
    let req = Request::builder()
      .method("POST")
      .uri("/api/chat")
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from("{\"message\": "))
      .unwrap();
    let resp = router(state).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["error"].as_str().unwrap().starts_with("invalid JSON body"));
  }

  #[tokio::test]
  async fn empty_chat_body_is_message_required() {
    let state = admin_state().await;
    let (status, body) = call(state, "POST", "/api/chat", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "message required");
  }

  // ── Admin auth ───────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn add_without_key_is_401_and_kb_unchanged() {
    let state = admin_state().await;
    let (status, body) = call(
      state.clone(),
      "POST",
      "/api/kb/add",
      None,
      Some(json!({ "answerText": "sneaky" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized: missing or invalid x-admin-key header");
    assert_eq!(state.kb.snapshot().await.len(), 2);
  }

  #[tokio::test]
  async fn add_with_wrong_key_is_401() {
    let state = admin_state().await;
    let (status, _) = call(
      state,
      "POST",
      "/api/kb/add",
      Some("wrong"),
      Some(json!({ "answerText": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn unconfigured_key_rejects_even_a_supplied_key() {
    let state = make_state(None).await;
    let (status, _) = call(
      state.clone(),
      "POST",
      "/api/kb/import",
      Some(ADMIN_KEY),
      Some(json!([])),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(state.kb.snapshot().await.len(), 2);
  }

  // ── Add ──────────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn add_requires_answer_text() {
    let state = admin_state().await;
    let (status, body) = call(
      state,
      "POST",
      "/api/kb/add",
      Some(ADMIN_KEY),
      Some(json!({ "id": "x", "questionTemplates": ["q"] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "answerText required");
  }

  #[tokio::test]
  async fn add_persists_rebuilds_and_answers() {
    let state = admin_state().await;
    let (status, body) = call(
      state.clone(),
      "POST",
      "/api/kb/add",
      Some(ADMIN_KEY),
      Some(json!({
        "questionTemplates": ["can i get a recipe for biryani"],
        "answerText": "Try our recipe blog for biryani ideas."
      })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    let id = body["added"]["id"].as_str().unwrap().to_string();
    assert!(id.starts_with("kb_"), "id: {id}");
    assert_eq!(body["added"]["templates"][0], "can i get a recipe for biryani");

    let persisted = state.kb.store().load().await.unwrap();
    assert!(persisted.iter().any(|e| e.id == id));

    let reply = chat(state, "can i get a recipe for biryani").await;
    assert_eq!(reply["reply"], "Try our recipe blog for biryani ideas.");
    assert!(reply["debug"]["score"].as_f64().unwrap() >= 0.44);
  }

  #[tokio::test]
  async fn add_treats_non_array_templates_as_none() {
    let state = admin_state().await;
    let (status, body) = call(
      state.clone(),
      "POST",
      "/api/kb/add",
      Some(ADMIN_KEY),
      Some(json!({ "id": "purity", "questionTemplates": "is ghee pure", "answerText": "yes" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["added"]["templates"], json!([]));
    assert_eq!(state.kb.snapshot().await.get("purity").unwrap().answer, "yes");
  }

  // ── Import ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn import_requires_an_array() {
    let state = admin_state().await;
    let (status, body) = call(
      state,
      "POST",
      "/api/kb/import",
      Some(ADMIN_KEY),
      Some(json!({ "id": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "expected array of Q&A");
  }

  #[tokio::test]
  async fn import_replaces_kb_and_exact_template_matches() {
    let state = admin_state().await;
    let items = json!([
      { "id": "recipes", "templates": ["can i get a recipe for biryani"], "answer": "See our recipe blog." },
      { "templates": ["what time does the kitchen open"], "answer": "Our kitchen opens at 9am." },
      { "id": "empty" }
    ]);
    let (status, body) =
      call(state.clone(), "POST", "/api/kb/import", Some(ADMIN_KEY), Some(items)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true, "count": 3 }));

    let (_, answers) = call(state.clone(), "GET", "/api/answers", None, None).await;
    let answers = answers.as_array().unwrap();
    assert_eq!(answers.len(), 3);
    assert!(answers.iter().all(|a| a["id"] != "greeting"));

    let reply = chat(state.clone(), "what time does the kitchen open").await;
    assert_eq!(reply["reply"], "Our kitchen opens at 9am.");
    assert_eq!(reply["debug"]["matchedTemplate"], "what time does the kitchen open");
    assert!(reply["debug"]["score"].as_f64().unwrap() >= 0.44);
    assert!(reply["debug"]["components"]["overlap"].as_f64().unwrap() > 0.99);

    // the old greeting entry is gone, so the intent path has nothing to serve
    let reply = chat(state, "hello").await;
    assert!(reply.get("matched").is_none());
  }

  #[tokio::test]
  async fn import_items_with_wrong_field_types_use_defaults() {
    let state = admin_state().await;
    let items = json!([
      { "id": 5, "templates": "one question", "answer": ["not", "text"] },
      "not even an object"
    ]);
    let (status, body) =
      call(state.clone(), "POST", "/api/kb/import", Some(ADMIN_KEY), Some(items)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);

    let snap = state.kb.snapshot().await;
    assert!(snap.entries().iter().all(|e| e.id.starts_with("kb_")));
    assert!(snap.entries().iter().all(|e| e.templates.is_empty() && e.answer.is_empty()));
  }

  // ── Answers ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn answers_lists_up_to_three_samples() {
    let state = make_state(None).await;
    state
      .kb
      .add(state::Draft {
        id:        Some("many".into()),
        templates: (1..=5).map(|i| format!("question {i}")).collect(),
        answer:    "lots".into(),
      })
      .await;

    let (status, body) = call(state, "GET", "/api/answers", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let many = body
      .as_array()
      .unwrap()
      .iter()
      .find(|a| a["id"] == "many")
      .unwrap()
      .clone();
    assert_eq!(
      many["sampleQuestions"],
      json!(["question 1", "question 2", "question 3"])
    );
    assert_eq!(many["answer"], "lots");
  }

  // ── Persistence failures ─────────────────────────────────────────────────────

  #[derive(Debug, thiserror::Error)]
  #[error("store offline")]
  struct Offline;

  /// Fails every load and write.
  #[derive(Clone)]
  struct OfflineStore;

  impl KbStore for OfflineStore {
    type Error = Offline;

    async fn load(&self) -> Result<Vec<KbEntry>, Offline> {
      Err(Offline)
    }

    async fn upsert(&self, _: &KbEntry) -> Result<(), Offline> {
      Err(Offline)
    }
  }

  #[tokio::test]
  async fn failed_persistence_still_serves_the_new_entry() {
    let kb = KbState::load(OfflineStore).await;
    assert!(kb.snapshot().await.is_empty());

    let state = AppState::new(kb, ServerConfig {
      admin_key_hash: Some(hash(ADMIN_KEY)),
      ..ServerConfig::default()
    });
    let (status, body) = call(
      state.clone(),
      "POST",
      "/api/kb/add",
      Some(ADMIN_KEY),
      Some(json!({
        "id": "recipes",
        "questionTemplates": ["can i get a recipe for biryani"],
        "answerText": "See our recipe blog."
      })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["added"]["id"], "recipes");

    let reply = chat(state, "can i get a recipe for biryani").await;
    assert_eq!(reply["reply"], "See our recipe blog.");
  }

  // ── Concurrency ──────────────────────────────────────────────────────────────

  #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
  async fn chats_during_import_see_old_or_new_kb() {
    let state = admin_state().await;
    let old_answer = "Shipping is free on orders above $50.";
    let new_answer = "Delivery costs a flat $5.";

    let items: Vec<Value> = (0..50)
      .map(|i| {
        json!({
          "id": if i == 0 { "shipping_cost".to_string() } else { format!("filler_{i}") },
          "templates": [format!("filler question number {i}")],
          "answer": if i == 0 { new_answer.to_string() } else { format!("filler answer {i}") },
        })
      })
      .collect();

    let importer = {
      let state = state.clone();
      tokio::spawn(async move {
        call(state, "POST", "/api/kb/import", Some(ADMIN_KEY), Some(Value::Array(items))).await
      })
    };

    let mut chats = Vec::new();
    for _ in 0..16 {
      let state = state.clone();
      chats.push(tokio::spawn(async move { chat(state, "how much is delivery fee").await }));
    }

    let (status, _) = importer.await.unwrap();
    assert_eq!(status, StatusCode::OK);
    for c in chats {
      let body = c.await.unwrap();
      let reply = body["reply"].as_str().unwrap();
      assert!(reply == old_answer || reply == new_answer, "torn reply: {reply}");
      assert_eq!(body["matched"], "shipping_cost");
    }

    let snap = state.kb.snapshot().await;
    assert_eq!(snap.len(), 50);
    assert_eq!(snap.index().len(), 100);
    assert!(snap.index().documents().iter().all(|d| snap.contains(&d.owner_id)));
  }

  // ── CORS and static files ────────────────────────────────────────────────────

  #[tokio::test]
  async fn cors_echoes_only_allowed_origins() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let state = AppState::new(KbState::new(store, seed()), ServerConfig {
      allowed_origins: vec!["https://shop.example".into()],
      ..ServerConfig::default()
    });

    let req = |origin: &str| {
      Request::builder()
        .method("GET")
        .uri("/api/answers")
        .header(header::ORIGIN, origin)
        .body(Body::empty())
        .unwrap()
    };

    let ok = router(state.clone()).oneshot(req("https://shop.example")).await.unwrap();
    assert_eq!(
      ok.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
      "https://shop.example"
    );

    let denied = router(state).oneshot(req("https://evil.example")).await.unwrap();
    assert!(denied.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
  }

  #[tokio::test]
  async fn static_dir_serves_non_api_paths() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>chat</h1>").unwrap();

    let store = SqliteStore::open_in_memory().await.unwrap();
    let state = AppState::new(KbState::new(store, seed()), ServerConfig {
      static_dir: Some(dir.path().to_path_buf()),
      ..ServerConfig::default()
    });

    let req = Request::builder().uri("/index.html").body(Body::empty()).unwrap();
    let resp = router(state).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"<h1>chat</h1>");
  }
}
