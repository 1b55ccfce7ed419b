//! Router tests driven through `tower::ServiceExt::oneshot`.

use std::{convert::Infallible, sync::Arc, time::Duration};

use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use axum::{
  body::Body,
  http::{Request, Response, StatusCode, header},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use rand_core::OsRng;
use santa_core::{
  SecretSanta,
  event::Recipient,
  memory::MemoryStore,
  notify::Notifier,
  participant::Participant,
  policy::EventPolicy,
};
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{AppState, AuthConfig, router};

struct NoopNotifier;

impl Notifier for NoopNotifier {
  type Error = Infallible;

  async fn deliver(&self, _: &Participant, _: &Recipient) -> Result<(), Infallible> { Ok(()) }
}

fn make_state() -> AppState<MemoryStore, NoopNotifier> {
  let salt = SaltString::generate(&mut OsRng);
  let hash = Argon2::default()
    .hash_password(b"secret", &salt)
    .unwrap()
    .to_string();
  let policy = EventPolicy {
    notify_retry_delay_ms: 0,
    ..EventPolicy::default()
  };

  AppState {
    santa:    Arc::new(SecretSanta::with_seed(MemoryStore::new(), policy, 3)),
    auth:     Arc::new(AuthConfig {
      username:      "admin".to_string(),
      password_hash: hash,
    }),
    notifier: Arc::new(NoopNotifier),
  }
}

fn admin_header() -> String {
  format!("Basic {}", B64.encode("admin:secret"))
}

async fn send(
  state: &AppState<MemoryStore, NoopNotifier>,
  method: &str,
  uri: &str,
  admin: bool,
  body: Option<Value>,
) -> Response<Body> {
  let mut req = Request::builder().method(method).uri(uri);
  if admin {
    req = req.header(header::AUTHORIZATION, admin_header());
  }
  let req = match body {
    Some(v) => req
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(v.to_string()))
      .unwrap(),
    None => req.body(Body::empty()).unwrap(),
  };
  router(state.clone()).oneshot(req).await.unwrap()
}

async fn json_body(resp: Response<Body>) -> Value {
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  serde_json::from_slice(&bytes).unwrap()
}

async fn register(state: &AppState<MemoryStore, NoopNotifier>, id: &str, name: &str) {
  let resp = send(
    state,
    "PUT",
    &format!("/participants/{id}"),
    false,
    Some(json!({ "name": name, "wish": "a good book" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
}

// ─── Participants ────────────────────────────────────────────────────────────

#[tokio::test]
async fn register_then_get() {
  let state = make_state();
  register(&state, "42", "Alice Liddell").await;

  let resp = send(&state, "GET", "/participants/42", false, None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = json_body(resp).await;
  assert_eq!(body["participant_id"], "42");
  assert_eq!(body["profile"]["name"], "Alice Liddell");
  assert_eq!(body["profile"]["wish"], "a good book");
  assert_eq!(body["flags"]["is_giver"], false);
}

#[tokio::test]
async fn short_name_is_bad_request() {
  let state = make_state();
  let resp = send(&state, "PUT", "/participants/1", false, Some(json!({ "name": "Al" }))).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  assert!(json_body(resp).await["error"].is_string());
}

#[tokio::test]
async fn unknown_participant_is_404() {
  let state = make_state();
  let resp = send(&state, "GET", "/participants/nobody", false, None).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_returns_registration_order() {
  let state = make_state();
  register(&state, "b", "Bob Builder").await;
  register(&state, "a", "Alice Liddell").await;

  let body = json_body(send(&state, "GET", "/participants", false, None).await).await;
  let ids: Vec<&str> = body
    .as_array()
    .unwrap()
    .iter()
    .map(|p| p["participant_id"].as_str().unwrap())
    .collect();
  assert_eq!(ids, ["b", "a"]);
}

// ─── Draw ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn draw_requires_admin() {
  let state = make_state();
  let resp = send(&state, "POST", "/draw", false, None).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));

  let resp = send(&state, "DELETE", "/draw", false, None).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn draw_with_one_participant_conflicts() {
  let state = make_state();
  register(&state, "a", "Alice Liddell").await;
  let resp = send(&state, "POST", "/draw", true, None).await;
  assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn full_draw_flow() {
  let state = make_state();
  register(&state, "a", "Alice Liddell").await;
  register(&state, "b", "Bob Builder").await;
  register(&state, "c", "Carol Singer").await;

  let status = json_body(send(&state, "GET", "/draw", false, None).await).await;
  assert_eq!(status["can_run"], true);
  assert_eq!(status["participants"], 3);

  let resp = send(&state, "POST", "/draw", true, None).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  assert!(json_body(resp).await["round_id"].is_string());

  let resp = send(&state, "POST", "/draw", true, None).await;
  assert_eq!(resp.status(), StatusCode::CONFLICT);

  let pairs = json_body(send(&state, "GET", "/draw/pairs", true, None).await).await;
  assert_eq!(pairs.as_array().unwrap().len(), 3);

  let resp = send(&state, "GET", "/participants/a/recipient", false, None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let recipient = json_body(resp).await;
  assert_ne!(recipient["participant_id"], "a");
  assert!(recipient["profile"]["name"].is_string());

  let a = json_body(send(&state, "GET", "/participants/a", false, None).await).await;
  assert_eq!(a["flags"]["notified"], true);

  let resp = send(&state, "DELETE", "/draw", true, None).await;
  assert_eq!(resp.status(), StatusCode::NO_CONTENT);

  let resp = send(&state, "GET", "/participants/a/recipient", false, None).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);

  let status = json_body(send(&state, "GET", "/draw", false, None).await).await;
  assert_eq!(status["distribution_done"], false);
  assert_eq!(status["round"], Value::Null);
}

#[tokio::test]
async fn notify_before_draw_conflicts() {
  let state = make_state();
  register(&state, "a", "Alice Liddell").await;
  let resp = send(&state, "POST", "/draw/notify", true, None).await;
  assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn notify_marks_everyone_in_background() {
  let state = make_state();
  register(&state, "a", "Alice Liddell").await;
  register(&state, "b", "Bob Builder").await;
  register(&state, "c", "Carol Singer").await;
  send(&state, "POST", "/draw", true, None).await;

  let resp = send(&state, "POST", "/draw/notify", true, None).await;
  assert_eq!(resp.status(), StatusCode::ACCEPTED);

  let mut notified = 0;
  for _ in 0..200 {
    notified = state.santa.status().await.unwrap().notified;
    if notified == 3 {
      break;
    }
    tokio::time::sleep(Duration::from_millis(10)).await;
  }
  assert_eq!(notified, 3);
}

#[tokio::test]
async fn history_lists_past_receivers_after_reset() {
  let state = make_state();
  register(&state, "a", "Alice Liddell").await;
  register(&state, "b", "Bob Builder").await;

  let resp = send(&state, "GET", "/participants/a/history", false, None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(json_body(resp).await, json!([]));

  let round = json_body(send(&state, "POST", "/draw", true, None).await).await;
  send(&state, "DELETE", "/draw", true, None).await;

  let history = json_body(send(&state, "GET", "/participants/a/history", false, None).await).await;
  let entries = history.as_array().unwrap();
  assert_eq!(entries.len(), 1);
  assert_eq!(entries[0]["round_id"], round["round_id"]);
  assert_eq!(entries[0]["receiver"], "b");
  assert_eq!(entries[0]["receiver_name"], "Bob Builder");

  let resp = send(&state, "GET", "/participants/zz/history", false, None).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
