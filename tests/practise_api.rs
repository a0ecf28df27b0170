//! HTTP-level tests driving the router against the in-memory backend.

use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};

use da_notebook::api::MemoryApi;
use da_notebook::config::Config;
use da_notebook::{router, AppState};

fn server_with(api: Arc<MemoryApi>) -> TestServer {
  let state = AppState::new(Config::default(), api);
  TestServer::builder().save_cookies().build(router(state)).unwrap()
}

fn server() -> TestServer {
  server_with(Arc::new(MemoryApi::demo()))
}

async fn sign_in(server: &TestServer) -> Value {
  let response = server
    .post("/auth/login")
    .json(&json!({"username": "tester", "password": "1234"}))
    .await;
  response.assert_status_ok();
  response.json::<Value>()
}

async fn dictionary(server: &TestServer) -> Vec<Value> {
  let body = server.get("/dictionary").await.json::<Value>();
  body["entries"].as_array().cloned().unwrap_or_default()
}

/// Danish translation of the entry a cloze question was built for
async fn cloze_answer(server: &TestServer, view: &Value) -> String {
  let entry_id = view["cloze"]["entry_id"].as_i64().unwrap();
  dictionary(server)
    .await
    .into_iter()
    .find(|e| e["id"].as_i64() == Some(entry_id))
    .and_then(|e| e["translation"].as_str().map(str::to_string))
    .unwrap()
}

// ============================================================================
// Auth relay
// ============================================================================

#[tokio::test]
async fn test_status_before_and_after_sign_in() {
  let server = server();
  let status = server.get("/auth/status").await.json::<Value>();
  assert_eq!(status["signed_in"], false);

  let view = sign_in(&server).await;
  assert_eq!(view["signed_in"], true);
  assert_eq!(view["status"], "no_mode");
  assert_eq!(view["usable_entries"], 8);

  let status = server.get("/auth/status").await.json::<Value>();
  assert_eq!(status["username"], "tester");
}

#[tokio::test]
async fn test_bad_credentials() {
  let server = server();
  let response = server
    .post("/auth/login")
    .json(&json!({"username": "tester", "password": "wrong"}))
    .await;
  response.assert_status(StatusCode::UNAUTHORIZED);
  assert_eq!(response.json::<Value>()["error"], "Invalid credentials.");

  let response = server
    .post("/auth/login")
    .json(&json!({"username": " ", "password": ""}))
    .await;
  response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_practise_requires_sign_in() {
  let server = server();
  server.post("/practise/next").await.assert_status(StatusCode::UNAUTHORIZED);
  server
    .post("/practise/mode")
    .json(&json!({"mode": "cloze"}))
    .await
    .assert_status(StatusCode::UNAUTHORIZED);

  let view = server.get("/practise").await.json::<Value>();
  assert_eq!(view["signed_in"], false);
  assert_eq!(view["input_enabled"], false);
}

#[tokio::test]
async fn test_sign_out_resets_session() {
  let server = server();
  sign_in(&server).await;
  server.post("/practise/mode").json(&json!({"mode": "cloze"})).await.assert_status_ok();

  let view = server.post("/auth/logout").await.json::<Value>();
  assert_eq!(view["signed_in"], false);
  assert_eq!(view["status"], "no_mode");
  assert!(view["cloze"].is_null());
  server.post("/practise/give-up").await.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_lapsed_remote_session_signs_out() {
  let api = Arc::new(MemoryApi::demo());
  let server = server_with(Arc::clone(&api));
  sign_in(&server).await;

  api.revoke_sessions();
  server
    .post("/practise/mode")
    .json(&json!({"mode": "cloze"}))
    .await
    .assert_status(StatusCode::UNAUTHORIZED);

  let status = server.get("/auth/status").await.json::<Value>();
  assert_eq!(status["signed_in"], false);
  let view = server.get("/practise").await.json::<Value>();
  assert_eq!(view["usable_entries"], 0);
}

// ============================================================================
// Flashcards
// ============================================================================

#[tokio::test]
async fn test_flashcard_wrong_then_right() {
  let server = server();
  sign_in(&server).await;

  let view = server
    .post("/practise/mode")
    .json(&json!({"mode": "flashcard-target"}))
    .await
    .json::<Value>();
  assert_eq!(view["status"], "ready");
  assert_eq!(view["mode"], "flashcard-target");
  let options = view["flashcard"]["options"].as_array().unwrap().clone();
  assert_eq!(options.len(), 4);
  assert!(options.iter().all(|o| o["state"].is_null()));

  // Prompt is the Danish side; the correct option is the entry's English side
  let prompt = view["flashcard"]["prompt"].as_str().unwrap().to_string();
  let english = dictionary(&server)
    .await
    .into_iter()
    .find(|e| e["translation"] == prompt.as_str())
    .and_then(|e| e["text"].as_str().map(str::to_string))
    .unwrap();
  let correct = options.iter().find(|o| o["label"] == english.as_str()).unwrap();
  let wrong = options.iter().find(|o| o["label"] != english.as_str()).unwrap();

  let view = server
    .post("/practise/choose")
    .json(&json!({"option_id": wrong["id"]}))
    .await
    .json::<Value>();
  assert_eq!(view["status"], "ready");
  assert_eq!(view["feedback"]["kind"], "incorrect");
  let marked = view["flashcard"]["options"]
    .as_array()
    .unwrap()
    .iter()
    .find(|o| o["id"] == wrong["id"])
    .unwrap()
    .clone();
  assert_eq!(marked["disabled"], true);
  assert_eq!(marked["state"], "wrong");

  let view = server
    .post("/practise/choose")
    .json(&json!({"option_id": correct["id"]}))
    .await
    .json::<Value>();
  assert_eq!(view["status"], "answered");
  assert_eq!(view["resolution"], "solved");
  assert_eq!(view["next_visible"], true);
  assert_eq!(view["input_enabled"], false);

  let view = server.post("/practise/next").await.json::<Value>();
  assert_eq!(view["status"], "ready");
  assert_eq!(view["next_visible"], false);
}

#[tokio::test]
async fn test_unknown_mode_is_rejected() {
  let server = server();
  sign_in(&server).await;
  let response = server.post("/practise/mode").json(&json!({"mode": "listening"})).await;
  response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_change_mode() {
  let server = server();
  sign_in(&server).await;
  server
    .post("/practise/mode")
    .json(&json!({"mode": "flashcard-source"}))
    .await
    .assert_status_ok();

  let view = server.post("/practise/change-mode").await.json::<Value>();
  assert_eq!(view["status"], "no_mode");
  assert!(view["mode"].is_null());
  assert!(view["flashcard"].is_null());
}

// ============================================================================
// Cloze
// ============================================================================

#[tokio::test]
async fn test_cloze_near_empty_and_correct() {
  let server = server();
  sign_in(&server).await;

  let view = server
    .post("/practise/mode")
    .json(&json!({"mode": "cloze"}))
    .await
    .json::<Value>();
  assert_eq!(view["status"], "ready");
  assert!(view["cloze"]["prompt"].as_str().unwrap().contains("_____"));
  let answer = cloze_answer(&server, &view).await;

  let view = server
    .post("/practise/check")
    .json(&json!({"answer": format!("{}x", answer)}))
    .await
    .json::<Value>();
  assert_eq!(view["status"], "ready");
  assert_eq!(view["feedback"]["kind"], "near");

  let view = server.post("/practise/check").json(&json!({"answer": "  "})).await.json::<Value>();
  assert_eq!(view["feedback"]["kind"], "empty");

  let view = server
    .post("/practise/check")
    .json(&json!({"answer": answer.to_uppercase()}))
    .await
    .json::<Value>();
  assert_eq!(view["status"], "answered");
  assert_eq!(view["cloze"]["revealed_answer"], answer.as_str());
  assert!(!view["suggestions"].as_array().unwrap().is_empty());
  assert!(view["feedback"].is_null());
}

#[tokio::test]
async fn test_give_up_logs_and_locks() {
  let api = Arc::new(MemoryApi::demo());
  let server = server_with(Arc::clone(&api));
  sign_in(&server).await;

  let view = server
    .post("/practise/mode")
    .json(&json!({"mode": "cloze"}))
    .await
    .json::<Value>();
  let answer = cloze_answer(&server, &view).await;

  let view = server.post("/practise/give-up").await.json::<Value>();
  assert_eq!(view["resolution"], "gave_up");
  assert_eq!(view["cloze"]["revealed_answer"], answer.as_str());
  assert_eq!(view["cloze"]["check_enabled"], false);

  // Locked: a late correct answer changes nothing
  let view = server.post("/practise/check").json(&json!({"answer": answer})).await.json::<Value>();
  assert_eq!(view["resolution"], "gave_up");

  for _ in 0..50 {
    if api.exercises_today("tester") > 0 {
      break;
    }
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
  }
  assert_eq!(api.exercises_today("tester"), 1);
}

#[tokio::test]
async fn test_stale_feedback_token_is_ignored() {
  let server = server();
  sign_in(&server).await;
  server.post("/practise/mode").json(&json!({"mode": "cloze"})).await.assert_status_ok();

  let first = server
    .post("/practise/check")
    .json(&json!({"answer": "zzzzzzzz"}))
    .await
    .json::<Value>();
  let old_token = first["feedback"]["token"].as_u64().unwrap();
  let second = server
    .post("/practise/check")
    .json(&json!({"answer": "qqqqqqqq"}))
    .await
    .json::<Value>();
  let new_token = second["feedback"]["token"].as_u64().unwrap();

  let view = server
    .post("/practise/feedback/clear")
    .json(&json!({"token": old_token}))
    .await
    .json::<Value>();
  assert_eq!(view["feedback"]["token"].as_u64(), Some(new_token));

  let view = server
    .post("/practise/feedback/clear")
    .json(&json!({"token": new_token}))
    .await
    .json::<Value>();
  assert!(view["feedback"].is_null());
}

#[tokio::test]
async fn test_save_suggestion_adds_practise_entry() {
  let server = server();
  sign_in(&server).await;
  server.post("/practise/mode").json(&json!({"mode": "cloze"})).await.assert_status_ok();

  let view = server.post("/practise/give-up").await.json::<Value>();
  let phrase = view["suggestions"][0].as_str().unwrap().to_string();

  let view = server
    .post("/practise/suggestions/save")
    .json(&json!({"phrase": phrase, "translation": "saved meaning"}))
    .await
    .json::<Value>();
  assert!(!view["suggestions"]
    .as_array()
    .unwrap()
    .iter()
    .any(|s| s == phrase.as_str()));
  assert_eq!(view["usable_entries"], 9);

  let entries = dictionary(&server).await;
  let saved = entries.iter().find(|e| e["translation"] == phrase.as_str()).unwrap();
  assert_eq!(saved["text"], "saved meaning");
  assert_eq!(saved["provenance"], "practise");
}

// ============================================================================
// Dictionary & progress
// ============================================================================

#[tokio::test]
async fn test_dictionary_save_and_delete() {
  let server = server();
  sign_in(&server).await;

  server
    .post("/dictionary/entries")
    .json(&json!({"text": "dog", "translation": "  "}))
    .await
    .assert_status(StatusCode::BAD_REQUEST);

  let body = server
    .post("/dictionary/entries")
    .json(&json!({"text": "dog", "translation": "hund"}))
    .await
    .json::<Value>();
  let entries = body["entries"].as_array().unwrap();
  assert_eq!(entries.len(), 9);
  assert_eq!(entries[0]["translation"], "hund");
  assert_eq!(entries[0]["provenance"], "external");

  let id = entries[0]["id"].as_i64().unwrap();
  let body = server.delete(&format!("/dictionary/entries/{}", id)).await.json::<Value>();
  assert_eq!(body["entries"].as_array().unwrap().len(), 8);

  let response = server.delete(&format!("/dictionary/entries/{}", id)).await;
  response.assert_status(StatusCode::BAD_GATEWAY);
  assert_eq!(response.json::<Value>()["error"], "Entry not found.");
}

#[tokio::test]
async fn test_examples() {
  let server = server();
  sign_in(&server).await;
  let id = dictionary(&server).await[0]["id"].as_i64().unwrap();

  let response = server.post(&format!("/dictionary/entries/{}/examples", id)).await;
  response.assert_status(StatusCode::BAD_GATEWAY);

  let body = server
    .delete(&format!("/dictionary/entries/{}/examples/0", id))
    .await
    .json::<Value>();
  assert_eq!(body["examples"].as_array().unwrap().len(), 0);

  server
    .delete(&format!("/dictionary/entries/{}/examples/0", id))
    .await
    .assert_status(StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_deleting_all_entries_shows_need_more() {
  let server = server();
  sign_in(&server).await;
  server.post("/practise/mode").json(&json!({"mode": "cloze"})).await.assert_status_ok();

  for entry in dictionary(&server).await {
    let id = entry["id"].as_i64().unwrap();
    server.delete(&format!("/dictionary/entries/{}", id)).await.assert_status_ok();
  }

  let view = server.get("/practise").await.json::<Value>();
  assert_eq!(view["need_more_entries"], true);
  assert!(view["cloze"].is_null());
  assert_eq!(view["mode"], "cloze");
}

#[tokio::test]
async fn test_progress_window() {
  let server = server();
  sign_in(&server).await;

  let summary = server.get("/progress").await.json::<Value>();
  assert_eq!(summary["window_days"], 7);
  assert_eq!(summary["words"].as_array().unwrap().len(), 7);
  assert_eq!(summary["total_entries"], 8);

  let summary = server.get("/progress?days=abc").await.json::<Value>();
  assert_eq!(summary["window_days"], 7);

  let summary = server.get("/progress?days=500").await.json::<Value>();
  assert_eq!(summary["window_days"], 90);

  let summary = server.get("/progress?days=0").await.json::<Value>();
  assert_eq!(summary["window_days"], 1);
}
