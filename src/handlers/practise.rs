use axum::{extract::State, Json};
use serde::Deserialize;

use super::{AppError, AppResult, BrowserId};
use crate::domain::ExerciseMode;
use crate::practise::PractiseView;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ModeForm {
  pub mode: String,
}

#[derive(Debug, Deserialize)]
pub struct ChooseForm {
  pub option_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CheckForm {
  #[serde(default)]
  pub answer: String,
}

#[derive(Debug, Deserialize)]
pub struct ClearFeedbackForm {
  pub token: u64,
}

#[derive(Debug, Deserialize)]
pub struct SaveSuggestionForm {
  /// Danish phrase from the word bar
  pub phrase: String,
  /// English meaning typed by the learner
  pub translation: String,
}

/// GET /practise
pub async fn view(State(state): State<AppState>, browser: BrowserId) -> Json<PractiseView> {
  Json(state.practise.view(browser.as_str()))
}

/// POST /practise/mode
pub async fn select_mode(
  State(state): State<AppState>,
  browser: BrowserId,
  Json(form): Json<ModeForm>,
) -> AppResult<Json<PractiseView>> {
  let mode = ExerciseMode::from_str(&form.mode)
    .ok_or_else(|| AppError::bad_request(format!("Unknown exercise mode: {}", form.mode)))?;
  Ok(Json(state.practise.select_mode(browser.as_str(), mode).await?))
}

/// POST /practise/change-mode
pub async fn change_mode(State(state): State<AppState>, browser: BrowserId) -> Json<PractiseView> {
  Json(state.practise.change_mode(browser.as_str()))
}

/// POST /practise/next
pub async fn next(State(state): State<AppState>, browser: BrowserId) -> AppResult<Json<PractiseView>> {
  Ok(Json(state.practise.next(browser.as_str()).await?))
}

/// POST /practise/choose
pub async fn choose(
  State(state): State<AppState>,
  browser: BrowserId,
  Json(form): Json<ChooseForm>,
) -> AppResult<Json<PractiseView>> {
  Ok(Json(state.practise.choose(browser.as_str(), &form.option_id)?))
}

/// POST /practise/check
pub async fn check(
  State(state): State<AppState>,
  browser: BrowserId,
  Json(form): Json<CheckForm>,
) -> AppResult<Json<PractiseView>> {
  Ok(Json(state.practise.check(browser.as_str(), &form.answer)?))
}

/// POST /practise/give-up
pub async fn give_up(State(state): State<AppState>, browser: BrowserId) -> AppResult<Json<PractiseView>> {
  Ok(Json(state.practise.give_up(browser.as_str())?))
}

/// POST /practise/feedback/clear
pub async fn clear_feedback(
  State(state): State<AppState>,
  browser: BrowserId,
  Json(form): Json<ClearFeedbackForm>,
) -> Json<PractiseView> {
  Json(state.practise.clear_feedback(browser.as_str(), form.token))
}

/// POST /practise/suggestions/save
pub async fn save_suggestion(
  State(state): State<AppState>,
  browser: BrowserId,
  Json(form): Json<SaveSuggestionForm>,
) -> AppResult<Json<PractiseView>> {
  let phrase = form.phrase.trim();
  let translation = form.translation.trim();
  if phrase.is_empty() || translation.is_empty() {
    return Err(AppError::bad_request("Both the phrase and its translation are required."));
  }
  Ok(Json(
    state
      .practise
      .save_suggestion(browser.as_str(), phrase, translation)
      .await?,
  ))
}
