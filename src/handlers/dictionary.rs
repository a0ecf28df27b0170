use axum::{
  extract::{Path, State},
  Json,
};
use serde::{Deserialize, Serialize};

use super::{AppError, AppResult, BrowserId};
use crate::domain::{EntryId, ExampleSentence, VocabularyEntry};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EntryForm {
  /// English side
  pub text: String,
  /// Danish side
  pub translation: String,
}

#[derive(Debug, Serialize)]
pub struct DictionaryView {
  pub entries: Vec<VocabularyEntry>,
}

#[derive(Debug, Serialize)]
pub struct ExamplesView {
  pub entry_id: EntryId,
  pub examples: Vec<ExampleSentence>,
}

/// GET /dictionary
pub async fn list(State(state): State<AppState>, browser: BrowserId) -> AppResult<Json<DictionaryView>> {
  let entries = state.practise.entries(browser.as_str()).await?;
  Ok(Json(DictionaryView { entries }))
}

/// POST /dictionary/entries
pub async fn save(
  State(state): State<AppState>,
  browser: BrowserId,
  Json(form): Json<EntryForm>,
) -> AppResult<Json<DictionaryView>> {
  let text = form.text.trim();
  let translation = form.translation.trim();
  if text.is_empty() || translation.is_empty() {
    return Err(AppError::bad_request("English and Danish texts are required."));
  }
  let entries = state.practise.save_entry(browser.as_str(), text, translation).await?;
  Ok(Json(DictionaryView { entries }))
}

/// DELETE /dictionary/entries/{id}
pub async fn remove(
  State(state): State<AppState>,
  browser: BrowserId,
  Path(id): Path<i64>,
) -> AppResult<Json<DictionaryView>> {
  let entries = state.practise.delete_entry(browser.as_str(), EntryId(id)).await?;
  Ok(Json(DictionaryView { entries }))
}

/// POST /dictionary/entries/{id}/examples
pub async fn generate_example(
  State(state): State<AppState>,
  browser: BrowserId,
  Path(id): Path<i64>,
) -> AppResult<Json<ExamplesView>> {
  let entry_id = EntryId(id);
  let examples = state.practise.generate_example(browser.as_str(), entry_id).await?;
  Ok(Json(ExamplesView { entry_id, examples }))
}

/// DELETE /dictionary/entries/{id}/examples/{index}
pub async fn delete_example(
  State(state): State<AppState>,
  browser: BrowserId,
  Path((id, index)): Path<(i64, usize)>,
) -> AppResult<Json<ExamplesView>> {
  let entry_id = EntryId(id);
  let examples = state
    .practise
    .delete_example(browser.as_str(), entry_id, index)
    .await?;
  Ok(Json(ExamplesView { entry_id, examples }))
}
