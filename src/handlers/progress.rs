use axum::{
  extract::{Query, State},
  Json,
};
use serde::Deserialize;

use super::{AppResult, BrowserId};
use crate::config;
use crate::domain::ProgressSummary;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProgressQuery {
  /// Raw so that junk falls back to the default window instead of a 400
  pub days: Option<String>,
}

/// GET /progress?days=N
pub async fn progress(
  State(state): State<AppState>,
  browser: BrowserId,
  Query(query): Query<ProgressQuery>,
) -> AppResult<Json<ProgressSummary>> {
  let days = config::progress_window(query.days.as_deref());
  Ok(Json(state.practise.progress(browser.as_str(), days).await?))
}
