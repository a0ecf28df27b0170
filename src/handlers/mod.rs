pub mod auth;
pub mod dictionary;
pub mod extract;
pub mod practise;
pub mod progress;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{middleware, Json, Router};
use serde_json::json;
use thiserror::Error;
use tower_http::trace::TraceLayer;

use crate::api::ApiError;
use crate::state::AppState;

pub use extract::BrowserId;

/// Error returned by JSON handlers
#[derive(Debug, Error)]
pub enum AppError {
  #[error(transparent)]
  Api(#[from] ApiError),
  #[error("{0}")]
  BadRequest(String),
}

impl AppError {
  pub fn bad_request(message: impl Into<String>) -> Self {
    Self::BadRequest(message.into())
  }

  fn status(&self) -> StatusCode {
    match self {
      Self::Api(ApiError::Unauthorized | ApiError::SignInRejected(_)) => StatusCode::UNAUTHORIZED,
      Self::Api(_) => StatusCode::BAD_GATEWAY,
      Self::BadRequest(_) => StatusCode::BAD_REQUEST,
    }
  }
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status == StatusCode::BAD_GATEWAY {
      tracing::warn!("Vocabulary service error: {:?}", self);
    }
    (status, Json(json!({ "error": self.to_string() }))).into_response()
  }
}

pub type AppResult<T> = Result<T, AppError>;

/// All routes, with the browser-session cookie layer and request tracing
pub fn router(state: AppState) -> Router {
  Router::new()
    // Auth relay
    .route("/auth/login", post(auth::login))
    .route("/auth/logout", post(auth::logout))
    .route("/auth/status", get(auth::status))
    // Practise
    .route("/practise", get(practise::view))
    .route("/practise/mode", post(practise::select_mode))
    .route("/practise/change-mode", post(practise::change_mode))
    .route("/practise/next", post(practise::next))
    .route("/practise/choose", post(practise::choose))
    .route("/practise/check", post(practise::check))
    .route("/practise/give-up", post(practise::give_up))
    .route("/practise/feedback/clear", post(practise::clear_feedback))
    .route("/practise/suggestions/save", post(practise::save_suggestion))
    // Dictionary
    .route("/dictionary", get(dictionary::list))
    .route("/dictionary/entries", post(dictionary::save))
    .route("/dictionary/entries/{id}", delete(dictionary::remove))
    .route("/dictionary/entries/{id}/examples", post(dictionary::generate_example))
    .route("/dictionary/entries/{id}/examples/{index}", delete(dictionary::delete_example))
    // Progress
    .route("/progress", get(progress::progress))
    .layer(middleware::from_fn_with_state(state.clone(), extract::ensure_browser_session))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
