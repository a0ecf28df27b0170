//! Sign-in relay. Credentials are checked by the vocabulary service; we only
//! keep its session token.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use super::{AppError, AppResult, BrowserId};
use crate::practise::PractiseView;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthStatus {
    pub signed_in: bool,
    pub username: Option<String>,
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    browser: BrowserId,
    Json(form): Json<LoginForm>,
) -> AppResult<Json<PractiseView>> {
    if form.username.trim().is_empty() || form.password.trim().is_empty() {
        return Err(AppError::bad_request("Username and password are required."));
    }

    let view = state
        .practise
        .sign_in(browser.as_str(), form.username.trim(), &form.password)
        .await?;
    Ok(Json(view))
}

/// POST /auth/logout
pub async fn logout(State(state): State<AppState>, browser: BrowserId) -> Json<PractiseView> {
    Json(state.practise.sign_out(browser.as_str()).await)
}

/// GET /auth/status
pub async fn status(State(state): State<AppState>, browser: BrowserId) -> Json<AuthStatus> {
    let username = state.practise.username(browser.as_str());
    Json(AuthStatus {
        signed_in: username.is_some(),
        username,
    })
}
