//! Browser session cookie handling.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};

use crate::config::SESSION_COOKIE_NAME;
use crate::session::generate_session_id;
use crate::state::AppState;

/// Id of the browser session making the request.
/// Add this as a handler parameter to get the caller's session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserId(pub String);

impl BrowserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S: Send + Sync> FromRequestParts<S> for BrowserId {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<BrowserId>()
            .cloned()
            .ok_or_else(|| (StatusCode::INTERNAL_SERVER_ERROR, "Missing browser session").into_response())
    }
}

/// Make sure every request carries a browser session id, issuing the
/// cookie on first contact
pub async fn ensure_browser_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(cookie) = jar.get(SESSION_COOKIE_NAME) {
        let id = cookie.value().to_string();
        if !id.is_empty() {
            request.extensions_mut().insert(BrowserId(id));
            return next.run(request).await;
        }
    }

    let id = generate_session_id();
    tracing::debug!("New browser session {}", id);
    request.extensions_mut().insert(BrowserId(id.clone()));
    let response = next.run(request).await;

    let session_cookie = Cookie::build((SESSION_COOKIE_NAME, id))
        .path("/")
        .http_only(true)
        .secure(false) // Set to true in production with HTTPS
        .max_age(time::Duration::hours(state.config.session_expiry_hours))
        .build();

    (jar.add(session_cookie), response).into_response()
}
