//! Session cookie handling and the authenticated-user extractors

use crate::app::AppState;
use crate::config::{SESSION_COOKIE_NAME, SESSION_TTL_HOURS};
use crate::database::User;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;

/// Read the session token from the `Cookie` header, if present
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE_NAME)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value that installs a session token
pub fn session_cookie(token: &str) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE_NAME,
        token,
        SESSION_TTL_HOURS * 3600
    )
}

/// `Set-Cookie` value that removes the session cookie
pub fn clear_session_cookie() -> String {
    format!(
        "{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0",
        SESSION_COOKIE_NAME
    )
}

async fn lookup_user(parts: &Parts, state: &AppState) -> Result<Option<User>, Response> {
    let Some(token) = session_token(&parts.headers) else {
        return Ok(None);
    };

    state
        .auth
        .resolve_session(&token)
        .await
        .map_err(IntoResponse::into_response)
}

/// Logged-in user for HTML pages; anonymous requests are sent to `/login`
pub struct CurrentUser(pub User);

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match lookup_user(parts, state).await? {
            Some(user) => Ok(CurrentUser(user)),
            None => Err(Redirect::to("/login").into_response()),
        }
    }
}

/// Logged-in user for JSON endpoints; anonymous requests get a 401 body
pub struct ApiUser(pub User);

#[axum::async_trait]
impl FromRequestParts<AppState> for ApiUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match lookup_user(parts, state).await? {
            Some(user) => Ok(ApiUser(user)),
            None => Err((
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "error": "not logged in" })),
            )
                .into_response()),
        }
    }
}
