// SPDX-License-Identifier: MIT

//! JWT authentication middleware (the auth guard).
//!
//! Protected routes get `require_auth`: extract the access token from the
//! `accessToken` cookie or `Authorization: Bearer` header, verify it, load
//! the referenced user, and attach it to the request. Routes that merely
//! personalize their output get `optional_auth`, which attaches the identity
//! when a valid token is present and otherwise continues anonymously.

use crate::error::AppError;
use crate::models::User;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

/// Cookie carrying the access token.
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
/// Cookie carrying the refresh token.
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Authenticated caller, attached to request extensions by the guard.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Caller identity on optionally-authenticated routes. Always present in
/// extensions behind `optional_auth`; `None` means anonymous.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

fn extract_token(jar: &CookieJar, request: &Request) -> Option<String> {
    // Try cookie first, then header
    if let Some(cookie) = jar.get(ACCESS_TOKEN_COOKIE) {
        return Some(cookie.value().to_string());
    }

    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.to_string())
}

/// Resolve the caller from an access token: verify, then load the user.
async fn resolve_user(state: &AppState, token: &str) -> Result<User, AppError> {
    let claims = state.tokens.verify_access_token(token)?;

    state
        .db
        .get_user(&claims.sub)
        .await?
        .ok_or(AppError::InvalidToken)
}

/// Middleware that requires valid JWT authentication.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(&jar, &request).ok_or(AppError::Unauthorized)?;

    let user = resolve_user(&state, &token).await?;

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

/// Middleware that attaches the caller identity when a valid token is
/// presented, but never rejects the request.
pub async fn optional_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let user = match extract_token(&jar, &request) {
        Some(token) => resolve_user(&state, &token).await.ok(),
        None => None,
    };
    request.extensions_mut().insert(MaybeUser(user));
    next.run(request).await
}
