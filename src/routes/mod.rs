// SPDX-License-Identifier: MIT

//! HTTP route handlers.

pub mod comments;
pub mod likes;
pub mod playlists;
pub mod subscriptions;
pub mod tweets;
pub mod users;
pub mod videos;

use crate::middleware::{optional_auth, require_auth};
use crate::response::ApiResponse;
use crate::AppState;
use axum::http::{header, Method};
use axum::{middleware, routing::get, Json, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Health check response
async fn health_check() -> Json<ApiResponse<Option<()>>> {
    Json(ApiResponse::ok(None, "Service is healthy"))
}

/// Offset for 1-based pagination. `page` is attacker-controlled; the
/// multiplication must not wrap.
pub(crate) fn page_offset(page: u32, limit: u32) -> Result<u32, crate::error::AppError> {
    page.checked_sub(1)
        .and_then(|p| p.checked_mul(limit))
        .ok_or_else(|| crate::error::AppError::Validation("page is out of range".into()))
}

/// Map a multipart read failure, distinguishing an oversized body from a
/// malformed one.
pub(crate) fn multipart_error(e: axum::extract::multipart::MultipartError) -> crate::error::AppError {
    if e.status() == axum::http::StatusCode::PAYLOAD_TOO_LARGE {
        crate::error::AppError::Validation("Uploaded file exceeds the size limit".into())
    } else {
        crate::error::AppError::Validation(format!("Malformed multipart body: {}", e))
    }
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS layer - allow requests from frontend URL and localhost (for dev)
    let frontend_url = state.config.frontend_url.clone();
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::AllowOrigin::predicate(
            move |origin: &axum::http::HeaderValue, _request_parts: &axum::http::request::Parts| {
                let origin_str = origin.to_str().unwrap_or("");
                origin_str == frontend_url
                    || origin_str.starts_with("http://localhost")
                    || origin_str.starts_with("http://127.0.0.1")
            },
        ))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .merge(users::public_routes());

    // Routes that personalize output when a valid token is present but never
    // reject anonymous callers
    let optional_routes = users::optional_routes()
        .merge(videos::optional_routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), optional_auth));

    // Protected routes (auth required)
    let protected_routes = users::routes()
        .merge(videos::routes())
        .merge(comments::routes())
        .merge(likes::routes())
        .merge(tweets::routes())
        .merge(playlists::routes())
        .merge(subscriptions::routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(optional_routes)
        .merge(protected_routes)
        .layer(middleware::from_fn(
            crate::middleware::security::add_security_headers,
        ))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
