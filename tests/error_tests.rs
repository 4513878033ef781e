// SPDX-License-Identifier: MIT

//! Error envelope tests: every error renders the same JSON shape the
//! frontend dispatches on.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use vidhub::error::AppError;

async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_unauthorized_envelope() {
    let (status, json) = render(AppError::Unauthorized).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["statusCode"], 401);
    assert_eq!(json["success"], false);
    assert!(json["message"].is_string());
    assert!(json["errors"].is_array());
}

#[tokio::test]
async fn test_invalid_token_envelope() {
    let (status, json) = render(AppError::InvalidToken).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn test_not_found_envelope() {
    let (status, json) = render(AppError::NotFound("Video v1 not found".into())).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["statusCode"], 404);
    assert_eq!(json["message"], "Resource not found");
    assert_eq!(json["errors"][0], "Video v1 not found");
}

#[tokio::test]
async fn test_validation_envelope() {
    let (status, json) = render(AppError::Validation("title is required".into())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Invalid request");
    assert_eq!(json["errors"][0], "title is required");
}

#[tokio::test]
async fn test_conflict_envelope() {
    let (status, json) = render(AppError::Conflict("username already taken".into())).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["statusCode"], 409);
}

/// Internal errors never leak their cause to the client.
#[tokio::test]
async fn test_database_error_is_opaque() {
    let (status, json) =
        render(AppError::Database("connection refused at 10.0.0.3".into())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = json["message"].as_str().unwrap();
    assert!(!message.contains("10.0.0.3"));
}
