// SPDX-License-Identifier: MIT

//! End-to-end auth session lifecycle against the Firestore emulator:
//! register, login, refresh rotation, replay detection, logout, password
//! change. Skipped unless FIRESTORE_EMULATOR_HOST is set.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use tower::ServiceExt;

mod common;

const BOUNDARY: &str = "integration-test-boundary";

fn text_part(name: &str, value: &str) -> String {
    format!(
        "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
        BOUNDARY, name, value
    )
}

fn file_part(name: &str, filename: &str) -> String {
    format!(
        "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
         Content-Type: image/png\r\n\r\nfakebytes\r\n",
        BOUNDARY, name, filename
    )
}

fn register_body(username: &str, email: &str, password: &str) -> String {
    let mut body = String::new();
    body.push_str(&text_part("fullName", "Integration Tester"));
    body.push_str(&text_part("username", username));
    body.push_str(&text_part("email", email));
    body.push_str(&text_part("password", password));
    body.push_str(&file_part("avatar", "avatar.png"));
    body.push_str(&format!("--{}--\r\n", BOUNDARY));
    body
}

/// Pull a cookie value out of the response's Set-Cookie headers.
fn cookie_value(response: &axum::response::Response, name: &str) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&format!("{}=", name)))
        .and_then(|v| v.split(';').next())
        .and_then(|kv| kv.split('=').nth(1))
        .map(|v| v.to_string())
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_full_session_lifecycle() {
    require_emulator!();

    let (app, _state) = common::create_emulator_app().await;

    let run = uuid::Uuid::new_v4().simple().to_string();
    let username = format!("lifecycle{}", &run[..8]);
    let email = format!("{}@example.com", username);
    let password = "correct-horse-battery";

    // Register
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/users/register")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(register_body(&username, &email, password)))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["username"], username);
    assert!(json["data"]["password"].is_null());
    assert!(json["data"]["passwordHash"].is_null());

    // Duplicate registration conflicts
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/users/register")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(register_body(&username, &email, password)))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Login with wrong password
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/users/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(format!(
                    r#"{{"username": "{}", "password": "wrong"}}"#,
                    username
                )))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Login
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/users/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(format!(
                    r#"{{"username": "{}", "password": "{}"}}"#,
                    username, password
                )))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let access = cookie_value(&response, "accessToken").unwrap();
    let refresh = cookie_value(&response, "refreshToken").unwrap();
    let json = body_json(response).await;
    assert_eq!(json["data"]["user"]["email"], email);
    assert!(json["data"]["accessToken"].is_string());

    // Authenticated profile fetch
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/users/me")
                .header(header::COOKIE, format!("accessToken={}", access))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Refresh rotates the token
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/users/refresh-token")
                .header(header::COOKIE, format!("refreshToken={}", refresh))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let rotated = cookie_value(&response, "refreshToken").unwrap();
    assert_ne!(rotated, refresh);

    // Replaying the superseded token fails
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/users/refresh-token")
                .header(header::COOKIE, format!("refreshToken={}", refresh))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // The rotated token still works
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/users/refresh-token")
                .header(header::COOKIE, format!("refreshToken={}", rotated))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let current = cookie_value(&response, "refreshToken").unwrap();

    // Change password (old required)
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/users/change-password")
                .header(header::COOKIE, format!("accessToken={}", access))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(format!(
                    r#"{{"oldPassword": "{}", "newPassword": "even-more-secret-99"}}"#,
                    password
                )))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Old password no longer logs in
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/users/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(format!(
                    r#"{{"username": "{}", "password": "{}"}}"#,
                    username, password
                )))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Logout clears the session
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/users/logout")
                .header(header::COOKIE, format!("accessToken={}", access))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The refresh token that survived rotation is now dead
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/users/refresh-token")
                .header(header::COOKIE, format!("refreshToken={}", current))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Logout is idempotent
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/users/logout")
                .header(header::COOKIE, format!("accessToken={}", access))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
