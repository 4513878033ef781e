// SPDX-License-Identifier: MIT

//! User account and session routes.
//!
//! The auth session lifecycle lives here: register, login, refresh-token
//! rotation, logout, password change, plus profile and asset updates. The
//! session state is the single refresh-token slot on the user record: a new
//! login overwrites it, logout clears it, and a refresh must present exactly
//! the stored value.

use crate::error::{AppError, Result};
use crate::middleware::auth::{ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
use crate::middleware::{CurrentUser, MaybeUser};
use crate::models::{User, UserResponse, UserSummary};
use crate::response::ApiResponse;
use crate::routes::videos::VideoView;
use crate::AppState;
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use validator::Validate;

/// Image uploads (avatar, cover) stay well under this.
const IMAGE_UPLOAD_LIMIT_BYTES: usize = 8 * 1024 * 1024;

/// Routes open to anonymous callers.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/register", post(register))
        .route("/users/login", post(login))
        .route("/users/refresh-token", post(refresh_token))
        .layer(DefaultBodyLimit::max(IMAGE_UPLOAD_LIMIT_BYTES))
}

/// Routes that personalize output for authenticated callers.
pub fn optional_routes() -> Router<Arc<AppState>> {
    Router::new().route("/users/channel/{username}", get(get_channel_profile))
}

/// Routes requiring authentication (guard applied in routes/mod.rs).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/logout", post(logout))
        .route("/users/change-password", post(change_password))
        .route("/users/me", get(get_current_user).patch(update_profile))
        .route("/users/avatar", patch(update_avatar))
        .route("/users/cover-image", patch(update_cover_image))
        .route("/users/watch-history", get(get_watch_history))
        .layer(DefaultBodyLimit::max(IMAGE_UPLOAD_LIMIT_BYTES))
}

// ─── Registration ────────────────────────────────────────────

/// Text fields of the registration form.
#[derive(Debug, Validate)]
struct RegisterInput {
    #[validate(length(min = 1, message = "fullName is required"))]
    full_name: String,
    #[validate(email(message = "email must be a valid address"))]
    email: String,
    #[validate(length(min = 3, message = "username must be at least 3 characters"))]
    username: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    password: String,
}

/// An uploaded file pulled out of a multipart body.
struct UploadedFile {
    filename: String,
    content_type: String,
    bytes: Vec<u8>,
}

/// Collect one multipart field as an uploaded file.
async fn read_file_field(field: axum::extract::multipart::Field<'_>) -> Result<UploadedFile> {
    let filename = field
        .file_name()
        .unwrap_or("upload.bin")
        .to_string();
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let bytes = field
        .bytes()
        .await
        .map_err(super::multipart_error)?
        .to_vec();

    Ok(UploadedFile {
        filename,
        content_type,
        bytes,
    })
}

/// Register a new account (multipart: text fields + avatar, optional cover
/// image).
async fn register(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>)> {
    let mut fields: HashMap<String, String> = HashMap::new();
    let mut avatar: Option<UploadedFile> = None;
    let mut cover_image: Option<UploadedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(super::multipart_error)?
    {
        let name = match field.name() {
            Some(name) => name.to_string(),
            None => continue,
        };

        match name.as_str() {
            "avatar" => avatar = Some(read_file_field(field).await?),
            "coverImage" => cover_image = Some(read_file_field(field).await?),
            _ => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Malformed field: {}", e)))?;
                fields.insert(name, value);
            }
        }
    }

    let input = RegisterInput {
        full_name: fields.remove("fullName").unwrap_or_default(),
        email: fields.remove("email").unwrap_or_default().to_lowercase(),
        username: fields.remove("username").unwrap_or_default().to_lowercase(),
        password: fields.remove("password").unwrap_or_default(),
    };

    input
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let avatar = avatar.ok_or_else(|| AppError::Validation("Avatar file is required".into()))?;

    // Uniqueness across both identity fields
    if state
        .db
        .find_user_by_username(&input.username)
        .await?
        .is_some()
        || state.db.find_user_by_email(&input.email).await?.is_some()
    {
        return Err(AppError::Conflict(
            "User with this email or username already exists".into(),
        ));
    }

    // Uploads happen before the user write; a failure after upload leaves an
    // orphaned asset (no compensating cleanup, accepted)
    let avatar_url = state
        .media
        .upload(&avatar.filename, &avatar.content_type, avatar.bytes)
        .await?;

    let cover_image_url = match cover_image {
        Some(file) => Some(
            state
                .media
                .upload(&file.filename, &file.content_type, file.bytes)
                .await?,
        ),
        None => None,
    };

    let now = chrono::Utc::now().to_rfc3339();
    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        username: input.username,
        email: input.email,
        full_name: input.full_name,
        password_hash: crate::services::password::hash_password(&input.password)?,
        avatar: avatar_url,
        cover_image: cover_image_url,
        refresh_token: None,
        watch_history: vec![],
        created_at: now.clone(),
        updated_at: now,
    };

    state.db.upsert_user(&user).await?;

    tracing::info!(user_id = %user.id, username = %user.username, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::created(
            UserResponse::from(&user),
            "User registered successfully",
        )),
    ))
}

// ─── Login / Logout / Refresh ────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest {
    username: Option<String>,
    email: Option<String>,
    password: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginData {
    user: UserResponse,
    access_token: String,
    refresh_token: String,
}

/// Session cookie with the attributes shared by both token cookies.
fn auth_cookie(name: &'static str, value: String, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(max_age_secs))
        .build()
}

/// Expired removal cookie matching the attributes used at creation.
fn removal_cookie(name: &'static str) -> Cookie<'static> {
    auth_cookie(name, String::new(), 0)
}

/// Log in with username or email plus password. Issues a fresh access/refresh
/// pair; the refresh token is persisted on the user record, superseding any
/// previous session.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Result<(CookieJar, Json<ApiResponse<LoginData>>)> {
    let password = body
        .password
        .ok_or_else(|| AppError::Validation("password is required".into()))?;

    let mut user = match (body.username, body.email) {
        (Some(username), _) => {
            state
                .db
                .find_user_by_username(&username.to_lowercase())
                .await?
        }
        (None, Some(email)) => state.db.find_user_by_email(&email.to_lowercase()).await?,
        (None, None) => {
            return Err(AppError::Validation("username or email is required".into()))
        }
    }
    .ok_or_else(|| AppError::NotFound("User does not exist".into()))?;

    if !crate::services::password::verify_password(&password, &user.password_hash)? {
        return Err(AppError::Unauthorized);
    }

    let access_token = state.tokens.issue_access_token(&user)?;
    let refresh_token = state.tokens.issue_refresh_token(&user.id)?;

    // Last login wins: overwrite any previously stored refresh token
    user.refresh_token = Some(refresh_token.clone());
    user.updated_at = chrono::Utc::now().to_rfc3339();
    state.db.upsert_user(&user).await?;

    tracing::info!(user_id = %user.id, "User logged in");

    let jar = jar
        .add(auth_cookie(
            ACCESS_TOKEN_COOKIE,
            access_token.clone(),
            state.config.access_token_ttl_secs,
        ))
        .add(auth_cookie(
            REFRESH_TOKEN_COOKIE,
            refresh_token.clone(),
            state.config.refresh_token_ttl_secs,
        ));

    Ok((
        jar,
        Json(ApiResponse::ok(
            LoginData {
                user: UserResponse::from(&user),
                access_token,
                refresh_token,
            },
            "User logged in successfully",
        )),
    ))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest {
    refresh_token: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenPair {
    access_token: String,
    refresh_token: String,
}

/// Constant-time refresh token comparison.
fn tokens_match(presented: &str, stored: &str) -> bool {
    presented.as_bytes().ct_eq(stored.as_bytes()).into()
}

/// Exchange a refresh token for a new access/refresh pair. Single-use: the
/// new refresh token overwrites the stored one, so a superseded token can
/// never be replayed.
async fn refresh_token(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    body: axum::body::Bytes,
) -> Result<(CookieJar, Json<ApiResponse<TokenPair>>)> {
    // The token may arrive in the cookie or in an optional JSON body
    let from_body = serde_json::from_slice::<RefreshRequest>(&body)
        .ok()
        .and_then(|b| b.refresh_token);

    let presented = jar
        .get(REFRESH_TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .or(from_body)
        .ok_or(AppError::Unauthorized)?;

    let claims = state.tokens.verify_refresh_token(&presented)?;

    let mut user = state
        .db
        .get_user(&claims.sub)
        .await?
        .ok_or(AppError::InvalidToken)?;

    // Detect reuse of a superseded token: the presented value must match the
    // stored slot exactly
    let stored = user.refresh_token.as_deref().ok_or(AppError::InvalidToken)?;
    if !tokens_match(&presented, stored) {
        tracing::warn!(user_id = %user.id, "Superseded refresh token presented");
        return Err(AppError::InvalidToken);
    }

    // Rotate
    let access_token = state.tokens.issue_access_token(&user)?;
    let refresh_token = state.tokens.issue_refresh_token(&user.id)?;

    user.refresh_token = Some(refresh_token.clone());
    user.updated_at = chrono::Utc::now().to_rfc3339();
    state.db.upsert_user(&user).await?;

    let jar = jar
        .add(auth_cookie(
            ACCESS_TOKEN_COOKIE,
            access_token.clone(),
            state.config.access_token_ttl_secs,
        ))
        .add(auth_cookie(
            REFRESH_TOKEN_COOKIE,
            refresh_token.clone(),
            state.config.refresh_token_ttl_secs,
        ));

    Ok((
        jar,
        Json(ApiResponse::ok(
            TokenPair {
                access_token,
                refresh_token,
            },
            "Tokens refreshed successfully",
        )),
    ))
}

/// Clear the stored refresh token and both cookies. Idempotent: logging out
/// twice is not an error.
async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Extension(CurrentUser(mut user)): Extension<CurrentUser>,
) -> Result<(CookieJar, Json<ApiResponse<Option<()>>>)> {
    if user.refresh_token.is_some() {
        user.refresh_token = None;
        user.updated_at = chrono::Utc::now().to_rfc3339();
        state.db.upsert_user(&user).await?;
    }

    let jar = jar
        .add(removal_cookie(ACCESS_TOKEN_COOKIE))
        .add(removal_cookie(REFRESH_TOKEN_COOKIE));

    tracing::info!(user_id = %user.id, "User logged out");

    Ok((
        jar,
        Json(ApiResponse::ok(None, "User logged out successfully")),
    ))
}

// ─── Password & Profile ──────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangePasswordRequest {
    old_password: Option<String>,
    new_password: Option<String>,
}

/// Change the caller's password. The stored refresh token is deliberately
/// left untouched: existing sessions survive a password change.
async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(mut user)): Extension<CurrentUser>,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<Option<()>>>> {
    let old_password = body
        .old_password
        .ok_or_else(|| AppError::Validation("oldPassword is required".into()))?;
    let new_password = body
        .new_password
        .ok_or_else(|| AppError::Validation("newPassword is required".into()))?;

    if new_password.len() < 8 {
        return Err(AppError::Validation(
            "newPassword must be at least 8 characters".into(),
        ));
    }

    if !crate::services::password::verify_password(&old_password, &user.password_hash)? {
        return Err(AppError::Unauthorized);
    }

    user.password_hash = crate::services::password::hash_password(&new_password)?;
    user.updated_at = chrono::Utc::now().to_rfc3339();
    state.db.upsert_user(&user).await?;

    tracing::info!(user_id = %user.id, "Password changed");

    Ok(Json(ApiResponse::ok(None, "Password changed successfully")))
}

/// Return the caller's own profile as resolved by the auth guard.
async fn get_current_user(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Json<ApiResponse<UserResponse>> {
    Json(ApiResponse::ok(
        UserResponse::from(&user),
        "Current user fetched successfully",
    ))
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct UpdateProfileRequest {
    full_name: Option<String>,
    #[validate(email(message = "email must be a valid address"))]
    email: Option<String>,
}

/// Update mutable profile fields (display name and/or email).
async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(mut user)): Extension<CurrentUser>,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<UserResponse>>> {
    if body.full_name.is_none() && body.email.is_none() {
        return Err(AppError::Validation(
            "At least one of fullName or email is required".into(),
        ));
    }

    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    if let Some(full_name) = body.full_name {
        user.full_name = full_name;
    }
    if let Some(email) = body.email {
        let email = email.to_lowercase();
        if email != user.email {
            if state.db.find_user_by_email(&email).await?.is_some() {
                return Err(AppError::Conflict(
                    "User with this email already exists".into(),
                ));
            }
            user.email = email;
        }
    }

    user.updated_at = chrono::Utc::now().to_rfc3339();
    state.db.upsert_user(&user).await?;

    Ok(Json(ApiResponse::ok(
        UserResponse::from(&user),
        "Profile updated successfully",
    )))
}

/// Pull the single file out of a multipart body, whatever its field name.
async fn read_single_file(mut multipart: Multipart) -> Result<UploadedFile> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(super::multipart_error)?
    {
        if field.file_name().is_some() {
            return read_file_field(field).await;
        }
    }
    Err(AppError::Validation("A file is required".into()))
}

/// Replace the caller's avatar.
async fn update_avatar(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(mut user)): Extension<CurrentUser>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<UserResponse>>> {
    let file = read_single_file(multipart).await?;
    let url = state
        .media
        .upload(&file.filename, &file.content_type, file.bytes)
        .await?;

    user.avatar = url;
    user.updated_at = chrono::Utc::now().to_rfc3339();
    state.db.upsert_user(&user).await?;

    Ok(Json(ApiResponse::ok(
        UserResponse::from(&user),
        "Avatar updated successfully",
    )))
}

/// Replace the caller's cover image.
async fn update_cover_image(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(mut user)): Extension<CurrentUser>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<UserResponse>>> {
    let file = read_single_file(multipart).await?;
    let url = state
        .media
        .upload(&file.filename, &file.content_type, file.bytes)
        .await?;

    user.cover_image = Some(url);
    user.updated_at = chrono::Utc::now().to_rfc3339();
    state.db.upsert_user(&user).await?;

    Ok(Json(ApiResponse::ok(
        UserResponse::from(&user),
        "Cover image updated successfully",
    )))
}

// ─── Channel Profile & Watch History ─────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChannelProfile {
    id: String,
    username: String,
    full_name: String,
    avatar: String,
    cover_image: Option<String>,
    subscribers_count: usize,
    subscribed_to_count: usize,
    /// Present only for authenticated callers
    is_subscribed: Option<bool>,
}

/// Public channel profile with subscriber counts. When the caller is
/// authenticated, also reports whether they subscribe to this channel.
async fn get_channel_profile(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
    Extension(MaybeUser(caller)): Extension<MaybeUser>,
) -> Result<Json<ApiResponse<ChannelProfile>>> {
    let channel = state
        .db
        .find_user_by_username(&username.to_lowercase())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Channel {} not found", username)))?;

    let subscribers = state.db.list_subscriptions_for_channel(&channel.id).await?;
    let subscribed_to = state
        .db
        .list_subscriptions_for_subscriber(&channel.id)
        .await?;

    let is_subscribed = match caller {
        Some(caller) => Some(
            state
                .db
                .find_subscription(&caller.id, &channel.id)
                .await?
                .is_some(),
        ),
        None => None,
    };

    Ok(Json(ApiResponse::ok(
        ChannelProfile {
            id: channel.id.clone(),
            username: channel.username.clone(),
            full_name: channel.full_name.clone(),
            avatar: channel.avatar.clone(),
            cover_image: channel.cover_image.clone(),
            subscribers_count: subscribers.len(),
            subscribed_to_count: subscribed_to.len(),
            is_subscribed,
        },
        "Channel profile fetched successfully",
    )))
}

/// The caller's watch history, most recently watched first, each entry joined
/// with its owner's public profile.
async fn get_watch_history(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<VideoView>>>> {
    // History is stored oldest-first; most recent watch comes last
    let mut ids = user.watch_history.clone();
    ids.reverse();

    let videos = state.db.get_videos_by_ids(&ids).await?;

    let mut owner_ids: Vec<String> = videos.iter().map(|v| v.owner.clone()).collect();
    owner_ids.sort();
    owner_ids.dedup();
    let owners = state.db.get_users_by_ids(&owner_ids).await?;
    let owners_by_id: HashMap<String, UserSummary> = owners
        .iter()
        .map(|u| (u.id.clone(), UserSummary::from(u)))
        .collect();

    let history: Vec<VideoView> = videos
        .iter()
        .filter_map(|video| {
            owners_by_id
                .get(&video.owner)
                .map(|owner| VideoView::new(video, owner.clone()))
        })
        .collect();

    Ok(Json(ApiResponse::ok(
        history,
        "Watch history fetched successfully",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_match_exact() {
        assert!(tokens_match("abc.def.ghi", "abc.def.ghi"));
        assert!(!tokens_match("abc.def.ghi", "abc.def.ghx"));
        assert!(!tokens_match("abc", "abcd"));
        assert!(!tokens_match("", "x"));
    }

    #[test]
    fn test_auth_cookie_attributes() {
        let cookie = auth_cookie(ACCESS_TOKEN_COOKIE, "token".to_string(), 900);
        let rendered = cookie.to_string();
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("Secure"));
        assert!(rendered.contains("SameSite=Lax"));
        assert!(rendered.contains("Path=/"));
        assert!(rendered.contains("Max-Age=900"));
    }

    #[test]
    fn test_removal_cookie_expires() {
        let cookie = removal_cookie(REFRESH_TOKEN_COOKIE);
        let rendered = cookie.to_string();
        assert!(rendered.contains("Max-Age=0"));
    }

    #[test]
    fn test_register_input_validation() {
        let valid = RegisterInput {
            full_name: "Ada L.".into(),
            email: "ada@x.com".into(),
            username: "ada".into(),
            password: "p@ss1234".into(),
        };
        assert!(valid.validate().is_ok());

        let bad_email = RegisterInput {
            email: "not-an-email".into(),
            ..valid_clone(&valid)
        };
        assert!(bad_email.validate().is_err());

        let short_password = RegisterInput {
            password: "short".into(),
            ..valid_clone(&valid)
        };
        assert!(short_password.validate().is_err());
    }

    fn valid_clone(input: &RegisterInput) -> RegisterInput {
        RegisterInput {
            full_name: input.full_name.clone(),
            email: input.email.clone(),
            username: input.username.clone(),
            password: input.password.clone(),
        }
    }
}
