// SPDX-License-Identifier: MIT

//! Like routes.
//!
//! Toggle semantics throughout: if the (user, target) like exists it is
//! removed, otherwise created. Targets are validated before the toggle so a
//! like never points at a missing entity.

use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::models::{Like, LikeTarget};
use crate::response::ApiResponse;
use crate::routes::videos::VideoView;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/likes/toggle/v/{video_id}", post(toggle_video_like))
        .route("/likes/toggle/c/{comment_id}", post(toggle_comment_like))
        .route("/likes/toggle/t/{tweet_id}", post(toggle_tweet_like))
        .route("/likes/videos", get(get_liked_videos))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LikeToggleData {
    liked: bool,
}

/// Shared toggle: remove an existing like (200) or place a new one (201).
async fn toggle_like(state: &AppState, user_id: &str, target: LikeTarget) -> Result<Response> {
    if let Some(existing) = state.db.find_like(user_id, &target).await? {
        state.db.delete_like(&existing.id).await?;
        return Ok(
            Json(ApiResponse::ok(LikeToggleData { liked: false }, "Like removed")).into_response(),
        );
    }

    let like = Like::new(
        uuid::Uuid::new_v4().to_string(),
        user_id.to_string(),
        &target,
        chrono::Utc::now().to_rfc3339(),
    );
    state.db.upsert_like(&like).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::created(LikeToggleData { liked: true }, "Like added")),
    )
        .into_response())
}

async fn toggle_video_like(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Response> {
    state
        .db
        .get_video(&video_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Video {} not found", video_id)))?;

    toggle_like(&state, &user.id, LikeTarget::Video(video_id)).await
}

async fn toggle_comment_like(
    State(state): State<Arc<AppState>>,
    Path(comment_id): Path<String>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Response> {
    state
        .db
        .get_comment(&comment_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Comment {} not found", comment_id)))?;

    toggle_like(&state, &user.id, LikeTarget::Comment(comment_id)).await
}

async fn toggle_tweet_like(
    State(state): State<Arc<AppState>>,
    Path(tweet_id): Path<String>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Response> {
    state
        .db
        .get_tweet(&tweet_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Tweet {} not found", tweet_id)))?;

    toggle_like(&state, &user.id, LikeTarget::Tweet(tweet_id)).await
}

/// The caller's liked videos, newest like first, joined with video details.
/// Likes whose video has since been deleted or unpublished are dropped.
async fn get_liked_videos(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<VideoView>>>> {
    let likes = state.db.list_likes_by_user(&user.id).await?;

    let video_ids: Vec<String> = likes.iter().filter_map(|l| l.video.clone()).collect();
    let videos = state.db.get_videos_by_ids(&video_ids).await?;

    let mut owner_ids: Vec<String> = videos.iter().map(|v| v.owner.clone()).collect();
    owner_ids.sort();
    owner_ids.dedup();
    let owners = state.db.get_users_by_ids(&owner_ids).await?;
    let owners_by_id: HashMap<String, crate::models::UserSummary> = owners
        .iter()
        .map(|u| (u.id.clone(), crate::models::UserSummary::from(u)))
        .collect();

    let views = videos
        .iter()
        .filter(|v| v.is_published)
        .filter_map(|video| {
            owners_by_id
                .get(&video.owner)
                .map(|owner| VideoView::new(video, owner.clone()))
        })
        .collect();

    Ok(Json(ApiResponse::ok(
        views,
        "Liked videos fetched successfully",
    )))
}
