// SPDX-License-Identifier: MIT

//! Comment routes: threaded discussion on videos.

use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::models::{Comment, UserSummary};
use crate::response::ApiResponse;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

const MAX_LIMIT: u32 = 100;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/comments/{video_id}",
            get(get_video_comments).post(add_comment),
        )
        .route(
            "/comments/c/{comment_id}",
            patch(update_comment).delete(delete_comment),
        )
}

/// Comment joined with its author's public profile.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct CommentView {
    id: String,
    video: String,
    content: String,
    created_at: String,
    owner: UserSummary,
}

impl CommentView {
    fn new(comment: &Comment, owner: UserSummary) -> Self {
        Self {
            id: comment.id.clone(),
            video: comment.video.clone(),
            content: comment.content.clone(),
            created_at: comment.created_at.clone(),
            owner,
        }
    }
}

#[derive(Deserialize)]
struct PageQuery {
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default = "default_limit")]
    limit: u32,
}

fn default_page() -> u32 {
    1
}
fn default_limit() -> u32 {
    10
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CommentListData {
    comments: Vec<CommentView>,
    page: u32,
    limit: u32,
}

/// List a video's comments, newest first.
async fn get_video_comments(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
    Query(params): Query<PageQuery>,
) -> Result<Json<ApiResponse<CommentListData>>> {
    state
        .db
        .get_video(&video_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Video {} not found", video_id)))?;

    let page = params.page.max(1);
    let limit = params.limit.clamp(1, MAX_LIMIT);
    let offset = super::page_offset(page, limit)?;

    let comments = state
        .db
        .list_comments_for_video(&video_id, limit, offset)
        .await?;

    let mut owner_ids: Vec<String> = comments.iter().map(|c| c.owner.clone()).collect();
    owner_ids.sort();
    owner_ids.dedup();
    let owners = state.db.get_users_by_ids(&owner_ids).await?;
    let owners_by_id: HashMap<String, UserSummary> = owners
        .iter()
        .map(|u| (u.id.clone(), UserSummary::from(u)))
        .collect();

    let comments = comments
        .iter()
        .filter_map(|comment| {
            owners_by_id
                .get(&comment.owner)
                .map(|owner| CommentView::new(comment, owner.clone()))
        })
        .collect();

    Ok(Json(ApiResponse::ok(
        CommentListData {
            comments,
            page,
            limit,
        },
        "Comments fetched successfully",
    )))
}

#[derive(Deserialize)]
struct CommentRequest {
    content: String,
}

/// Add a comment to a video.
async fn add_comment(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(body): Json<CommentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Comment>>)> {
    if body.content.trim().is_empty() {
        return Err(AppError::Validation("content is required".into()));
    }

    state
        .db
        .get_video(&video_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Video {} not found", video_id)))?;

    let now = chrono::Utc::now().to_rfc3339();
    let comment = Comment {
        id: uuid::Uuid::new_v4().to_string(),
        video: video_id,
        owner: user.id.clone(),
        content: body.content,
        created_at: now.clone(),
        updated_at: now,
    };

    state.db.upsert_comment(&comment).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::created(comment, "Comment added successfully")),
    ))
}

/// Load a comment owned by the caller. Others' comments are reported as
/// not found rather than leaking their existence.
async fn get_own_comment(state: &AppState, comment_id: &str, user_id: &str) -> Result<Comment> {
    let comment = state
        .db
        .get_comment(comment_id)
        .await?
        .filter(|c| c.owner == user_id)
        .ok_or_else(|| AppError::NotFound(format!("Comment {} not found", comment_id)))?;
    Ok(comment)
}

/// Edit one's own comment.
async fn update_comment(
    State(state): State<Arc<AppState>>,
    Path(comment_id): Path<String>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(body): Json<CommentRequest>,
) -> Result<Json<ApiResponse<Comment>>> {
    if body.content.trim().is_empty() {
        return Err(AppError::Validation("content is required".into()));
    }

    let mut comment = get_own_comment(&state, &comment_id, &user.id).await?;
    comment.content = body.content;
    comment.updated_at = chrono::Utc::now().to_rfc3339();

    state.db.upsert_comment(&comment).await?;

    Ok(Json(ApiResponse::ok(
        comment,
        "Comment updated successfully",
    )))
}

/// Delete one's own comment.
async fn delete_comment(
    State(state): State<Arc<AppState>>,
    Path(comment_id): Path<String>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Comment>>> {
    let comment = get_own_comment(&state, &comment_id, &user.id).await?;

    state.db.delete_comment(&comment_id).await?;

    Ok(Json(ApiResponse::ok(
        comment,
        "Comment deleted successfully",
    )))
}
