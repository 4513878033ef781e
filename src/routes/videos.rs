// SPDX-License-Identifier: MIT

//! Video metadata routes.
//!
//! Binary assets go to the media store; Firestore holds the metadata. A video
//! fetch bumps the view counter and, for authenticated callers, appends to
//! their watch history.

use crate::error::{AppError, Result};
use crate::middleware::{CurrentUser, MaybeUser};
use crate::models::{UserSummary, Video};
use crate::response::ApiResponse;
use crate::AppState;
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Max items per page.
const MAX_LIMIT: u32 = 100;
/// How many candidates a title-substring search scans. Firestore has no
/// substring queries, so the filter runs client-side over this window.
const TEXT_QUERY_SCAN_LIMIT: u32 = 500;
/// Cap for multipart bodies carrying video files.
const VIDEO_UPLOAD_LIMIT_BYTES: usize = 256 * 1024 * 1024;

/// Routes readable by anonymous callers (optional auth applied in
/// routes/mod.rs).
pub fn optional_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/videos", get(list_videos))
        .route("/videos/{id}", get(get_video))
}

/// Routes requiring authentication.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/videos", post(publish_video))
        .route("/videos/{id}", patch(update_video).delete(delete_video))
        .route("/videos/{id}/toggle-publish", patch(toggle_publish_status))
        .layer(DefaultBodyLimit::max(VIDEO_UPLOAD_LIMIT_BYTES))
}

/// Video joined with its owner's public profile.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoView {
    pub id: String,
    pub video_file: String,
    pub thumbnail: String,
    pub title: String,
    pub description: String,
    pub duration: f64,
    pub views: u64,
    pub is_published: bool,
    pub created_at: String,
    pub owner: UserSummary,
}

impl VideoView {
    pub fn new(video: &Video, owner: UserSummary) -> Self {
        Self {
            id: video.id.clone(),
            video_file: video.video_file.clone(),
            thumbnail: video.thumbnail.clone(),
            title: video.title.clone(),
            description: video.description.clone(),
            duration: video.duration,
            views: video.views,
            is_published: video.is_published,
            created_at: video.created_at.clone(),
            owner,
        }
    }
}

/// Join a batch of videos with their owners' public profiles.
async fn join_owners(state: &AppState, videos: &[Video]) -> Result<Vec<VideoView>> {
    let mut owner_ids: Vec<String> = videos.iter().map(|v| v.owner.clone()).collect();
    owner_ids.sort();
    owner_ids.dedup();

    let owners = state.db.get_users_by_ids(&owner_ids).await?;
    let owners_by_id: HashMap<String, UserSummary> = owners
        .iter()
        .map(|u| (u.id.clone(), UserSummary::from(u)))
        .collect();

    Ok(videos
        .iter()
        .filter_map(|video| {
            owners_by_id
                .get(&video.owner)
                .map(|owner| VideoView::new(video, owner.clone()))
        })
        .collect())
}

// ─── Listing ─────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoListQuery {
    /// Title substring filter
    query: Option<String>,
    sort_by: Option<String>,
    sort_type: Option<String>,
    /// Filter by owner
    user_id: Option<String>,
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

/// Map an API sort field to the document field, rejecting unknown fields.
fn parse_sort_field(sort_by: Option<&str>) -> Result<&'static str> {
    match sort_by {
        None | Some("createdAt") => Ok("created_at"),
        Some("views") => Ok("views"),
        Some("title") => Ok("title"),
        Some(other) => Err(AppError::Validation(format!(
            "Invalid sortBy field: {}",
            other
        ))),
    }
}

fn parse_sort_descending(sort_type: Option<&str>) -> Result<bool> {
    match sort_type {
        None | Some("desc") => Ok(true),
        Some("asc") => Ok(false),
        Some(other) => Err(AppError::Validation(format!("Invalid sortType: {}", other))),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VideoListData {
    videos: Vec<VideoView>,
    page: u32,
    limit: u32,
}

/// List published videos with filtering, sorting and pagination.
async fn list_videos(
    State(state): State<Arc<AppState>>,
    Query(params): Query<VideoListQuery>,
) -> Result<Json<ApiResponse<VideoListData>>> {
    let order_field = parse_sort_field(params.sort_by.as_deref())?;
    let descending = parse_sort_descending(params.sort_type.as_deref())?;

    let page = params.page.max(1);
    let limit = params.limit.clamp(1, MAX_LIMIT);
    let offset = super::page_offset(page, limit)?;

    let videos = match params.query {
        Some(ref text) if !text.is_empty() => {
            // Client-side substring filter over a bounded scan window
            let needle = text.to_lowercase();
            let candidates = state
                .db
                .list_videos(
                    params.user_id.clone(),
                    true,
                    order_field,
                    descending,
                    TEXT_QUERY_SCAN_LIMIT,
                    0,
                )
                .await?;
            candidates
                .into_iter()
                .filter(|v| v.title.to_lowercase().contains(&needle))
                .skip(offset as usize)
                .take(limit as usize)
                .collect()
        }
        _ => {
            state
                .db
                .list_videos(
                    params.user_id.clone(),
                    true,
                    order_field,
                    descending,
                    limit,
                    offset,
                )
                .await?
        }
    };

    let videos = join_owners(&state, &videos).await?;

    Ok(Json(ApiResponse::ok(
        VideoListData {
            videos,
            page,
            limit,
        },
        "Videos fetched successfully",
    )))
}

// ─── Fetch ───────────────────────────────────────────────────

/// Fetch a single video. Bumps the view counter (last-write-wins, no
/// optimistic concurrency) and records the watch for authenticated callers.
async fn get_video(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Extension(MaybeUser(caller)): Extension<MaybeUser>,
) -> Result<Json<ApiResponse<VideoView>>> {
    let mut video = state
        .db
        .get_video(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Video {} not found", id)))?;

    video.views += 1;
    state.db.upsert_video(&video).await?;

    if let Some(mut caller) = caller {
        caller.watch_history.push(video.id.clone());
        caller.updated_at = chrono::Utc::now().to_rfc3339();
        state.db.upsert_user(&caller).await?;
    }

    let owner = state
        .db
        .get_user(&video.owner)
        .await?
        .ok_or_else(|| AppError::NotFound("Video owner not found".into()))?;

    Ok(Json(ApiResponse::ok(
        VideoView::new(&video, UserSummary::from(&owner)),
        "Video fetched successfully",
    )))
}

// ─── Publish / Update / Delete ───────────────────────────────

/// Collected multipart form for publish/update.
struct VideoForm {
    fields: HashMap<String, String>,
    video_file: Option<(String, String, Vec<u8>)>,
    thumbnail: Option<(String, String, Vec<u8>)>,
}

async fn read_video_form(mut multipart: Multipart) -> Result<VideoForm> {
    let mut form = VideoForm {
        fields: HashMap::new(),
        video_file: None,
        thumbnail: None,
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(super::multipart_error)?
    {
        let name = match field.name() {
            Some(name) => name.to_string(),
            None => continue,
        };

        if name == "videoFile" || name == "thumbnail" {
            let filename = field.file_name().unwrap_or("upload.bin").to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(super::multipart_error)?
                .to_vec();

            if name == "videoFile" {
                form.video_file = Some((filename, content_type, bytes));
            } else {
                form.thumbnail = Some((filename, content_type, bytes));
            }
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::Validation(format!("Malformed field: {}", e)))?;
            form.fields.insert(name, value);
        }
    }

    Ok(form)
}

async fn upload_asset(state: &AppState, file: (String, String, Vec<u8>)) -> Result<String> {
    let (filename, content_type, bytes) = file;
    state.media.upload(&filename, &content_type, bytes).await
}

/// Publish a new video (multipart: videoFile + thumbnail + title/description).
async fn publish_video(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<Video>>)> {
    let mut form = read_video_form(multipart).await?;

    let title = form
        .fields
        .remove("title")
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Validation("title is required".into()))?;
    let description = form
        .fields
        .remove("description")
        .filter(|d| !d.is_empty())
        .ok_or_else(|| AppError::Validation("description is required".into()))?;
    let duration: f64 = form
        .fields
        .remove("duration")
        .and_then(|d| d.parse().ok())
        .unwrap_or(0.0);

    let video_file = form
        .video_file
        .take()
        .ok_or_else(|| AppError::Validation("videoFile is required".into()))?;
    let thumbnail = form
        .thumbnail
        .take()
        .ok_or_else(|| AppError::Validation("thumbnail is required".into()))?;

    let video_url = upload_asset(&state, video_file).await?;
    let thumbnail_url = upload_asset(&state, thumbnail).await?;

    let now = chrono::Utc::now().to_rfc3339();
    let video = Video {
        id: uuid::Uuid::new_v4().to_string(),
        owner: user.id.clone(),
        video_file: video_url,
        thumbnail: thumbnail_url,
        title,
        description,
        duration,
        views: 0,
        is_published: true,
        created_at: now.clone(),
        updated_at: now,
    };

    state.db.upsert_video(&video).await?;

    tracing::info!(video_id = %video.id, owner = %user.id, "Video published");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::created(video, "Video published successfully")),
    ))
}

/// Update a video's title, description, and optionally its thumbnail.
async fn update_video(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Extension(CurrentUser(_user)): Extension<CurrentUser>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<Video>>> {
    let mut form = read_video_form(multipart).await?;

    let title = form
        .fields
        .remove("title")
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Validation("title is required".into()))?;
    let description = form
        .fields
        .remove("description")
        .filter(|d| !d.is_empty())
        .ok_or_else(|| AppError::Validation("description is required".into()))?;

    let mut video = state
        .db
        .get_video(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Video {} not found", id)))?;

    video.title = title;
    video.description = description;
    if let Some(thumbnail) = form.thumbnail.take() {
        video.thumbnail = upload_asset(&state, thumbnail).await?;
    }
    video.updated_at = chrono::Utc::now().to_rfc3339();

    state.db.upsert_video(&video).await?;

    Ok(Json(ApiResponse::ok(video, "Video updated successfully")))
}

/// Delete a video.
async fn delete_video(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Video>>> {
    let video = state
        .db
        .get_video(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Video {} not found", id)))?;

    state.db.delete_video(&id).await?;

    Ok(Json(ApiResponse::ok(video, "Video deleted successfully")))
}

/// Flip a video's publish flag.
async fn toggle_publish_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Video>>> {
    let mut video = state
        .db
        .get_video(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Video {} not found", id)))?;

    video.is_published = !video.is_published;
    video.updated_at = chrono::Utc::now().to_rfc3339();
    state.db.upsert_video(&video).await?;

    Ok(Json(ApiResponse::ok(
        video,
        "Publish status updated successfully",
    )))
}
