// SPDX-License-Identifier: MIT

//! Playlist routes: named, ordered collections of video IDs.

use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::models::Playlist;
use crate::response::ApiResponse;
use crate::routes::videos::VideoView;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/playlists", post(create_playlist))
        .route(
            "/playlists/{playlist_id}",
            get(get_playlist).patch(update_playlist).delete(delete_playlist),
        )
        .route("/playlists/user/{user_id}", get(get_user_playlists))
        .route(
            "/playlists/add/{video_id}/{playlist_id}",
            patch(add_video_to_playlist),
        )
        .route(
            "/playlists/remove/{video_id}/{playlist_id}",
            patch(remove_video_from_playlist),
        )
}

#[derive(Deserialize)]
struct PlaylistRequest {
    name: String,
    description: String,
}

fn validate_playlist_fields(name: &str, description: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("name is required".into()));
    }
    if description.trim().is_empty() {
        return Err(AppError::Validation("description is required".into()));
    }
    Ok(())
}

async fn create_playlist(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(body): Json<PlaylistRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Playlist>>)> {
    validate_playlist_fields(&body.name, &body.description)?;

    let now = chrono::Utc::now().to_rfc3339();
    let playlist = Playlist {
        id: uuid::Uuid::new_v4().to_string(),
        owner: user.id.clone(),
        name: body.name,
        description: body.description,
        videos: Vec::new(),
        created_at: now.clone(),
        updated_at: now,
    };

    state.db.upsert_playlist(&playlist).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::created(
            playlist,
            "Playlist created successfully",
        )),
    ))
}

/// Playlist with its video entries expanded into full views. Deleted videos
/// still referenced by the list are skipped.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistView {
    id: String,
    owner: String,
    name: String,
    description: String,
    videos: Vec<VideoView>,
    created_at: String,
}

async fn expand_playlist(state: &AppState, playlist: &Playlist) -> Result<PlaylistView> {
    let videos = state.db.get_videos_by_ids(&playlist.videos).await?;

    let mut owner_ids: Vec<String> = videos.iter().map(|v| v.owner.clone()).collect();
    owner_ids.sort();
    owner_ids.dedup();
    let owners = state.db.get_users_by_ids(&owner_ids).await?;
    let owners_by_id: HashMap<String, crate::models::UserSummary> = owners
        .iter()
        .map(|u| (u.id.clone(), crate::models::UserSummary::from(u)))
        .collect();

    let videos = videos
        .iter()
        .filter_map(|video| {
            owners_by_id
                .get(&video.owner)
                .map(|owner| VideoView::new(video, owner.clone()))
        })
        .collect();

    Ok(PlaylistView {
        id: playlist.id.clone(),
        owner: playlist.owner.clone(),
        name: playlist.name.clone(),
        description: playlist.description.clone(),
        videos,
        created_at: playlist.created_at.clone(),
    })
}

async fn get_playlist(
    State(state): State<Arc<AppState>>,
    Path(playlist_id): Path<String>,
) -> Result<Json<ApiResponse<PlaylistView>>> {
    let playlist = state
        .db
        .get_playlist(&playlist_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Playlist {} not found", playlist_id)))?;

    let view = expand_playlist(&state, &playlist).await?;

    Ok(Json(ApiResponse::ok(view, "Playlist fetched successfully")))
}

async fn get_user_playlists(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<Playlist>>>> {
    state
        .db
        .get_user(&user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

    let playlists = state.db.list_playlists_for_user(&user_id).await?;

    Ok(Json(ApiResponse::ok(
        playlists,
        "Playlists fetched successfully",
    )))
}

/// Load a playlist owned by the caller; others' playlists read as not found.
async fn get_own_playlist(
    state: &AppState,
    playlist_id: &str,
    user_id: &str,
) -> Result<Playlist> {
    let playlist = state
        .db
        .get_playlist(playlist_id)
        .await?
        .filter(|p| p.owner == user_id)
        .ok_or_else(|| AppError::NotFound(format!("Playlist {} not found", playlist_id)))?;
    Ok(playlist)
}

/// Append a video to a playlist. Adding a video already present is a no-op
/// (no duplicate entries).
async fn add_video_to_playlist(
    State(state): State<Arc<AppState>>,
    Path((video_id, playlist_id)): Path<(String, String)>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Playlist>>> {
    let mut playlist = get_own_playlist(&state, &playlist_id, &user.id).await?;

    state
        .db
        .get_video(&video_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Video {} not found", video_id)))?;

    if !playlist.videos.contains(&video_id) {
        playlist.videos.push(video_id);
        playlist.updated_at = chrono::Utc::now().to_rfc3339();
        state.db.upsert_playlist(&playlist).await?;
    }

    Ok(Json(ApiResponse::ok(
        playlist,
        "Video added to playlist successfully",
    )))
}

/// Remove a video from a playlist. Removing an absent video is a no-op.
async fn remove_video_from_playlist(
    State(state): State<Arc<AppState>>,
    Path((video_id, playlist_id)): Path<(String, String)>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Playlist>>> {
    let mut playlist = get_own_playlist(&state, &playlist_id, &user.id).await?;

    if playlist.videos.iter().any(|v| v == &video_id) {
        playlist.videos.retain(|v| v != &video_id);
        playlist.updated_at = chrono::Utc::now().to_rfc3339();
        state.db.upsert_playlist(&playlist).await?;
    }

    Ok(Json(ApiResponse::ok(
        playlist,
        "Video removed from playlist successfully",
    )))
}

async fn update_playlist(
    State(state): State<Arc<AppState>>,
    Path(playlist_id): Path<String>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(body): Json<PlaylistRequest>,
) -> Result<Json<ApiResponse<Playlist>>> {
    validate_playlist_fields(&body.name, &body.description)?;

    let mut playlist = get_own_playlist(&state, &playlist_id, &user.id).await?;
    playlist.name = body.name;
    playlist.description = body.description;
    playlist.updated_at = chrono::Utc::now().to_rfc3339();

    state.db.upsert_playlist(&playlist).await?;

    Ok(Json(ApiResponse::ok(
        playlist,
        "Playlist updated successfully",
    )))
}

async fn delete_playlist(
    State(state): State<Arc<AppState>>,
    Path(playlist_id): Path<String>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Playlist>>> {
    let playlist = get_own_playlist(&state, &playlist_id, &user.id).await?;

    state.db.delete_playlist(&playlist_id).await?;

    Ok(Json(ApiResponse::ok(
        playlist,
        "Playlist deleted successfully",
    )))
}
