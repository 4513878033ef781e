// SPDX-License-Identifier: MIT

//! Tweet routes: short text posts attached to a user profile.

use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::models::{Tweet, UserSummary};
use crate::response::ApiResponse;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const MAX_LIMIT: u32 = 100;
const MAX_TWEET_LEN: usize = 280;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tweets", post(create_tweet))
        .route("/tweets/user/{user_id}", get(get_user_tweets))
        .route(
            "/tweets/{tweet_id}",
            patch(update_tweet).delete(delete_tweet),
        )
}

#[derive(Deserialize)]
struct TweetRequest {
    content: String,
}

fn validate_content(content: &str) -> Result<()> {
    if content.trim().is_empty() {
        return Err(AppError::Validation("content is required".into()));
    }
    if content.chars().count() > MAX_TWEET_LEN {
        return Err(AppError::Validation(format!(
            "content must be at most {} characters",
            MAX_TWEET_LEN
        )));
    }
    Ok(())
}

async fn create_tweet(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(body): Json<TweetRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Tweet>>)> {
    validate_content(&body.content)?;

    let now = chrono::Utc::now().to_rfc3339();
    let tweet = Tweet {
        id: uuid::Uuid::new_v4().to_string(),
        owner: user.id.clone(),
        content: body.content,
        created_at: now.clone(),
        updated_at: now,
    };

    state.db.upsert_tweet(&tweet).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::created(tweet, "Tweet created successfully")),
    ))
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

/// Tweet joined with its author's public profile.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct TweetView {
    id: String,
    content: String,
    created_at: String,
    owner: UserSummary,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TweetListData {
    tweets: Vec<TweetView>,
    page: u32,
    limit: u32,
}

/// A user's tweets, newest first, paginated.
async fn get_user_tweets(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(params): Query<PageQuery>,
) -> Result<Json<ApiResponse<TweetListData>>> {
    let author = state
        .db
        .get_user(&user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

    let page = params.page.max(1);
    let limit = params.limit.clamp(1, MAX_LIMIT);
    let offset = super::page_offset(page, limit)?;

    let owner = UserSummary::from(&author);
    let tweets = state
        .db
        .list_tweets_for_user(&user_id, limit, offset)
        .await?
        .into_iter()
        .map(|t| TweetView {
            id: t.id,
            content: t.content,
            created_at: t.created_at,
            owner: owner.clone(),
        })
        .collect();

    Ok(Json(ApiResponse::ok(
        TweetListData {
            tweets,
            page,
            limit,
        },
        "Tweets fetched successfully",
    )))
}

/// Load a tweet owned by the caller; others' tweets read as not found.
async fn get_own_tweet(state: &AppState, tweet_id: &str, user_id: &str) -> Result<Tweet> {
    let tweet = state
        .db
        .get_tweet(tweet_id)
        .await?
        .filter(|t| t.owner == user_id)
        .ok_or_else(|| AppError::NotFound(format!("Tweet {} not found", tweet_id)))?;
    Ok(tweet)
}

async fn update_tweet(
    State(state): State<Arc<AppState>>,
    Path(tweet_id): Path<String>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(body): Json<TweetRequest>,
) -> Result<Json<ApiResponse<Tweet>>> {
    validate_content(&body.content)?;

    let mut tweet = get_own_tweet(&state, &tweet_id, &user.id).await?;
    tweet.content = body.content;
    tweet.updated_at = chrono::Utc::now().to_rfc3339();

    state.db.upsert_tweet(&tweet).await?;

    Ok(Json(ApiResponse::ok(tweet, "Tweet updated successfully")))
}

async fn delete_tweet(
    State(state): State<Arc<AppState>>,
    Path(tweet_id): Path<String>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Tweet>>> {
    let tweet = get_own_tweet(&state, &tweet_id, &user.id).await?;

    state.db.delete_tweet(&tweet_id).await?;

    Ok(Json(ApiResponse::ok(tweet, "Tweet deleted successfully")))
}
