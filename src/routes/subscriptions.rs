// SPDX-License-Identifier: MIT

//! Subscription routes: subscriber/channel relationships between users.

use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::models::{Subscription, UserSummary};
use crate::response::ApiResponse;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/subscriptions/c/{channel_id}",
            post(toggle_subscription).get(get_channel_subscribers),
        )
        .route(
            "/subscriptions/u/{subscriber_id}",
            get(get_subscribed_channels),
        )
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubscriptionToggleData {
    subscribed: bool,
}

/// Subscribe to a channel, or unsubscribe when already subscribed.
/// Subscribing to oneself is rejected.
async fn toggle_subscription(
    State(state): State<Arc<AppState>>,
    Path(channel_id): Path<String>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Response> {
    if channel_id == user.id {
        return Err(AppError::Validation(
            "Cannot subscribe to your own channel".into(),
        ));
    }

    state
        .db
        .get_user(&channel_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Channel {} not found", channel_id)))?;

    if let Some(existing) = state.db.find_subscription(&user.id, &channel_id).await? {
        state.db.delete_subscription(&existing.id).await?;
        return Ok(Json(ApiResponse::ok(
            SubscriptionToggleData { subscribed: false },
            "Unsubscribed successfully",
        ))
        .into_response());
    }

    let subscription = Subscription {
        id: uuid::Uuid::new_v4().to_string(),
        subscriber: user.id.clone(),
        channel: channel_id,
        created_at: chrono::Utc::now().to_rfc3339(),
    };
    state.db.upsert_subscription(&subscription).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::created(
            SubscriptionToggleData { subscribed: true },
            "Subscribed successfully",
        )),
    )
        .into_response())
}

/// Public profiles of everyone subscribed to a channel.
async fn get_channel_subscribers(
    State(state): State<Arc<AppState>>,
    Path(channel_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<UserSummary>>>> {
    state
        .db
        .get_user(&channel_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Channel {} not found", channel_id)))?;

    let subscriptions = state.db.list_subscriptions_for_channel(&channel_id).await?;
    let subscriber_ids: Vec<String> =
        subscriptions.into_iter().map(|s| s.subscriber).collect();

    let subscribers = state
        .db
        .get_users_by_ids(&subscriber_ids)
        .await?
        .iter()
        .map(UserSummary::from)
        .collect();

    Ok(Json(ApiResponse::ok(
        subscribers,
        "Subscribers fetched successfully",
    )))
}

/// Public profiles of every channel a user is subscribed to.
async fn get_subscribed_channels(
    State(state): State<Arc<AppState>>,
    Path(subscriber_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<UserSummary>>>> {
    state
        .db
        .get_user(&subscriber_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", subscriber_id)))?;

    let subscriptions = state
        .db
        .list_subscriptions_for_subscriber(&subscriber_id)
        .await?;
    let channel_ids: Vec<String> = subscriptions.into_iter().map(|s| s.channel).collect();

    let channels = state
        .db
        .get_users_by_ids(&channel_ids)
        .await?
        .iter()
        .map(UserSummary::from)
        .collect();

    Ok(Json(ApiResponse::ok(
        channels,
        "Subscribed channels fetched successfully",
    )))
}
