// SPDX-License-Identifier: MIT

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (identity records, refresh-token slot, watch history)
//! - Videos, Comments, Likes, Tweets, Playlists, Subscriptions
//!
//! Cross-collection joins (comment owners, watch history, liked videos,
//! subscriber lists) are expressed as a query followed by a bounded
//! concurrent fan-out lookup.

use crate::db::collections;
use crate::error::AppError;
use crate::models::{Comment, Like, LikeTarget, Playlist, Subscription, Tweet, User, Video};
use futures_util::{stream, StreamExt};

const MAX_CONCURRENT_DB_OPS: usize = 16;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Generic Document Helpers ────────────────────────────────

    async fn get_by_id<T>(&self, collection: &str, id: &str) -> Result<Option<T>, AppError>
    where
        T: for<'de> serde::Deserialize<'de> + Send,
    {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collection)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn upsert<T>(&self, collection: &str, id: &str, object: &T) -> Result<(), AppError>
    where
        // The update builder deserializes the written document back, so the
        // Serialize bound alone is not enough.
        T: serde::Serialize + for<'de> serde::Deserialize<'de> + Send + Sync,
    {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collection)
            .document_id(id)
            .object(object)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collection)
            .document_id(id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by document ID.
    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        self.get_by_id(collections::USERS, id).await
    }

    /// Find a user by exact (lowercased) username.
    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let username = username.to_string();
        let users: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| q.for_all([q.field("username").eq(username.clone())]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(users.into_iter().next())
    }

    /// Find a user by exact (lowercased) email.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let email = email.to_string();
        let users: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| q.for_all([q.field("email").eq(email.clone())]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(users.into_iter().next())
    }

    /// Create or update a user.
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        self.upsert(collections::USERS, &user.id, user).await
    }

    /// Fetch several users by ID, preserving input order. Missing documents
    /// are skipped.
    pub async fn get_users_by_ids(&self, ids: &[String]) -> Result<Vec<User>, AppError> {
        let users: Vec<Result<Option<User>, AppError>> = stream::iter(ids.to_vec())
            .map(|id| async move { self.get_user(&id).await })
            .buffered(MAX_CONCURRENT_DB_OPS)
            .collect()
            .await;

        let mut out = Vec::with_capacity(ids.len());
        for user in users {
            if let Some(user) = user? {
                out.push(user);
            }
        }
        Ok(out)
    }

    // ─── Video Operations ────────────────────────────────────────

    pub async fn get_video(&self, id: &str) -> Result<Option<Video>, AppError> {
        self.get_by_id(collections::VIDEOS, id).await
    }

    pub async fn upsert_video(&self, video: &Video) -> Result<(), AppError> {
        self.upsert(collections::VIDEOS, &video.id, video).await
    }

    pub async fn delete_video(&self, id: &str) -> Result<(), AppError> {
        self.delete(collections::VIDEOS, id).await
    }

    /// List videos with optional owner filter, ordered and paginated.
    ///
    /// `order_field` must be a document field name (`created_at`, `views`,
    /// `title`); callers validate user input before reaching here.
    pub async fn list_videos(
        &self,
        owner: Option<String>,
        published_only: bool,
        order_field: &str,
        descending: bool,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Video>, AppError> {
        let direction = if descending {
            firestore::FirestoreQueryDirection::Descending
        } else {
            firestore::FirestoreQueryDirection::Ascending
        };

        let query = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::VIDEOS);

        let query = match owner {
            Some(owner) if published_only => query.filter(move |q| {
                q.for_all([
                    q.field("owner").eq(owner.clone()),
                    q.field("is_published").eq(true),
                ])
            }),
            Some(owner) => query.filter(move |q| q.for_all([q.field("owner").eq(owner.clone())])),
            None if published_only => {
                query.filter(move |q| q.for_all([q.field("is_published").eq(true)]))
            }
            None => query,
        };

        query
            .order_by([(order_field.to_string(), direction)])
            .limit(limit)
            .offset(offset)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Fetch several videos by ID, preserving input order. Missing documents
    /// (deleted videos still referenced by history/playlists) are skipped.
    pub async fn get_videos_by_ids(&self, ids: &[String]) -> Result<Vec<Video>, AppError> {
        let videos: Vec<Result<Option<Video>, AppError>> = stream::iter(ids.to_vec())
            .map(|id| async move { self.get_video(&id).await })
            .buffered(MAX_CONCURRENT_DB_OPS)
            .collect()
            .await;

        let mut out = Vec::with_capacity(ids.len());
        for video in videos {
            if let Some(video) = video? {
                out.push(video);
            }
        }
        Ok(out)
    }

    // ─── Comment Operations ──────────────────────────────────────

    pub async fn get_comment(&self, id: &str) -> Result<Option<Comment>, AppError> {
        self.get_by_id(collections::COMMENTS, id).await
    }

    pub async fn upsert_comment(&self, comment: &Comment) -> Result<(), AppError> {
        self.upsert(collections::COMMENTS, &comment.id, comment)
            .await
    }

    pub async fn delete_comment(&self, id: &str) -> Result<(), AppError> {
        self.delete(collections::COMMENTS, id).await
    }

    /// Comments on a video, newest first, paginated.
    pub async fn list_comments_for_video(
        &self,
        video_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Comment>, AppError> {
        let video_id = video_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::COMMENTS)
            .filter(move |q| q.for_all([q.field("video").eq(video_id.clone())]))
            .order_by([(
                "created_at",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .limit(limit)
            .offset(offset)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Like Operations ─────────────────────────────────────────

    /// Find an existing like by (liker, target) pair.
    pub async fn find_like(
        &self,
        liked_by: &str,
        target: &LikeTarget,
    ) -> Result<Option<Like>, AppError> {
        let liked_by = liked_by.to_string();
        let field = target.field();
        let target_id = target.id().to_string();

        let likes: Vec<Like> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::LIKES)
            .filter(move |q| {
                q.for_all([
                    q.field("liked_by").eq(liked_by.clone()),
                    q.field(field).eq(target_id.clone()),
                ])
            })
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(likes.into_iter().next())
    }

    pub async fn upsert_like(&self, like: &Like) -> Result<(), AppError> {
        self.upsert(collections::LIKES, &like.id, like).await
    }

    pub async fn delete_like(&self, id: &str) -> Result<(), AppError> {
        self.delete(collections::LIKES, id).await
    }

    /// All likes placed by a user, newest first. Target filtering (videos
    /// only, etc.) happens at the call site.
    pub async fn list_likes_by_user(&self, liked_by: &str) -> Result<Vec<Like>, AppError> {
        let liked_by = liked_by.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::LIKES)
            .filter(move |q| q.for_all([q.field("liked_by").eq(liked_by.clone())]))
            .order_by([(
                "created_at",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Tweet Operations ────────────────────────────────────────

    pub async fn get_tweet(&self, id: &str) -> Result<Option<Tweet>, AppError> {
        self.get_by_id(collections::TWEETS, id).await
    }

    pub async fn upsert_tweet(&self, tweet: &Tweet) -> Result<(), AppError> {
        self.upsert(collections::TWEETS, &tweet.id, tweet).await
    }

    pub async fn delete_tweet(&self, id: &str) -> Result<(), AppError> {
        self.delete(collections::TWEETS, id).await
    }

    /// A user's tweets, newest first, paginated.
    pub async fn list_tweets_for_user(
        &self,
        owner: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Tweet>, AppError> {
        let owner = owner.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::TWEETS)
            .filter(move |q| q.for_all([q.field("owner").eq(owner.clone())]))
            .order_by([(
                "created_at",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .limit(limit)
            .offset(offset)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Playlist Operations ─────────────────────────────────────

    pub async fn get_playlist(&self, id: &str) -> Result<Option<Playlist>, AppError> {
        self.get_by_id(collections::PLAYLISTS, id).await
    }

    pub async fn upsert_playlist(&self, playlist: &Playlist) -> Result<(), AppError> {
        self.upsert(collections::PLAYLISTS, &playlist.id, playlist)
            .await
    }

    pub async fn delete_playlist(&self, id: &str) -> Result<(), AppError> {
        self.delete(collections::PLAYLISTS, id).await
    }

    /// A user's playlists, newest first.
    pub async fn list_playlists_for_user(&self, owner: &str) -> Result<Vec<Playlist>, AppError> {
        let owner = owner.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::PLAYLISTS)
            .filter(move |q| q.for_all([q.field("owner").eq(owner.clone())]))
            .order_by([(
                "created_at",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Subscription Operations ─────────────────────────────────

    /// Find an existing subscription by (subscriber, channel) pair.
    pub async fn find_subscription(
        &self,
        subscriber: &str,
        channel: &str,
    ) -> Result<Option<Subscription>, AppError> {
        let subscriber = subscriber.to_string();
        let channel = channel.to_string();

        let subscriptions: Vec<Subscription> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::SUBSCRIPTIONS)
            .filter(move |q| {
                q.for_all([
                    q.field("subscriber").eq(subscriber.clone()),
                    q.field("channel").eq(channel.clone()),
                ])
            })
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(subscriptions.into_iter().next())
    }

    pub async fn upsert_subscription(&self, subscription: &Subscription) -> Result<(), AppError> {
        self.upsert(collections::SUBSCRIPTIONS, &subscription.id, subscription)
            .await
    }

    pub async fn delete_subscription(&self, id: &str) -> Result<(), AppError> {
        self.delete(collections::SUBSCRIPTIONS, id).await
    }

    /// All subscriptions to a channel, newest first.
    pub async fn list_subscriptions_for_channel(
        &self,
        channel: &str,
    ) -> Result<Vec<Subscription>, AppError> {
        let channel = channel.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::SUBSCRIPTIONS)
            .filter(move |q| q.for_all([q.field("channel").eq(channel.clone())]))
            .order_by([(
                "created_at",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All subscriptions placed by a user, newest first.
    pub async fn list_subscriptions_for_subscriber(
        &self,
        subscriber: &str,
    ) -> Result<Vec<Subscription>, AppError> {
        let subscriber = subscriber.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::SUBSCRIPTIONS)
            .filter(move |q| q.for_all([q.field("subscriber").eq(subscriber.clone())]))
            .order_by([(
                "created_at",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
