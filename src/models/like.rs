//! Like model.
//!
//! A like points at exactly one of video, comment, or tweet. The three
//! optional fields mirror the document layout; [`LikeTarget`] is the typed
//! view used by queries.

use serde::{Deserialize, Serialize};

/// A like placed by a user on a single target entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Like {
    /// Document ID (uuid)
    pub id: String,
    /// User who placed the like
    pub liked_by: String,
    /// Set when the target is a video
    pub video: Option<String>,
    /// Set when the target is a comment
    pub comment: Option<String>,
    /// Set when the target is a tweet
    pub tweet: Option<String>,
    pub created_at: String,
}

/// The entity a like refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LikeTarget {
    Video(String),
    Comment(String),
    Tweet(String),
}

impl LikeTarget {
    /// Document field holding the target ID.
    pub fn field(&self) -> &'static str {
        match self {
            LikeTarget::Video(_) => "video",
            LikeTarget::Comment(_) => "comment",
            LikeTarget::Tweet(_) => "tweet",
        }
    }

    /// Target entity ID.
    pub fn id(&self) -> &str {
        match self {
            LikeTarget::Video(id) | LikeTarget::Comment(id) | LikeTarget::Tweet(id) => id,
        }
    }
}

impl Like {
    /// Build a new like for the given target.
    pub fn new(id: String, liked_by: String, target: &LikeTarget, created_at: String) -> Self {
        let mut like = Self {
            id,
            liked_by,
            video: None,
            comment: None,
            tweet: None,
            created_at,
        };
        match target {
            LikeTarget::Video(v) => like.video = Some(v.clone()),
            LikeTarget::Comment(c) => like.comment = Some(c.clone()),
            LikeTarget::Tweet(t) => like.tweet = Some(t.clone()),
        }
        like
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_targets_exactly_one_field() {
        let like = Like::new(
            "l1".into(),
            "u1".into(),
            &LikeTarget::Comment("c1".into()),
            "2026-01-01T00:00:00Z".into(),
        );
        assert!(like.video.is_none());
        assert_eq!(like.comment.as_deref(), Some("c1"));
        assert!(like.tweet.is_none());
    }

    #[test]
    fn test_target_field_names() {
        assert_eq!(LikeTarget::Video("v".into()).field(), "video");
        assert_eq!(LikeTarget::Comment("c".into()).field(), "comment");
        assert_eq!(LikeTarget::Tweet("t".into()).field(), "tweet");
    }
}
