//! User model for storage and API.

use serde::{Deserialize, Serialize};

/// User record stored in Firestore.
///
/// `password_hash` and `refresh_token` never leave the database layer in API
/// responses; use [`UserResponse`] for anything client-facing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Document ID (uuid)
    pub id: String,
    /// Unique username, stored lowercase
    pub username: String,
    /// Unique email, stored lowercase
    pub email: String,
    /// Display name
    pub full_name: String,
    /// Bcrypt hash of the password
    pub password_hash: String,
    /// Avatar URL in the media store
    pub avatar: String,
    /// Optional cover image URL
    pub cover_image: Option<String>,
    /// Currently active refresh token. One slot: a new login overwrites it,
    /// logout clears it. Absent means no live session.
    pub refresh_token: Option<String>,
    /// Watched video IDs, oldest first. Duplicates allowed.
    pub watch_history: Vec<String>,
    /// When the account was created (RFC 3339)
    pub created_at: String,
    /// Last modification timestamp (RFC 3339)
    pub updated_at: String,
}

/// Client-facing user projection with secret fields stripped.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    pub cover_image: Option<String>,
    pub created_at: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            avatar: user.avatar.clone(),
            cover_image: user.cover_image.clone(),
            created_at: user.created_at.clone(),
        }
    }
}

/// Minimal owner projection used when joining other records with their
/// owning user (comments, videos, subscriber lists).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub avatar: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            avatar: user.avatar.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: "u1".to_string(),
            username: "ada".to_string(),
            email: "ada@x.com".to_string(),
            full_name: "Ada L.".to_string(),
            password_hash: "$2b$12$secret".to_string(),
            avatar: "https://media/avatar.png".to_string(),
            cover_image: None,
            refresh_token: Some("token".to_string()),
            watch_history: vec![],
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_response_strips_secret_fields() {
        let user = sample_user();
        let response = UserResponse::from(&user);
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["username"], "ada");
        assert_eq!(value["fullName"], "Ada L.");
        assert!(value.get("password").is_none());
        assert!(value.get("passwordHash").is_none());
        assert!(value.get("refreshToken").is_none());
    }

    #[test]
    fn test_summary_projection() {
        let user = sample_user();
        let summary = UserSummary::from(&user);
        let value = serde_json::to_value(&summary).unwrap();

        assert_eq!(value["id"], "u1");
        assert!(value.get("email").is_none());
        assert!(value.get("passwordHash").is_none());
    }
}
