//! Comment model.

use serde::{Deserialize, Serialize};

/// Comment on a video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    /// Document ID (uuid)
    pub id: String,
    /// Video this comment belongs to
    pub video: String,
    /// Owning user ID
    pub owner: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}
