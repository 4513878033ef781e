//! Video metadata model.

use serde::{Deserialize, Serialize};

/// Video record stored in Firestore. The binary assets themselves live in the
/// external media store; only their URLs are kept here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    /// Document ID (uuid)
    pub id: String,
    /// Owning user ID
    pub owner: String,
    /// Video file URL in the media store
    pub video_file: String,
    /// Thumbnail URL in the media store
    pub thumbnail: String,
    pub title: String,
    pub description: String,
    /// Duration in seconds
    pub duration: f64,
    /// View counter, incremented on fetch (last-write-wins)
    pub views: u64,
    pub is_published: bool,
    pub created_at: String,
    pub updated_at: String,
}
