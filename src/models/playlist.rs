//! Playlist model.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    /// Document ID (uuid)
    pub id: String,
    /// Owning user ID
    pub owner: String,
    pub name: String,
    pub description: String,
    /// Ordered video IDs
    pub videos: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}
