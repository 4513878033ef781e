//! Tweet (short text post) model.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tweet {
    /// Document ID (uuid)
    pub id: String,
    /// Owning user ID
    pub owner: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}
