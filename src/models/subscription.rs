//! Subscription model (subscriber follows a channel).

use serde::{Deserialize, Serialize};

/// A (subscriber, channel) pair. Uniqueness is enforced by the toggle
/// operation: an existing pair is deleted instead of duplicated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    /// Document ID (uuid)
    pub id: String,
    /// Subscribing user ID
    pub subscriber: String,
    /// Channel (user) being subscribed to
    pub channel: String,
    pub created_at: String,
}
