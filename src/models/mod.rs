// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod comment;
pub mod like;
pub mod playlist;
pub mod subscription;
pub mod tweet;
pub mod user;
pub mod video;

pub use comment::Comment;
pub use like::{Like, LikeTarget};
pub use playlist::Playlist;
pub use subscription::Subscription;
pub use tweet::Tweet;
pub use user::{User, UserResponse, UserSummary};
pub use video::Video;
