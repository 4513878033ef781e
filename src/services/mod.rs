// SPDX-License-Identifier: MIT

//! Services module - token issuance, password hashing, media uploads.

pub mod media;
pub mod password;
pub mod tokens;

pub use media::MediaStore;
pub use tokens::{AccessClaims, RefreshClaims, TokenService};
