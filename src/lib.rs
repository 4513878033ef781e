// SPDX-License-Identifier: MIT

//! Vidhub: REST backend for a video-sharing platform.
//!
//! Users, videos, comments, likes, tweets, playlists, and subscriptions,
//! stored in Firestore behind JWT-authenticated axum routes.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod response;
pub mod routes;
pub mod services;

use config::Config;
use db::FirestoreDb;
use services::{MediaStore, TokenService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub media: MediaStore,
    pub tokens: TokenService,
}
