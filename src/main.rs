// SPDX-License-Identifier: MIT

//! Vidhub API Server
//!
//! REST backend for a video-sharing platform: users, videos, comments,
//! likes, tweets, playlists, subscriptions.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vidhub::{
    config::Config,
    db::FirestoreDb,
    services::{MediaStore, TokenService},
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Vidhub API");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id)
        .await
        .expect("Failed to connect to Firestore");

    // Media store client for avatar/video uploads
    let media = MediaStore::new(&config.media_store_url);
    tracing::info!(url = %config.media_store_url, "Media store client initialized");

    // Token service (access + refresh signing keys)
    let tokens = TokenService::new(&config);

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        media,
        tokens,
    });

    // Build router
    let app = vidhub::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("vidhub=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
