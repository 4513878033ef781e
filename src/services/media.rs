// SPDX-License-Identifier: MIT

//! Media store client for binary asset uploads (avatars, cover images, video
//! files, thumbnails).
//!
//! The store is an external HTTP service: POST the bytes, get back a stable
//! URL. Uploads are synchronous from the request's point of view and are not
//! retried; a failed upload surfaces as `AppError::Upload`.

use crate::error::AppError;
use serde::Deserialize;

/// Media store upload client.
#[derive(Clone)]
pub struct MediaStore {
    base_url: String,
    client: Option<reqwest::Client>,
}

/// Upload response from the media store.
#[derive(Deserialize)]
struct UploadResponse {
    url: String,
}

impl MediaStore {
    /// Create a new media store client.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Some(reqwest::Client::new()),
        }
    }

    /// Create a mock media store for testing (offline mode).
    ///
    /// Uploads succeed without network I/O and return a deterministic
    /// mock:// URL.
    pub fn new_mock() -> Self {
        Self {
            base_url: "mock://media".to_string(),
            client: None,
        }
    }

    /// Upload a file, returning its stable URL in the media store.
    pub async fn upload(
        &self,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, AppError> {
        let client = match &self.client {
            Some(client) => client,
            // Mock mode: no network I/O
            None => {
                return Ok(format!(
                    "{}/{}/{}",
                    self.base_url,
                    uuid::Uuid::new_v4(),
                    filename
                ))
            }
        };

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(content_type)
            .map_err(|e| AppError::Upload(format!("Invalid content type: {}", e)))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = client
            .post(format!("{}/upload", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::Upload(format!("Media store request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Upload(format!(
                "Media store rejected upload: {}",
                response.status()
            )));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upload(format!("Invalid media store response: {}", e)))?;

        tracing::debug!(filename, url = %body.url, "Uploaded asset to media store");

        Ok(body.url)
    }
}
