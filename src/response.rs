// SPDX-License-Identifier: MIT

//! Uniform success envelope for API responses.

use axum::http::StatusCode;
use serde::Serialize;

/// JSON success envelope: `{ statusCode, data, message, success: true }`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub status_code: u16,
    pub data: T,
    pub message: String,
    pub success: bool,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(status: StatusCode, data: T, message: impl Into<String>) -> Self {
        Self {
            status_code: status.as_u16(),
            data,
            message: message.into(),
            success: true,
        }
    }

    /// 200 OK envelope.
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, data, message)
    }

    /// 201 Created envelope.
    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self::new(StatusCode::CREATED, data, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_field_names() {
        let body = ApiResponse::ok(serde_json::json!({"id": "abc"}), "Fetched");
        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(value["statusCode"], 200);
        assert_eq!(value["success"], true);
        assert_eq!(value["message"], "Fetched");
        assert_eq!(value["data"]["id"], "abc");
    }

    #[test]
    fn test_created_status() {
        let body = ApiResponse::created((), "Created");
        assert_eq!(body.status_code, 201);
        assert!(body.success);
    }
}
