// SPDX-License-Identifier: MIT

//! Token service: stateless issuance and verification of access and refresh
//! JWTs.
//!
//! The two token kinds use distinct signing keys and lifetimes so refresh
//! tokens can outlive access tokens and either key can be rotated without
//! affecting the other. Nothing here touches the database; the refresh-token
//! slot on the user record is the session controller's concern.

use crate::config::Config;
use crate::error::AppError;
use crate::models::User;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Claims carried by an access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AccessClaims {
    /// Subject (user document ID)
    pub sub: String,
    pub email: String,
    pub username: String,
    pub full_name: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Claims carried by a refresh token. Intentionally minimal: just the user.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RefreshClaims {
    /// Subject (user document ID)
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
}

/// Stateless JWT issuance and verification.
#[derive(Clone)]
pub struct TokenService {
    access_secret: Vec<u8>,
    refresh_secret: Vec<u8>,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl TokenService {
    pub fn new(config: &Config) -> Self {
        Self {
            access_secret: config.access_token_secret.clone(),
            refresh_secret: config.refresh_token_secret.clone(),
            access_ttl_secs: config.access_token_ttl_secs,
            refresh_ttl_secs: config.refresh_token_ttl_secs,
        }
    }

    fn now() -> Result<usize, AppError> {
        Ok(SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
            .as_secs() as usize)
    }

    /// Issue a short-lived access token carrying the user's identity claims.
    pub fn issue_access_token(&self, user: &User) -> Result<String, AppError> {
        let now = Self::now()?;
        let claims = AccessClaims {
            sub: user.id.clone(),
            email: user.email.clone(),
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            iat: now,
            exp: now.saturating_add_signed(self.access_ttl_secs as isize),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.access_secret),
        )
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT encoding failed: {}", e)))
    }

    /// Issue a refresh token for the given user ID.
    pub fn issue_refresh_token(&self, user_id: &str) -> Result<String, AppError> {
        let now = Self::now()?;
        let claims = RefreshClaims {
            sub: user_id.to_string(),
            iat: now,
            exp: now.saturating_add_signed(self.refresh_ttl_secs as isize),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.refresh_secret),
        )
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT encoding failed: {}", e)))
    }

    /// Verify an access token. Fails with `InvalidToken` on bad signature or
    /// expiry.
    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims, AppError> {
        let key = DecodingKey::from_secret(&self.access_secret);
        let validation = Validation::new(Algorithm::HS256);

        decode::<AccessClaims>(token, &key, &validation)
            .map(|data| data.claims)
            .map_err(|_| AppError::InvalidToken)
    }

    /// Verify a refresh token. Fails with `InvalidToken` on bad signature or
    /// expiry.
    pub fn verify_refresh_token(&self, token: &str) -> Result<RefreshClaims, AppError> {
        let key = DecodingKey::from_secret(&self.refresh_secret);
        let validation = Validation::new(Algorithm::HS256);

        decode::<RefreshClaims>(token, &key, &validation)
            .map(|data| data.claims)
            .map_err(|_| AppError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user() -> User {
        User {
            id: "user-1".to_string(),
            username: "ada".to_string(),
            email: "ada@x.com".to_string(),
            full_name: "Ada L.".to_string(),
            password_hash: "hash".to_string(),
            avatar: "https://media/a.png".to_string(),
            cover_image: None,
            refresh_token: None,
            watch_history: vec![],
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    fn service() -> TokenService {
        TokenService::new(&Config::test_default())
    }

    #[test]
    fn test_access_token_roundtrip() {
        let tokens = service();
        let user = test_user();

        let token = tokens.issue_access_token(&user).unwrap();
        let claims = tokens.verify_access_token(&token).unwrap();

        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.email, "ada@x.com");
        assert_eq!(claims.username, "ada");
        assert_eq!(claims.full_name, "Ada L.");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_refresh_token_roundtrip() {
        let tokens = service();
        let token = tokens.issue_refresh_token("user-1").unwrap();
        let claims = tokens.verify_refresh_token(&token).unwrap();
        assert_eq!(claims.sub, "user-1");
    }

    #[test]
    fn test_cross_key_rejection() {
        // A refresh token must not verify as an access token and vice versa:
        // the two kinds are signed with distinct keys.
        let tokens = service();
        let user = test_user();

        let access = tokens.issue_access_token(&user).unwrap();
        let refresh = tokens.issue_refresh_token(&user.id).unwrap();

        assert!(matches!(
            tokens.verify_access_token(&refresh),
            Err(AppError::InvalidToken)
        ));
        assert!(matches!(
            tokens.verify_refresh_token(&access),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let tokens = service();
        let user = test_user();

        let mut token = tokens.issue_access_token(&user).unwrap();
        token.pop();
        token.push('x');

        assert!(matches!(
            tokens.verify_access_token(&token),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        // TTL far enough in the past to clear jsonwebtoken's default leeway.
        let mut config = Config::test_default();
        config.access_token_ttl_secs = -3600;
        let tokens = TokenService::new(&config);
        let user = test_user();

        let token = tokens.issue_access_token(&user).unwrap();
        assert!(matches!(
            tokens.verify_access_token(&token),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let tokens = service();
        assert!(matches!(
            tokens.verify_access_token("not.a.jwt"),
            Err(AppError::InvalidToken)
        ));
    }
}
