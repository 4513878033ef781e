// SPDX-License-Identifier: MIT

//! Password hashing (bcrypt).

use crate::error::AppError;

/// Hash a plaintext password with a per-hash random salt.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing failed: {}", e)))
}

/// Verify a plaintext password against a stored hash. The comparison inside
/// bcrypt is constant-time.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    bcrypt::verify(password, hash)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password verification failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_verify_roundtrip() {
        let hash = bcrypt::hash("p@ss1234", 4).unwrap();
        assert!(verify_password("p@ss1234", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn test_hash_is_not_plaintext() {
        let hash = hash_password("p@ss1234").unwrap();
        assert_ne!(hash, "p@ss1234");
        assert!(hash.starts_with("$2"));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = bcrypt::hash("p@ss1234", 4).unwrap();
        let b = bcrypt::hash("p@ss1234", 4).unwrap();
        assert_ne!(a, b);
    }
}
