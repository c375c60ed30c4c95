//! Password hashing
//! bcrypt is CPU-bound by design, so both operations run on the blocking pool.

use anyhow::{bail, Context, Result};
use bcrypt::{hash, verify};

pub use bcrypt::DEFAULT_COST;

/// Lowest and highest cost bcrypt accepts
pub const MIN_COST: u32 = 4;
pub const MAX_COST: u32 = 31;

/// bcrypt only reads this many bytes of input; anything longer is refused
/// rather than silently truncated.
pub const MAX_PASSWORD_BYTES: usize = 72;

pub async fn hash_password(password: &str, cost: u32) -> Result<String> {
    if password.len() > MAX_PASSWORD_BYTES {
        bail!("password exceeds {} bytes", MAX_PASSWORD_BYTES);
    }
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hash(password, cost))
        .await
        .context("Password hashing task failed")?
        .context("Failed to hash password")
}

/// Constant-time comparison is done inside bcrypt.
pub async fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    // Could never have been hashed, and bcrypt would compare only its prefix
    if password.len() > MAX_PASSWORD_BYTES {
        return Ok(false);
    }
    let password = password.to_string();
    let password_hash = password_hash.to_string();
    tokio::task::spawn_blocking(move || verify(password, &password_hash))
        .await
        .context("Password verification task failed")?
        .context("Failed to verify password")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hashed = hash_password("secret123", MIN_COST).await.unwrap();
        assert_ne!(hashed, "secret123");
        assert!(hashed.starts_with("$2"));

        assert!(verify_password("secret123", &hashed).await.unwrap());
        assert!(!verify_password("secret124", &hashed).await.unwrap());
    }

    #[tokio::test]
    async fn test_hashes_are_salted() {
        let a = hash_password("same", MIN_COST).await.unwrap();
        let b = hash_password("same", MIN_COST).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_overlong_password_refused() {
        let too_long = format!("{}REAL-SECRET", "a".repeat(MAX_PASSWORD_BYTES));
        assert!(hash_password(&too_long, MIN_COST).await.is_err());

        let at_limit = "a".repeat(MAX_PASSWORD_BYTES);
        let hashed = hash_password(&at_limit, MIN_COST).await.unwrap();
        assert!(verify_password(&at_limit, &hashed).await.unwrap());

        // Same first 72 bytes must not verify
        let extended = format!("{}totally-wrong", at_limit);
        assert!(!verify_password(&extended, &hashed).await.unwrap());
    }

    #[tokio::test]
    async fn test_garbage_hash_is_an_error() {
        assert!(verify_password("secret123", "not-a-bcrypt-hash").await.is_err());
    }
}
