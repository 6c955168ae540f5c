//! # rb-auth-simple
//!
//! Argon2-based implementation of `AuthProvider`, plus the HMAC signer used
//! for the session cookie.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use hmac::{Hmac, Mac};
use rb_core::error::{AppError, Result};
use rb_core::traits::AuthProvider;
use sha2::Sha256;
use std::time::Duration;

#[derive(Default)]
pub struct SimpleAuthProvider {
    argon2: Argon2<'static>,
}

impl SimpleAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuthProvider for SimpleAuthProvider {
    fn hash_password(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
    }

    /// Verifies if a provided password matches a stored Argon2 hash.
    fn verify_password(&self, password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "stored password hash is unreadable");
                return false;
            }
        };
        self.argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

type HmacSha256 = Hmac<Sha256>;

/// How long a session token stays valid unless configured otherwise.
pub const DEFAULT_SESSION_MAX_AGE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Tolerated clock skew for tokens stamped slightly in the future.
const CLOCK_SKEW_SECS: i64 = 60;

/// Signs and verifies session tokens of the form
/// `"{user_id}.{issued_at}.{hex mac}"`, where `issued_at` is a Unix timestamp
/// covered by the mac.
///
/// The token only proves which user id the server issued it for and when;
/// the user is still looked up on every request.
#[derive(Clone)]
pub struct SessionSigner {
    key: Vec<u8>,
    max_age: Duration,
}

impl SessionSigner {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            key: secret.to_vec(),
            max_age: DEFAULT_SESSION_MAX_AGE,
        }
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    fn mac(&self, user_id: i64, issued_at: i64) -> Result<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| AppError::Internal(format!("session key rejected: {e}")))?;
        mac.update(format!("{user_id}.{issued_at}").as_bytes());
        Ok(mac)
    }

    pub fn sign(&self, user_id: i64) -> Result<String> {
        self.sign_at(user_id, Utc::now().timestamp())
    }

    fn sign_at(&self, user_id: i64, issued_at: i64) -> Result<String> {
        let tag = self.mac(user_id, issued_at)?.finalize().into_bytes();
        Ok(format!("{user_id}.{issued_at}.{}", hex::encode(tag)))
    }

    /// The user id carried by `token`, or `None` if it was not signed by us
    /// or has expired.
    pub fn verify(&self, token: &str) -> Option<i64> {
        self.verify_at(token, Utc::now().timestamp())
    }

    fn verify_at(&self, token: &str, now: i64) -> Option<i64> {
        let mut parts = token.splitn(3, '.');
        let user_id: i64 = parts.next()?.parse().ok()?;
        let issued_at: i64 = parts.next()?.parse().ok()?;
        let tag = hex::decode(parts.next()?).ok()?;
        self.mac(user_id, issued_at).ok()?.verify_slice(&tag).ok()?;

        let max_age = i64::try_from(self.max_age.as_secs()).unwrap_or(i64::MAX);
        let age = now.saturating_sub(issued_at);
        if age > max_age || age < -CLOCK_SKEW_SECS {
            tracing::debug!(user_id, issued_at, "session token outside its validity window");
            return None;
        }
        Some(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let auth = SimpleAuthProvider::new();
        let hash = auth.hash_password("correct horse").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(auth.verify_password("correct horse", &hash));
        assert!(!auth.verify_password("battery staple", &hash));
    }

    #[test]
    fn test_hashes_are_salted() {
        let auth = SimpleAuthProvider::new();
        assert_ne!(auth.hash_password("pw").unwrap(), auth.hash_password("pw").unwrap());
    }

    #[test]
    fn test_garbage_hash_never_verifies() {
        assert!(!SimpleAuthProvider::new().verify_password("pw", "not-a-phc-string"));
    }

    #[test]
    fn test_session_token_roundtrip() {
        let signer = SessionSigner::new(b"test-secret");
        let token = signer.sign(42).unwrap();
        assert_eq!(signer.verify(&token), Some(42));
    }

    #[test]
    fn test_tampered_session_tokens_are_rejected() {
        let signer = SessionSigner::new(b"test-secret");
        let token = signer.sign_at(42, 1_700_000_000).unwrap();
        let tag = token.rsplit('.').next().unwrap();
        let now = 1_700_000_100;

        assert_eq!(signer.verify_at(&token, now), Some(42));
        assert_eq!(signer.verify_at(&format!("43.1700000000.{tag}"), now), None);
        assert_eq!(signer.verify_at(&format!("42.1700000050.{tag}"), now), None);
        assert_eq!(signer.verify_at("42", now), None);
        assert_eq!(signer.verify_at("42.1700000000.zz", now), None);
        assert_eq!(SessionSigner::new(b"other-secret").verify_at(&token, now), None);
    }

    #[test]
    fn test_session_tokens_expire() {
        let signer = SessionSigner::new(b"test-secret").with_max_age(Duration::from_secs(3600));
        let token = signer.sign_at(7, 1_000_000).unwrap();

        assert_eq!(signer.verify_at(&token, 1_000_000 + 3600), Some(7));
        assert_eq!(signer.verify_at(&token, 1_000_000 + 3601), None);
        assert_eq!(signer.verify_at(&token, 1_000_000 - 3600), None);
    }

    #[test]
    fn test_default_max_age_is_a_week() {
        assert_eq!(SessionSigner::new(b"k").max_age(), Duration::from_secs(604_800));
    }
}
