use std::collections::HashMap;
use std::time::{Duration, Instant};

use base64::Engine;
use serde::Serialize;

use super::AuthError;

/// Purge expired entries once the registry grows past this size.
const CLEANUP_THRESHOLD: usize = 1000;

/// Hash a bearer token string using SHA-256.
pub fn hash_token(token: &str) -> [u8; 32] {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().into()
}

/// Generate a random bearer token (URL-safe base64, 32 bytes of entropy).
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

#[derive(Debug)]
struct TokenEntry {
    username: String,
    expires_at: Instant,
}

/// Returned to the client on login.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
}

/// In-memory access tokens. Only SHA-256 hashes are held; a leaked
/// registry dump cannot be replayed.
#[derive(Debug)]
pub struct TokenRegistry {
    entries: HashMap<[u8; 32], TokenEntry>,
    ttl: Duration,
}

impl TokenRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    pub fn issue(&mut self, username: &str) -> Result<IssuedToken, AuthError> {
        self.issue_at(username, Instant::now())
    }

    pub fn issue_at(&mut self, username: &str, now: Instant) -> Result<IssuedToken, AuthError> {
        let expires_at = now.checked_add(self.ttl).ok_or(AuthError::TtlOutOfRange)?;
        if self.entries.len() > CLEANUP_THRESHOLD {
            self.cleanup(now);
        }

        let token = generate_token();
        self.entries.insert(
            hash_token(&token),
            TokenEntry {
                username: username.to_string(),
                expires_at,
            },
        );

        Ok(IssuedToken {
            access_token: token,
            token_type: "bearer",
            expires_in: self.ttl.as_secs(),
        })
    }

    /// Resolve a token to its username.
    pub fn validate(&mut self, token: &str) -> Result<String, AuthError> {
        self.validate_at(token, Instant::now())
    }

    pub fn validate_at(&mut self, token: &str, now: Instant) -> Result<String, AuthError> {
        let key = hash_token(token);
        match self.entries.get(&key) {
            None => Err(AuthError::InvalidToken),
            Some(entry) if now >= entry.expires_at => {
                self.entries.remove(&key);
                Err(AuthError::TokenExpired)
            }
            Some(entry) => Ok(entry.username.clone()),
        }
    }

    /// Forget a token. Returns whether it was known.
    pub fn revoke(&mut self, token: &str) -> bool {
        self.entries.remove(&hash_token(token)).is_some()
    }

    fn cleanup(&mut self, now: Instant) {
        self.entries.retain(|_, entry| now < entry.expires_at);
    }
}
