//! Session tokens — signing and verification of identity claims.
//!
//! ARCHITECTURE
//! ============
//! REST login issues a signed token carrying {sub, email, name, exp}; the
//! websocket handshake verifies it once per connection and holds the decoded
//! identity for the connection's lifetime. Verification is pure: no I/O, no
//! connection state.
//!
//! Bad signature, malformed token, and expired token are all reported as the
//! same `TokenError::Invalid` — callers get no further distinction.

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const DEFAULT_TTL_SECONDS: u64 = 86_400;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("invalid token")]
    Invalid,
    #[error("token signing failed: {0}")]
    Signing(String),
}

/// Claim set embedded in every session token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: Uuid,
    pub email: String,
    pub name: String,
    /// Expiry, seconds since Unix epoch.
    pub exp: u64,
}

/// Identity recovered from a verified token. Valid for one connection's
/// lifetime; never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct SessionIdentity {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
}

/// Signing/verification key pair derived from the shared secret.
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_seconds: u64,
}

impl TokenKeys {
    #[must_use]
    pub fn new(secret: &str, ttl_seconds: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_seconds,
        }
    }

    /// Load from `JWT_SECRET` (required) and `JWT_TTL_SECONDS` (optional).
    pub fn from_env() -> Result<Self, String> {
        let secret = std::env::var("JWT_SECRET").map_err(|_| "JWT_SECRET required".to_string())?;
        let ttl_seconds = std::env::var("JWT_TTL_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TTL_SECONDS);
        Ok(Self::new(&secret, ttl_seconds))
    }

    /// Issue a token for the given identity.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` if encoding fails.
    pub fn sign(&self, user_id: Uuid, email: &str, name: &str) -> Result<String, TokenError> {
        let claims = Claims {
            sub: user_id,
            email: email.to_owned(),
            name: name.to_owned(),
            exp: now_secs() + self.ttl_seconds,
        };
        encode(&Header::default(), &claims, &self.encoding).map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify a token and extract the identity claims.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Invalid` for a bad signature, a malformed token,
    /// or an expired one.
    pub fn verify(&self, token: &str) -> Result<SessionIdentity, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default()).map_err(|_| TokenError::Invalid)?;
        Ok(SessionIdentity {
            user_id: data.claims.sub,
            email: data.claims.email,
            name: data.claims.name,
        })
    }

    /// Issue a token that expired in the past. Test-only.
    #[cfg(test)]
    pub(crate) fn sign_expired(&self, user_id: Uuid, email: &str, name: &str) -> String {
        let claims = Claims {
            sub: user_id,
            email: email.to_owned(),
            name: name.to_owned(),
            exp: now_secs().saturating_sub(3_600),
        };
        encode(&Header::default(), &claims, &self.encoding).expect("encode should not fail")
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> TokenKeys {
        TokenKeys::new("test-secret", 3_600)
    }

    #[test]
    fn sign_then_verify_round_trips_identity() {
        let keys = keys();
        let user_id = Uuid::new_v4();
        let token = keys.sign(user_id, "alice@example.com", "Alice").unwrap();
        let identity = keys.verify(&token).unwrap();
        assert_eq!(identity.user_id, user_id);
        assert_eq!(identity.email, "alice@example.com");
        assert_eq!(identity.name, "Alice");
    }

    #[test]
    fn verify_rejects_garbage() {
        assert!(matches!(keys().verify("not-a-token"), Err(TokenError::Invalid)));
    }

    #[test]
    fn verify_rejects_empty() {
        assert!(matches!(keys().verify(""), Err(TokenError::Invalid)));
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let token = keys().sign(Uuid::new_v4(), "a@b.c", "A").unwrap();
        let other = TokenKeys::new("different-secret", 3_600);
        assert!(matches!(other.verify(&token), Err(TokenError::Invalid)));
    }

    #[test]
    fn verify_rejects_expired() {
        let keys = keys();
        let token = keys.sign_expired(Uuid::new_v4(), "a@b.c", "A");
        assert!(matches!(keys.verify(&token), Err(TokenError::Invalid)));
    }

    #[test]
    fn verify_rejects_tampered_payload() {
        let keys = keys();
        let token = keys.sign(Uuid::new_v4(), "a@b.c", "A").unwrap();
        let mut parts: Vec<String> = token.split('.').map(str::to_owned).collect();
        parts[1] = format!("{}AA", parts[1]);
        assert!(matches!(keys.verify(&parts.join(".")), Err(TokenError::Invalid)));
    }
}
