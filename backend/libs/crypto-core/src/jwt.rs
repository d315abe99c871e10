//! Session token signing and validation
//!
//! Tokens are HS256 JWTs whose `sub` claim is the user id. They are issued at
//! registration/login and travel back to the server in an HttpOnly cookie.
//!
//! ## Usage
//!
//! ```rust
//! use crypto_core::jwt::TokenSigner;
//! use uuid::Uuid;
//!
//! let signer = TokenSigner::new(&"s".repeat(32), 3600).unwrap();
//! let user_id = Uuid::new_v4();
//! let token = signer.issue(user_id).unwrap();
//! assert_eq!(signer.user_id(&token).unwrap(), user_id);
//! ```
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::CryptoError;

/// Shortest accepted HMAC secret, in bytes
pub const MIN_SECRET_LEN: usize = 32;

const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Issues and validates session tokens with a shared secret.
///
/// Keys are derived once at construction and shared by clone; the signer is
/// held in application state and by the session middleware.
#[derive(Clone)]
pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenSigner {
    /// Build a signer from an HMAC secret.
    ///
    /// ## Errors
    ///
    /// Returns `CryptoError::WeakSecret` when the secret is shorter than
    /// [`MIN_SECRET_LEN`] bytes.
    pub fn new(secret: &str, ttl_secs: i64) -> Result<Self, CryptoError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(CryptoError::WeakSecret);
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::seconds(ttl_secs),
        })
    }

    /// Token lifetime in seconds
    pub fn ttl_secs(&self) -> i64 {
        self.ttl.num_seconds()
    }

    /// Issue a session token for `user_id`
    pub fn issue(&self, user_id: Uuid) -> Result<String, CryptoError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        Ok(encode(&Header::new(JWT_ALGORITHM), &claims, &self.encoding_key)?)
    }

    /// Validate signature and expiry, returning the claims
    pub fn validate(&self, token: &str) -> Result<Claims, CryptoError> {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.validate_exp = true;

        let data = decode::<Claims>(token, &self.decoding_key, &validation)?;
        Ok(data.claims)
    }

    /// Validate a token and extract the user id from its subject
    pub fn user_id(&self, token: &str) -> Result<Uuid, CryptoError> {
        let claims = self.validate(token)?;
        Uuid::parse_str(&claims.sub).map_err(|_| CryptoError::MalformedSubject(claims.sub))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> TokenSigner {
        TokenSigner::new(&"a".repeat(MIN_SECRET_LEN), 3600).expect("valid secret")
    }

    #[test]
    fn test_issue_and_validate_round_trip() {
        let signer = signer();
        let user_id = Uuid::new_v4();

        let token = signer.issue(user_id).expect("token should be issued");
        let claims = signer.validate(&token).expect("token should validate");

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.exp - claims.iat, 3600);
        assert_eq!(signer.user_id(&token).unwrap(), user_id);
    }

    #[test]
    fn test_rejects_short_secret() {
        let result = TokenSigner::new(&"a".repeat(MIN_SECRET_LEN - 1), 3600);
        assert!(matches!(result, Err(CryptoError::WeakSecret)));
    }

    #[test]
    fn test_rejects_expired_token() {
        let expired = TokenSigner::new(&"a".repeat(MIN_SECRET_LEN), -3600).unwrap();
        let token = expired.issue(Uuid::new_v4()).unwrap();

        assert!(matches!(signer().validate(&token), Err(CryptoError::Token(_))));
    }

    #[test]
    fn test_rejects_token_from_other_secret() {
        let other = TokenSigner::new(&"b".repeat(MIN_SECRET_LEN), 3600).unwrap();
        let token = other.issue(Uuid::new_v4()).unwrap();

        assert!(signer().validate(&token).is_err());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(signer().user_id("not-a-jwt").is_err());
    }

    #[test]
    fn test_malformed_subject() {
        let signer = signer();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "user-123".to_string(),
            iat: now,
            exp: now + 60,
        };
        let token = encode(
            &Header::new(JWT_ALGORITHM),
            &claims,
            &EncodingKey::from_secret("a".repeat(MIN_SECRET_LEN).as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            signer.user_id(&token),
            Err(CryptoError::MalformedSubject(sub)) if sub == "user-123"
        ));
    }
}
