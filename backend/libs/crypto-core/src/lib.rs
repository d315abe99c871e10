//! Session token and password primitives shared by the social backend.
//!
//! - `jwt`: HS256 session tokens carried in the auth cookie
//! - `password`: Argon2id credential hashing

pub mod jwt;
pub mod password;

pub use jwt::{Claims, TokenSigner, MIN_SECRET_LEN};
pub use password::{hash_password, verify_password};

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("JWT secret too short: at least 32 bytes are required")]
    WeakSecret,

    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("malformed token subject: {0}")]
    MalformedSubject(String),

    #[error("password hashing failed: {0}")]
    PasswordHash(String),
}
