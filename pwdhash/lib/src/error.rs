//! Error types for password hashing and validation.

use thiserror::Error;

use crate::config::Algorithm;

/// Errors returned by hashing, validation and the codec.
///
/// Every error is recoverable by the caller. [`PwdHashError::Mismatch`] is the
/// ordinary "wrong password" outcome rather than a fault.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PwdHashError {
    /// The encoded hash does not follow the expected grammar.
    #[error("malformed password hash: {0}")]
    MalformedHash(String),

    /// The Argon2 version literal is not the supported `v=19`.
    #[error("unsupported Argon2 version: {0}")]
    UnsupportedVersion(String),

    /// The configured algorithm has no hashing scheme.
    #[error("unsupported hashing algorithm: {0:?}")]
    UnsupportedAlgorithm(Algorithm),

    /// The encoded hash prefix matches no known scheme.
    #[error("unsupported hash format")]
    UnsupportedHashFormat,

    /// The password does not match the stored hash.
    #[error("password does not match")]
    Mismatch,

    /// Salt generation failed before any hashing work was done.
    #[error("random source failed: {0}")]
    RandomSource(#[source] std::io::Error),

    /// The password exceeds bcrypt's 72 byte input ceiling.
    #[error("password is {len} bytes, bcrypt accepts at most 72")]
    PasswordTooLong { len: usize },

    /// The bcrypt cost is outside the range the primitive accepts.
    #[error("bcrypt cost {0} is out of range (4..=31)")]
    CostOutOfRange(u32),

    /// The Argon2 primitive rejected the work factors, salt or output length.
    #[error("invalid Argon2 parameters: {0}")]
    InvalidParams(String),

    /// Any other failure reported by the bcrypt primitive.
    #[error("failed to hash password using bcrypt: {0}")]
    Bcrypt(String),
}

impl PwdHashError {
    /// Returns `true` for a well-formed hash that did not match the password.
    pub fn is_mismatch(&self) -> bool {
        matches!(self, Self::Mismatch)
    }

    /// Returns `true` when the stored string cannot be used as a hash at all.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::MalformedHash(_) | Self::UnsupportedVersion(_) | Self::UnsupportedHashFormat
        )
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PwdHashError>;
