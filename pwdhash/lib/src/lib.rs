//! Self-describing password hashes.
//!
//! [`hash`] turns a password into a single string that records the algorithm,
//! its work factors, the salt and the derived hash. [`validate`] checks a
//! password against such a string, picking the algorithm from the string's
//! prefix rather than from the current configuration.
//!
//! Supported algorithms:
//!
//! - **Argon2id** (default): `$argon2id$v=19$m=..,t=..,p=..$<salt>$<hash>`
//! - **bcrypt** (`bcrypt` feature, default on): `$2b$<cost>$...`
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `bcrypt` | Yes | bcrypt hashing and validation of `$2*` hashes |
//!
//! ## Configuration
//!
//! The free functions use a process-wide [`Config`] (initially
//! [`DEFAULT_CONFIG`]) replaced with [`set_config`]. Each call takes a snapshot
//! when it starts, so a concurrent [`set_config`] affects only later calls.
//! Code that wants no shared state builds a [`Hasher`] from its own `Config`.
//!
//! ## Examples
//!
//! ```rust
//! use pwdhash::{Config, get_config, hash, set_config, validate};
//!
//! set_config(Config::default().with_memory(1024).with_time(1).with_threads(1));
//! assert_eq!(get_config().to_string(), "Argon2id (m=1024, t=1, p=1)");
//!
//! let encoded = hash("correct horse").unwrap();
//! assert!(validate("correct horse", &encoded).is_ok());
//! assert!(validate("battery staple", &encoded).unwrap_err().is_mismatch());
//! ```

pub mod argon;
#[cfg(feature = "bcrypt")]
pub mod bcrypt_hash;
mod config;
mod error;
mod hasher;
pub mod salt;

pub use argon::{Argon2Params, Argon2idScheme, DecodedHash};
#[cfg(feature = "bcrypt")]
pub use bcrypt_hash::BcryptScheme;
pub use config::{
    Algorithm, Config, DEFAULT_CONFIG, PARANOID_CONFIG, ParseAlgorithmError, get_config,
    set_config,
};
pub use error::{PwdHashError, Result};
pub use hasher::{HashScheme, Hasher};
pub use salt::{OsRandom, RandomSource, SeededRandom};

/// Hashes a password under the current process-wide configuration.
///
/// ## Errors
///
/// - `PwdHashError::UnsupportedAlgorithm` if the configured algorithm is unknown
/// - `PwdHashError::RandomSource` if salt generation fails
/// - algorithm specific errors, see [`argon::hash`] and `bcrypt_hash::hash`
pub fn hash(password: &str) -> Result<String> {
    Hasher::current().hash(password)
}

/// Checks a password against an encoded hash.
///
/// The algorithm comes from the hash's prefix; the current configuration is
/// not consulted.
///
/// ## Errors
///
/// - `PwdHashError::Mismatch` for a wrong password
/// - `PwdHashError::UnsupportedHashFormat` for an unknown prefix
/// - parse errors (see [`PwdHashError::is_malformed`]) for a damaged hash
pub fn validate(password: &str, encoded: &str) -> Result<()> {
    Hasher::current().validate(password, encoded)
}

/// Whether `encoded` was produced by a different algorithm or different work
/// factors than `config`, and so should be replaced after the next successful
/// [`validate`].
///
/// ## Errors
///
/// Returns `PwdHashError::UnsupportedHashFormat` for an unknown prefix, or a
/// parse error for a damaged hash.
pub fn needs_rehash(encoded: &str, config: &Config) -> Result<bool> {
    Hasher::new(config.clone()).needs_rehash(encoded)
}
