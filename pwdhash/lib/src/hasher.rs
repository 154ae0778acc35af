//! Algorithm dispatch.
//!
//! A [`Hasher`] owns a [`Config`] snapshot and a registry of [`HashScheme`]s.
//! Hashing picks the scheme whose algorithm matches the configuration;
//! validation picks the scheme whose prefix matches the encoded string and
//! never looks at the configuration, so hashes stay verifiable after the
//! work factors or the algorithm change.
//!
//! ## Examples
//!
//! ```rust
//! use pwdhash::{Config, Hasher};
//!
//! let hasher = Hasher::new(Config::default().with_memory(1024).with_time(1).with_threads(1));
//! let encoded = hasher.hash("hunter2").unwrap();
//!
//! assert!(hasher.validate("hunter2", &encoded).is_ok());
//! assert!(hasher.validate("hunter3", &encoded).unwrap_err().is_mismatch());
//! ```

use std::fmt;

use crate::argon::Argon2idScheme;
use crate::config::{Algorithm, Config, get_config};
use crate::error::{PwdHashError, Result};

/// One password hashing algorithm and its self-describing string form.
pub trait HashScheme: Send + Sync + fmt::Debug {
    /// The configuration algorithm this scheme hashes for.
    fn algorithm(&self) -> Algorithm;

    /// Literal prefix identifying this scheme's encoded hashes.
    fn prefix(&self) -> &str;

    fn hash(&self, password: &str, config: &Config) -> Result<String>;

    fn verify(&self, password: &str, encoded: &str) -> Result<()>;

    /// Whether `encoded` (already known to carry this scheme's prefix) was made
    /// with different work factors than `config`.
    fn needs_rehash(&self, encoded: &str, config: &Config) -> Result<bool>;
}

/// Hashes and validates passwords under one configuration.
#[derive(Debug)]
pub struct Hasher {
    config: Config,
    schemes: Vec<Box<dyn HashScheme>>,
}

impl Hasher {
    /// A hasher with the built-in Argon2id and bcrypt schemes.
    pub fn new(config: Config) -> Self {
        let mut hasher = Self::empty(config);
        hasher.register(Argon2idScheme);
        #[cfg(feature = "bcrypt")]
        hasher.register(crate::bcrypt_hash::BcryptScheme);
        hasher
    }

    /// A hasher with no schemes registered.
    pub fn empty(config: Config) -> Self {
        Self {
            config,
            schemes: Vec::new(),
        }
    }

    /// A hasher over the current process-wide configuration.
    pub fn current() -> Self {
        Self::new(get_config())
    }

    /// Adds a scheme. Later registrations take precedence over earlier ones
    /// for both algorithm and prefix lookups.
    pub fn register(&mut self, scheme: impl HashScheme + 'static) -> &mut Self {
        self.schemes.push(Box::new(scheme));
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Hashes `password` with the configured algorithm.
    ///
    /// ## Errors
    ///
    /// Returns `PwdHashError::UnsupportedAlgorithm` if no registered scheme
    /// handles the configured algorithm, otherwise whatever the scheme reports.
    pub fn hash(&self, password: &str) -> Result<String> {
        let algorithm = self.config.algorithm;
        let scheme = self
            .schemes
            .iter()
            .rev()
            .find(|scheme| scheme.algorithm() == algorithm)
            .ok_or(PwdHashError::UnsupportedAlgorithm(algorithm))?;

        tracing::debug!(%algorithm, "hashing password");
        scheme.hash(password, &self.config)
    }

    /// Checks `password` against `encoded`, choosing the scheme by prefix.
    ///
    /// ## Errors
    ///
    /// - `PwdHashError::UnsupportedHashFormat` if no scheme claims the prefix
    /// - `PwdHashError::Mismatch` for a wrong password
    /// - any parse or primitive error from the scheme
    pub fn validate(&self, password: &str, encoded: &str) -> Result<()> {
        let scheme = self.scheme_for(encoded)?;
        tracing::debug!(algorithm = %scheme.algorithm(), "validating password");

        let result = scheme.verify(password, encoded);
        if let Err(ref e) = result {
            tracing::debug!(error = %e, "validation failed");
        }
        result
    }

    /// Whether `encoded` should be replaced by a fresh hash under this
    /// hasher's configuration: it uses another algorithm or other work
    /// factors.
    ///
    /// ## Errors
    ///
    /// Returns `PwdHashError::UnsupportedHashFormat` for an unknown prefix, or
    /// a parse error from the scheme.
    pub fn needs_rehash(&self, encoded: &str) -> Result<bool> {
        let scheme = self.scheme_for(encoded)?;
        if scheme.algorithm() != self.config.algorithm {
            return Ok(true);
        }
        scheme.needs_rehash(encoded, &self.config)
    }

    fn scheme_for(&self, encoded: &str) -> Result<&dyn HashScheme> {
        self.schemes
            .iter()
            .rev()
            .find(|scheme| encoded.starts_with(scheme.prefix()))
            .map(|scheme| &**scheme)
            .ok_or(PwdHashError::UnsupportedHashFormat)
    }
}

impl Default for Hasher {
    fn default() -> Self {
        Self::current()
    }
}
