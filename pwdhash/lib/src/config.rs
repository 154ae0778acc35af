//! Hashing configuration and the process-wide current configuration.
//!
//! A [`Config`] is a plain value: the algorithm to hash with plus its work
//! factors. The free functions [`crate::hash`] and [`crate::validate`] read the
//! current configuration through [`get_config`] at call time; [`set_config`]
//! swaps it as a whole.
//!
//! ## Examples
//!
//! ```rust
//! use pwdhash::{Algorithm, Config, DEFAULT_CONFIG};
//!
//! assert_eq!(DEFAULT_CONFIG.to_string(), "Argon2id (m=65536, t=3, p=4)");
//!
//! let cfg = Config::default().with_algorithm(Algorithm::Bcrypt).with_cost(12);
//! assert_eq!(cfg.to_string(), "Bcrypt (cost=12)");
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::salt::RandomSource;

/// Hashing algorithms a configuration can select.
///
/// `Unrecognized` holds any other numeric tag. Such a configuration can be
/// stored and described, but hashing under it fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    Argon2id,
    Bcrypt,
    Unrecognized(u32),
}

impl Algorithm {
    /// Numeric tag of the algorithm (0 for Argon2id, 1 for bcrypt).
    pub fn tag(self) -> u32 {
        match self {
            Self::Argon2id => 0,
            Self::Bcrypt => 1,
            Self::Unrecognized(tag) => tag,
        }
    }
}

impl From<u32> for Algorithm {
    fn from(tag: u32) -> Self {
        match tag {
            0 => Self::Argon2id,
            1 => Self::Bcrypt,
            other => Self::Unrecognized(other),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Argon2id => f.write_str("argon2id"),
            Self::Bcrypt => f.write_str("bcrypt"),
            Self::Unrecognized(tag) => write!(f, "unrecognized({tag})"),
        }
    }
}

/// Error returned when parsing an [`Algorithm`] name fails.
#[derive(Debug, Error)]
#[error("unknown algorithm '{0}' (expected argon2id or bcrypt)")]
pub struct ParseAlgorithmError(String);

impl FromStr for Algorithm {
    type Err = ParseAlgorithmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "argon2id" => Ok(Self::Argon2id),
            "bcrypt" => Ok(Self::Bcrypt),
            _ => Err(ParseAlgorithmError(s.to_string())),
        }
    }
}

/// Algorithm choice and work factors for one hash operation.
///
/// `memory`, `time` and `threads` apply to Argon2id only, `cost` to bcrypt
/// only. Values are not validated here; the primitive rejects bad ones at hash
/// time.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub algorithm: Algorithm,
    /// Argon2 memory in KiB.
    pub memory: u32,
    /// Argon2 iterations.
    pub time: u32,
    /// Argon2 parallel lanes.
    pub threads: u8,
    /// bcrypt work factor (log2 rounds).
    pub cost: u32,
    /// Salt source; `None` uses the OS generator.
    #[serde(skip)]
    pub random_source: Option<Arc<dyn RandomSource>>,
}

/// Moderate work factors suitable for interactive login.
pub const DEFAULT_CONFIG: Config = Config {
    algorithm: Algorithm::Argon2id,
    memory: 64 * 1024,
    time: 3,
    threads: 4,
    cost: bcrypt_default_cost(),
    random_source: None,
};

/// Heavy work factors for high-value secrets.
pub const PARANOID_CONFIG: Config = Config {
    algorithm: Algorithm::Argon2id,
    memory: 192 * 1024,
    time: 12,
    threads: 8,
    cost: 31,
    random_source: None,
};

#[cfg(feature = "bcrypt")]
const fn bcrypt_default_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

#[cfg(not(feature = "bcrypt"))]
const fn bcrypt_default_cost() -> u32 {
    12
}

impl Config {
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_memory(mut self, memory: u32) -> Self {
        self.memory = memory;
        self
    }

    pub fn with_time(mut self, time: u32) -> Self {
        self.time = time;
        self
    }

    pub fn with_threads(mut self, threads: u8) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_cost(mut self, cost: u32) -> Self {
        self.cost = cost;
        self
    }

    pub fn with_random_source(mut self, source: impl RandomSource + 'static) -> Self {
        self.random_source = Some(Arc::new(source));
        self
    }

    /// The configured salt source, if any.
    pub fn random_source(&self) -> Option<&dyn RandomSource> {
        self.random_source.as_deref()
    }

    /// Human-readable summary of this configuration.
    ///
    /// Depends only on `self`, never on the process-wide configuration.
    pub fn describe(&self) -> String {
        self.to_string()
    }
}

impl Default for Config {
    fn default() -> Self {
        DEFAULT_CONFIG
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.algorithm {
            Algorithm::Argon2id => write!(
                f,
                "Argon2id (m={}, t={}, p={})",
                self.memory, self.time, self.threads
            ),
            Algorithm::Bcrypt => write!(f, "Bcrypt (cost={})", self.cost),
            Algorithm::Unrecognized(_) => f.write_str("unknown algorithm"),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("algorithm", &self.algorithm)
            .field("memory", &self.memory)
            .field("time", &self.time)
            .field("threads", &self.threads)
            .field("cost", &self.cost)
            .field("random_source", &self.random_source)
            .finish()
    }
}

/// Random sources compare by identity.
impl PartialEq for Config {
    fn eq(&self, other: &Self) -> bool {
        let same_source = match (&self.random_source, &other.random_source) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        };

        same_source
            && self.algorithm == other.algorithm
            && self.memory == other.memory
            && self.time == other.time
            && self.threads == other.threads
            && self.cost == other.cost
    }
}

static CURRENT: Lazy<RwLock<Config>> = Lazy::new(|| RwLock::new(DEFAULT_CONFIG));

/// Replaces the process-wide configuration.
///
/// The swap is whole-value and unvalidated. A hash running on another thread
/// keeps the snapshot it already read.
pub fn set_config(cfg: Config) {
    tracing::debug!(config = %cfg, "replacing current configuration");
    *CURRENT.write().unwrap_or_else(PoisonError::into_inner) = cfg;
}

/// Returns a snapshot of the process-wide configuration.
pub fn get_config() -> Config {
    CURRENT
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::salt::SeededRandom;
    use serial_test::serial;

    #[test]
    fn default_describes_as_documented() {
        assert_eq!(DEFAULT_CONFIG.describe(), "Argon2id (m=65536, t=3, p=4)");
        assert_eq!(Config::default(), DEFAULT_CONFIG);
    }

    #[test]
    fn paranoid_is_heavier_than_default() {
        assert!(PARANOID_CONFIG.memory > DEFAULT_CONFIG.memory);
        assert!(PARANOID_CONFIG.time > DEFAULT_CONFIG.time);
        assert!(PARANOID_CONFIG.threads > DEFAULT_CONFIG.threads);
        assert!(PARANOID_CONFIG.cost > DEFAULT_CONFIG.cost);
        assert_eq!(PARANOID_CONFIG.describe(), "Argon2id (m=196608, t=12, p=8)");
    }

    #[test]
    fn bcrypt_describes_cost() {
        let cfg = Config::default()
            .with_algorithm(Algorithm::Bcrypt)
            .with_cost(128);
        assert_eq!(cfg.describe(), "Bcrypt (cost=128)");
    }

    #[test]
    fn unrecognized_algorithm_describes_as_unknown() {
        let cfg = Config::default().with_algorithm(Algorithm::from(1024));
        assert_eq!(cfg.algorithm, Algorithm::Unrecognized(1024));
        assert_eq!(cfg.describe(), "unknown algorithm");
    }

    #[test]
    #[serial]
    fn describe_ignores_global_configuration() {
        let bcrypt = Config::default()
            .with_algorithm(Algorithm::Bcrypt)
            .with_cost(11);

        set_config(Config::default().with_algorithm(Algorithm::Unrecognized(1024)));
        assert_eq!(bcrypt.describe(), "Bcrypt (cost=11)");
        assert_eq!(DEFAULT_CONFIG.describe(), "Argon2id (m=65536, t=3, p=4)");

        set_config(DEFAULT_CONFIG);
    }

    #[test]
    #[serial]
    fn set_then_get_round_trips() {
        let cfg = Config::default()
            .with_algorithm(Algorithm::Bcrypt)
            .with_cost(128);
        set_config(cfg.clone());
        assert_eq!(get_config(), cfg);

        let unknown = Config {
            algorithm: Algorithm::Unrecognized(1024),
            memory: 0,
            time: 0,
            threads: 0,
            cost: 0,
            random_source: None,
        };
        set_config(unknown.clone());
        assert_eq!(get_config(), unknown);

        set_config(DEFAULT_CONFIG);
    }

    #[test]
    #[serial]
    fn get_returns_a_snapshot() {
        set_config(DEFAULT_CONFIG);
        let before = get_config();

        set_config(PARANOID_CONFIG);
        assert_eq!(before, DEFAULT_CONFIG);
        assert_eq!(get_config(), PARANOID_CONFIG);

        set_config(DEFAULT_CONFIG);
    }

    #[test]
    #[serial]
    fn set_replaces_the_whole_value() {
        set_config(PARANOID_CONFIG);
        set_config(Config {
            algorithm: Algorithm::Bcrypt,
            memory: 0,
            time: 0,
            threads: 0,
            cost: 4,
            random_source: None,
        });

        let current = get_config();
        assert_eq!(current.memory, 0);
        assert_eq!(current.time, 0);

        set_config(DEFAULT_CONFIG);
    }

    #[test]
    fn random_sources_compare_by_identity() {
        let a = Config::default().with_random_source(SeededRandom::new(1));
        let b = Config::default().with_random_source(SeededRandom::new(1));
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_ne!(a, DEFAULT_CONFIG);
    }

    #[test]
    fn algorithm_tags_round_trip() {
        for tag in [0, 1, 2, 1024, u32::MAX] {
            assert_eq!(Algorithm::from(tag).tag(), tag);
        }
    }

    #[test]
    fn algorithm_parses_names() {
        assert_eq!("argon2id".parse::<Algorithm>().unwrap(), Algorithm::Argon2id);
        assert_eq!("BCrypt".parse::<Algorithm>().unwrap(), Algorithm::Bcrypt);
        let err = "scrypt".parse::<Algorithm>().unwrap_err();
        assert!(err.to_string().contains("scrypt"));
    }

    #[test]
    fn deserializes_with_defaults() {
        let cfg: Config =
            serde_json::from_str(r#"{"algorithm":"bcrypt","cost":11}"#).unwrap();
        assert_eq!(cfg.algorithm, Algorithm::Bcrypt);
        assert_eq!(cfg.cost, 11);
        assert_eq!(cfg.memory, DEFAULT_CONFIG.memory);
        assert!(cfg.random_source.is_none());
    }

    #[test]
    fn serializes_without_random_source() {
        let cfg = Config::default().with_random_source(SeededRandom::new(3));
        let json = serde_json::to_value(&cfg).unwrap();
        assert_eq!(json["algorithm"], "argon2id");
        assert_eq!(json["memory"], 65536);
        assert!(json.get("random_source").is_none());
    }
}
