//! Argon2id hashing and the encoded hash codec.
//!
//! Hashes are stored as a single self-describing string:
//!
//! ```text
//! $argon2id$v=19$m=<memory>,t=<time>,p=<threads>$<salt>$<hash>
//! ```
//!
//! Salt and hash are standard base64 without padding. The key derivation
//! itself is delegated to the `argon2` crate; this module owns the string
//! form, parameter parsing and comparison.
//!
//! ## Examples
//!
//! ```rust
//! use pwdhash::argon::{decode, encode};
//! use pwdhash::DEFAULT_CONFIG;
//!
//! let encoded = encode(b"0123456789abcdef", &[7u8; 32], &DEFAULT_CONFIG);
//! assert!(encoded.starts_with("$argon2id$v=19$m=65536,t=3,p=4$"));
//!
//! let decoded = decode(&encoded).unwrap();
//! assert_eq!(decoded.salt, b"0123456789abcdef");
//! assert_eq!(decoded.params.memory, 65536);
//! ```

use std::str::FromStr;

use argon2::{Argon2, Params, Version};
use base64::{Engine, engine::general_purpose::STANDARD_NO_PAD};

use crate::config::{Algorithm, Config};
use crate::error::{PwdHashError, Result};
use crate::hasher::HashScheme;
use crate::salt::{SALT_LEN, generate_salt};

/// Prefix every Argon2id encoded hash starts with.
pub const ARGON2ID_PREFIX: &str = "$argon2id$";

/// The only Argon2 version literal accepted (0x13).
pub const VERSION: &str = "v=19";

/// Length in bytes of a freshly derived Argon2id hash.
pub const HASH_LEN: usize = 32;

/// Work factors carried inside an encoded hash.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Argon2Params {
    /// Memory in KiB.
    pub memory: u32,
    /// Iterations.
    pub time: u32,
    /// Parallel lanes.
    pub threads: u8,
}

impl From<&Config> for Argon2Params {
    fn from(config: &Config) -> Self {
        Self {
            memory: config.memory,
            time: config.time,
            threads: config.threads,
        }
    }
}

/// The parts of a parsed Argon2id hash string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedHash {
    pub params: Argon2Params,
    pub salt: Vec<u8>,
    pub hash: Vec<u8>,
}

/// Formats a salt, derived hash and the config's work factors as an encoded
/// hash string. No range checks are done on the config.
pub fn encode(salt: &[u8], hash: &[u8], config: &Config) -> String {
    format!(
        "{ARGON2ID_PREFIX}{VERSION}$m={},t={},p={}${}${}",
        config.memory,
        config.time,
        config.threads,
        STANDARD_NO_PAD.encode(salt),
        STANDARD_NO_PAD.encode(hash),
    )
}

/// Parses an encoded Argon2id hash.
///
/// Parameters may appear in any order. Unknown keys are ignored and missing
/// keys stay at zero.
///
/// ## Errors
///
/// - `PwdHashError::MalformedHash` for a wrong field count or tag, a parameter
///   that is not `key=value`, a value that is not an unsigned integer of the
///   right width, or invalid base64
/// - `PwdHashError::UnsupportedVersion` for any version other than `v=19`
pub fn decode(encoded: &str) -> Result<DecodedHash> {
    let parts: Vec<&str> = encoded.split('$').collect();

    if parts.len() != 6 || parts[1] != "argon2id" {
        return Err(PwdHashError::MalformedHash(
            "expected $argon2id$v=19$<params>$<salt>$<hash>".into(),
        ));
    }

    if parts[2] != VERSION {
        return Err(PwdHashError::UnsupportedVersion(parts[2].to_string()));
    }

    Ok(DecodedHash {
        params: parse_params(parts[3])?,
        salt: decode_b64(parts[4], "salt")?,
        hash: decode_b64(parts[5], "hash")?,
    })
}

fn parse_params(field: &str) -> Result<Argon2Params> {
    let mut params = Argon2Params::default();

    for pair in field.split(',') {
        let (key, value) = pair.split_once('=').ok_or_else(|| {
            PwdHashError::MalformedHash(format!("parameter '{pair}' is not key=value"))
        })?;

        match key {
            "m" => params.memory = parse_value(key, value)?,
            "t" => params.time = parse_value(key, value)?,
            "p" => params.threads = parse_value(key, value)?,
            _ => tracing::trace!(key, "ignoring unknown Argon2 parameter"),
        }
    }

    Ok(params)
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    let digits_only = !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit());

    digits_only
        .then(|| value.parse().ok())
        .flatten()
        .ok_or_else(|| {
            PwdHashError::MalformedHash(format!("invalid value '{value}' for parameter '{key}'"))
        })
}

fn decode_b64(segment: &str, what: &str) -> Result<Vec<u8>> {
    STANDARD_NO_PAD
        .decode(segment)
        .map_err(|e| PwdHashError::MalformedHash(format!("failed to decode {what}: {e}")))
}

/// Hashes a password with Argon2id under `config`'s work factors.
///
/// A 16 byte salt is drawn from the config's random source before any key
/// derivation happens.
///
/// ## Errors
///
/// - `PwdHashError::RandomSource` if the salt cannot be generated
/// - `PwdHashError::InvalidParams` if the primitive rejects the work factors
pub fn hash(password: &str, config: &Config) -> Result<String> {
    let salt = generate_salt(SALT_LEN, config.random_source())?;
    let mut derived = vec![0u8; HASH_LEN];

    derive_key(password, &salt, Argon2Params::from(config), &mut derived)?;

    Ok(encode(&salt, &derived, config))
}

/// Verifies a password against an encoded Argon2id hash.
///
/// The key is recomputed with the parameters and salt stored in the hash, at
/// the stored hash's length.
///
/// Stored parameters are used as-is: `m` is allocated in KiB up to
/// `u32::MAX`, so only verify hashes from a trusted store, or check
/// [`decode`]'s parameters against a ceiling first.
///
/// ## Errors
///
/// - any error from [`decode`]
/// - `PwdHashError::InvalidParams` if the stored parameters, salt or hash
///   length are rejected by the primitive
/// - `PwdHashError::Mismatch` if the password is wrong
pub fn verify(password: &str, encoded: &str) -> Result<()> {
    let decoded = decode(encoded)?;
    tracing::debug!(
        memory = decoded.params.memory,
        time = decoded.params.time,
        threads = decoded.params.threads,
        "verifying argon2id hash"
    );

    let mut computed = vec![0u8; decoded.hash.len()];
    derive_key(password, &decoded.salt, decoded.params, &mut computed)?;

    if constant_time_eq(&computed, &decoded.hash) {
        Ok(())
    } else {
        Err(PwdHashError::Mismatch)
    }
}

fn derive_key(password: &str, salt: &[u8], params: Argon2Params, out: &mut [u8]) -> Result<()> {
    let params = Params::new(
        params.memory,
        params.time,
        u32::from(params.threads),
        Some(out.len()),
    )
    .map_err(|e| PwdHashError::InvalidParams(e.to_string()))?;

    Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params)
        .hash_password_into(password.as_bytes(), salt, out)
        .map_err(|e| PwdHashError::InvalidParams(e.to_string()))
}

/// Byte equality whose running time does not depend on where the inputs
/// first differ. Lengths are not secret.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let diff = a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y));
    std::hint::black_box(diff) == 0
}

/// The Argon2id entry in a [`crate::Hasher`] registry.
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2idScheme;

impl HashScheme for Argon2idScheme {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Argon2id
    }

    fn prefix(&self) -> &str {
        ARGON2ID_PREFIX
    }

    fn hash(&self, password: &str, config: &Config) -> Result<String> {
        hash(password, config)
    }

    fn verify(&self, password: &str, encoded: &str) -> Result<()> {
        verify(password, encoded)
    }

    fn needs_rehash(&self, encoded: &str, config: &Config) -> Result<bool> {
        Ok(decode(encoded)?.params != Argon2Params::from(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_CONFIG;
    use crate::salt::SeededRandom;

    fn fast_config() -> Config {
        Config::default().with_memory(1024).with_time(1).with_threads(1)
    }

    fn b64(bytes: &[u8]) -> String {
        STANDARD_NO_PAD.encode(bytes)
    }

    #[test]
    fn encode_uses_fixed_field_order() {
        let encoded = encode(&[0u8; 4], &[0xFFu8; 3], &DEFAULT_CONFIG);
        assert_eq!(encoded, "$argon2id$v=19$m=65536,t=3,p=4$AAAAAA$////");
    }

    #[test]
    fn encode_does_not_pad() {
        let encoded = encode(&[1u8; SALT_LEN], &[2u8; HASH_LEN], &fast_config());
        let parts: Vec<&str> = encoded.split('$').collect();
        assert_eq!(parts.len(), 6);
        assert_eq!(parts[4].len(), 22);
        assert_eq!(parts[5].len(), 43);
        assert!(!encoded.ends_with('='));
    }

    #[test]
    fn decode_reads_parameters_in_any_order() {
        let encoded = format!(
            "$argon2id$v=19$p=2,t=5,m=2048${}${}",
            b64(b"saltsalt"),
            b64(b"hash")
        );
        let decoded = decode(&encoded).unwrap();
        assert_eq!(
            decoded.params,
            Argon2Params {
                memory: 2048,
                time: 5,
                threads: 2
            }
        );
        assert_eq!(decoded.salt, b"saltsalt");
        assert_eq!(decoded.hash, b"hash");
    }

    #[test]
    fn decode_ignores_unknown_keys() {
        let encoded = format!(
            "$argon2id$v=19$m=1024,x=anything,t=1,p=1${}${}",
            b64(b"s"),
            b64(b"h")
        );
        let decoded = decode(&encoded).unwrap();
        assert_eq!(decoded.params.memory, 1024);
        assert_eq!(decoded.params.time, 1);
        assert_eq!(decoded.params.threads, 1);
    }

    #[test]
    fn decode_leaves_missing_keys_at_zero() {
        let decoded = decode("$argon2id$v=19$m=1024$AAAA$AAAA").unwrap();
        assert_eq!(decoded.params.memory, 1024);
        assert_eq!(decoded.params.time, 0);
        assert_eq!(decoded.params.threads, 0);
    }

    #[test]
    fn decode_rejects_wrong_shape() {
        for input in [
            "not valid argon hash",
            "$argon2id$oops!",
            "$argon2i$v=19$m=1024,t=1,p=1$AAAA$AAAA",
            "$argon2id$v=19$m=1024,t=1,p=1$AAAA$AAAA$extra",
            "",
        ] {
            assert!(
                matches!(decode(input), Err(PwdHashError::MalformedHash(_))),
                "{input:?} should be malformed"
            );
        }
    }

    #[test]
    fn decode_rejects_other_versions() {
        let err = decode("$argon2id$v=20$$$").unwrap_err();
        assert!(matches!(err, PwdHashError::UnsupportedVersion(ref v) if v == "v=20"));
    }

    #[test]
    fn decode_rejects_bad_parameters() {
        for input in [
            "$argon2id$v=19$mx,tz,pq$$",
            "$argon2id$v=19$m=x,t=z,p=q$$",
            "$argon2id$v=19$$$",
            "$argon2id$v=19$m=-1,t=1,p=1$$",
            "$argon2id$v=19$m=+1,t=1,p=1$$",
            "$argon2id$v=19$m=,t=1,p=1$$",
            "$argon2id$v=19$m=4294967296,t=1,p=1$$",
            "$argon2id$v=19$m=1024,t=1,p=256$$",
        ] {
            assert!(
                matches!(decode(input), Err(PwdHashError::MalformedHash(_))),
                "{input:?} should be malformed"
            );
        }
    }

    #[test]
    fn decode_accepts_width_limits() {
        let decoded = decode("$argon2id$v=19$m=4294967295,t=4294967295,p=255$$").unwrap();
        assert_eq!(decoded.params.memory, u32::MAX);
        assert_eq!(decoded.params.time, u32::MAX);
        assert_eq!(decoded.params.threads, u8::MAX);
    }

    #[test]
    fn decode_rejects_invalid_base64() {
        for input in [
            "$argon2id$v=19$m=1024,t=1,p=1$wrong!zalt$",
            "$argon2id$v=19$m=1024,t=1,p=1$ABCD$wrong!hash",
            "$argon2id$v=19$m=1024,t=1,p=1$ABCD$EFGH==",
        ] {
            let err = decode(input).unwrap_err();
            assert!(err.is_malformed(), "{input:?} gave {err:?}");
        }
    }

    #[test]
    fn hash_then_verify() {
        let encoded = hash("password123", &fast_config()).unwrap();
        assert!(encoded.starts_with("$argon2id$v=19$m=1024,t=1,p=1$"));
        verify("password123", &encoded).unwrap();
    }

    #[test]
    fn verify_wrong_password_is_mismatch() {
        let encoded = hash("password123", &fast_config()).unwrap();
        let err = verify("password124", &encoded).unwrap_err();
        assert!(err.is_mismatch());
    }

    #[test]
    fn hash_output_has_expected_lengths() {
        let decoded = decode(&hash("pw", &fast_config()).unwrap()).unwrap();
        assert_eq!(decoded.salt.len(), SALT_LEN);
        assert_eq!(decoded.hash.len(), HASH_LEN);
    }

    #[test]
    fn seeded_source_makes_hash_deterministic() {
        let a = hash("pw", &fast_config().with_random_source(SeededRandom::new(42))).unwrap();
        let b = hash("pw", &fast_config().with_random_source(SeededRandom::new(42))).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn os_source_makes_hashes_unique() {
        let a = hash("pw", &fast_config()).unwrap();
        let b = hash("pw", &fast_config()).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn tampered_hash_is_mismatch() {
        let decoded = decode(&hash("pw", &fast_config()).unwrap()).unwrap();
        let forged = format!(
            "$argon2id$v=19$m=1024,t=1,p=1${}${}",
            b64(&decoded.salt),
            b64(&[0u8; HASH_LEN])
        );
        assert!(verify("pw", &forged).unwrap_err().is_mismatch());
    }

    #[test]
    fn verify_uses_stored_parameters() {
        let encoded = hash("pw", &fast_config().with_memory(2048).with_time(2)).unwrap();
        let relabelled = encoded.replace("m=2048,t=2", "m=1024,t=2");
        verify("pw", &encoded).unwrap();
        assert!(verify("pw", &relabelled).unwrap_err().is_mismatch());
    }

    #[test]
    fn verify_honours_stored_hash_length() {
        let salt = [9u8; SALT_LEN];
        let mut long = vec![0u8; 64];
        derive_key(
            "pw",
            &salt,
            Argon2Params {
                memory: 1024,
                time: 1,
                threads: 1,
            },
            &mut long,
        )
        .unwrap();
        let encoded = encode(&salt, &long, &fast_config());
        verify("pw", &encoded).unwrap();
    }

    #[test]
    fn short_salt_and_hash_are_invalid_params() {
        let err = verify("P@ssw0rd!#", "$argon2id$v=19$m=1024,t=1,p=1$ABCD$EFGH").unwrap_err();
        assert!(matches!(err, PwdHashError::InvalidParams(_)), "{err:?}");
    }

    #[test]
    fn missing_time_is_invalid_params() {
        let encoded = format!(
            "$argon2id$v=19$m=1024,p=1${}${}",
            b64(&[1u8; SALT_LEN]),
            b64(&[2u8; HASH_LEN])
        );
        let err = verify("pw", &encoded).unwrap_err();
        assert!(matches!(err, PwdHashError::InvalidParams(_)), "{err:?}");
    }

    #[test]
    fn zero_threads_fails_at_hash_time() {
        let err = hash("pw", &fast_config().with_threads(0)).unwrap_err();
        assert!(matches!(err, PwdHashError::InvalidParams(_)), "{err:?}");
    }

    #[test]
    fn needs_rehash_compares_work_factors() {
        let encoded = hash("pw", &fast_config()).unwrap();
        assert!(!Argon2idScheme.needs_rehash(&encoded, &fast_config()).unwrap());
        assert!(
            Argon2idScheme
                .needs_rehash(&encoded, &fast_config().with_time(2))
                .unwrap()
        );
        assert!(Argon2idScheme.needs_rehash(&encoded, &DEFAULT_CONFIG).unwrap());
    }

    #[test]
    fn constant_time_eq_compares_content_and_length() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(constant_time_eq(b"", b""));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"xbc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
    }
}
