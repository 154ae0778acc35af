//! bcrypt hashing, a thin pass-through to the `bcrypt` crate.
//!
//! The encoded form (`$2b$<cost>$<salt+hash>`) belongs to the primitive. This
//! module only enforces input limits, feeds it a salt from the configured
//! random source, and maps its errors.

use bcrypt::Version;

use crate::config::{Algorithm, Config};
use crate::error::{PwdHashError, Result};
use crate::hasher::HashScheme;
use crate::salt::{SALT_LEN, generate_salt};

/// Prefix shared by every bcrypt variant (`$2a$`, `$2b$`, `$2y$`, ...).
pub const BCRYPT_PREFIX: &str = "$2";

/// bcrypt ignores input past this many bytes; longer passwords are rejected.
pub const MAX_PASSWORD_LEN: usize = 72;

pub const MIN_COST: u32 = 4;
pub const MAX_COST: u32 = 31;

fn check_length(password: &str) -> Result<()> {
    if password.len() > MAX_PASSWORD_LEN {
        return Err(PwdHashError::PasswordTooLong {
            len: password.len(),
        });
    }
    Ok(())
}

/// The cost actually used for a configured cost.
///
/// Costs below the minimum mean "use the default".
fn effective_cost(cost: u32) -> Result<u32> {
    match cost {
        cost if cost > MAX_COST => Err(PwdHashError::CostOutOfRange(cost)),
        cost if cost < MIN_COST => {
            tracing::debug!(cost, default = bcrypt::DEFAULT_COST, "using default bcrypt cost");
            Ok(bcrypt::DEFAULT_COST)
        }
        cost => Ok(cost),
    }
}

/// Hashes a password with bcrypt at `config.cost`.
///
/// A cost below the minimum falls back to `bcrypt::DEFAULT_COST`, so a config
/// that only names the algorithm still hashes.
///
/// ## Errors
///
/// - `PwdHashError::PasswordTooLong` past 72 bytes
/// - `PwdHashError::CostOutOfRange` above cost 31
/// - `PwdHashError::RandomSource` if the salt cannot be generated
/// - `PwdHashError::Bcrypt` for any other primitive failure
pub fn hash(password: &str, config: &Config) -> Result<String> {
    check_length(password)?;
    let cost = effective_cost(config.cost)?;

    let salt: [u8; SALT_LEN] = generate_salt(SALT_LEN, config.random_source())?
        .try_into()
        .map_err(|_| PwdHashError::Bcrypt("salt has wrong length".into()))?;

    bcrypt::hash_with_salt(password, cost, salt)
        .map(|parts| parts.format_for_version(Version::TwoB))
        .map_err(|e| PwdHashError::Bcrypt(e.to_string()))
}

/// Verifies a password against a bcrypt hash.
///
/// The hash is parsed before the password length is checked, so an
/// unparseable hash is reported as malformed whatever the candidate.
///
/// ## Errors
///
/// - `PwdHashError::MalformedHash` if the primitive cannot parse `encoded`
/// - `PwdHashError::PasswordTooLong` past 72 bytes
/// - `PwdHashError::Mismatch` if the password is wrong
pub fn verify(password: &str, encoded: &str) -> Result<()> {
    let matched =
        bcrypt::verify(password, encoded).map_err(|e| PwdHashError::MalformedHash(e.to_string()))?;
    check_length(password)?;

    if matched {
        Ok(())
    } else {
        Err(PwdHashError::Mismatch)
    }
}

/// Reads the cost field of a `$2?$<cost>$...` hash.
fn stored_cost(encoded: &str) -> Result<u32> {
    encoded
        .split('$')
        .nth(2)
        .filter(|cost| cost.len() == 2)
        .and_then(|cost| cost.parse().ok())
        .ok_or_else(|| PwdHashError::MalformedHash("missing bcrypt cost".into()))
}

/// The bcrypt entry in a [`crate::Hasher`] registry.
#[derive(Debug, Default, Clone, Copy)]
pub struct BcryptScheme;

impl HashScheme for BcryptScheme {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Bcrypt
    }

    fn prefix(&self) -> &str {
        BCRYPT_PREFIX
    }

    fn hash(&self, password: &str, config: &Config) -> Result<String> {
        hash(password, config)
    }

    fn verify(&self, password: &str, encoded: &str) -> Result<()> {
        verify(password, encoded)
    }

    fn needs_rehash(&self, encoded: &str, config: &Config) -> Result<bool> {
        Ok(stored_cost(encoded)? != effective_cost(config.cost)?)
    }
}
