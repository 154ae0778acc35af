//! Random salt generation.
//!
//! Salts are read from a [`RandomSource`]. When a configuration carries no
//! source, the platform CSPRNG ([`OsRandom`]) is used. Tests and fixtures can
//! plug in [`SeededRandom`] for reproducible output, or any custom source.

use std::fmt;
use std::io;
use std::sync::{Mutex, PoisonError};

use rand::rngs::{OsRng, StdRng};
use rand::{RngCore, SeedableRng};

use crate::error::{PwdHashError, Result};

/// Length in bytes of every generated salt.
pub const SALT_LEN: usize = 16;

/// A provider of random bytes, read-style.
///
/// `read` fills as much of `buf` as it can and reports how many bytes were
/// written. Returning fewer than `buf.len()` bytes is treated as a failure by
/// [`generate_salt`].
pub trait RandomSource: Send + Sync + fmt::Debug {
    fn read(&self, buf: &mut [u8]) -> io::Result<usize>;
}

/// The operating system's cryptographically secure generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        OsRng.try_fill_bytes(buf).map_err(io::Error::other)?;
        Ok(buf.len())
    }
}

/// A deterministic source seeded from a `u64`.
///
/// ## Warning
///
/// Never use this for real credentials. Two hashes made from the same seed
/// share a salt.
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl fmt::Debug for SeededRandom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeededRandom").finish_non_exhaustive()
    }
}

impl RandomSource for SeededRandom {
    fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .fill_bytes(buf);
        Ok(buf.len())
    }
}

/// Reads `size` random bytes from `source`, or from [`OsRandom`] when `None`.
///
/// ## Errors
///
/// Returns `PwdHashError::RandomSource` carrying the source's own error, or an
/// `UnexpectedEof` error when the source returned fewer bytes than requested.
pub fn generate_salt(size: usize, source: Option<&dyn RandomSource>) -> Result<Vec<u8>> {
    let mut salt = vec![0u8; size];
    let read = source
        .unwrap_or(&OsRandom)
        .read(&mut salt)
        .map_err(PwdHashError::RandomSource)?;

    if read < size {
        return Err(PwdHashError::RandomSource(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("random source returned {read} of {size} bytes"),
        )));
    }

    tracing::trace!(size, "generated salt");
    Ok(salt)
}
