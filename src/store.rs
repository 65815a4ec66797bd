//! # Seed Store
//!
//! Filesystem bootstrap for root seeds: read a persisted 32-byte seed, or
//! generate and persist a fresh one if the file is missing or too short.
//!
//! This is the one place in the crate that touches I/O. The contract is
//! deliberately small: `open` yields 32 usable bytes, creating parent
//! directories as needed. Concurrent opens of the same path are not
//! serialized; the last writer wins, and callers that need stronger
//! guarantees must provide their own locking around first-time bootstrap.
//!
//! Seed bytes are never logged. The tracing output records only the path
//! and which branch was taken.

use std::io;
use std::path::Path;

use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;
use tracing::debug;

use crate::config::SEED_LENGTH;

/// Errors from seed persistence.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying filesystem operation failed.
    #[error("seed store i/o: {0}")]
    Io(#[from] io::Error),
}

/// Load the seed at `path`, generating and persisting a fresh one if the
/// file is missing or holds fewer than 32 bytes.
///
/// Extra bytes beyond the first 32 are ignored, so a file that grew by
/// accident still yields the original seed.
pub async fn open(path: impl AsRef<Path>) -> Result<[u8; SEED_LENGTH], StoreError> {
    let path = path.as_ref();

    match tokio::fs::read(path).await {
        Ok(existing) if existing.len() >= SEED_LENGTH => {
            let mut seed = [0u8; SEED_LENGTH];
            seed.copy_from_slice(&existing[..SEED_LENGTH]);
            return Ok(seed);
        }
        Ok(_) => debug!(path = %path.display(), "persisted seed too short, regenerating"),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no persisted seed, generating")
        }
        Err(err) => return Err(err.into()),
    }

    let seed = fresh_seed();
    if let Some(parent) = parent_dir(path) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, &seed).await?;

    Ok(seed)
}

/// Blocking variant of [`open`], identical in outcome.
pub fn open_blocking(path: impl AsRef<Path>) -> Result<[u8; SEED_LENGTH], StoreError> {
    let path = path.as_ref();

    match std::fs::read(path) {
        Ok(existing) if existing.len() >= SEED_LENGTH => {
            let mut seed = [0u8; SEED_LENGTH];
            seed.copy_from_slice(&existing[..SEED_LENGTH]);
            return Ok(seed);
        }
        Ok(_) => debug!(path = %path.display(), "persisted seed too short, regenerating"),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no persisted seed, generating")
        }
        Err(err) => return Err(err.into()),
    }

    let seed = fresh_seed();
    if let Some(parent) = parent_dir(path) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, seed)?;

    Ok(seed)
}

fn fresh_seed() -> [u8; SEED_LENGTH] {
    let mut seed = [0u8; SEED_LENGTH];
    OsRng.fill_bytes(&mut seed);
    seed
}

fn parent_dir(path: &Path) -> Option<&Path> {
    path.parent().filter(|p| !p.as_os_str().is_empty())
}
