// Run lock for the cache directory.
// Keeps overlapping populator runs from deciding the same timestamp is missing.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::Utc;

use crate::error::{Result, SuncacheError};

use super::store;

pub const LOCK_FILE_NAME: &str = ".suncache.lock";

/// Locks older than this are assumed to belong to a crashed run.
pub const STALE_LOCK_AGE: Duration = Duration::from_secs(60 * 60);

/// Exclusive lock on a cache directory, released on drop.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    /// Acquire the lock, replacing it if a previous holder left it stale.
    pub fn acquire(cache_dir: &Path) -> Result<Self> {
        let path = cache_dir.join(LOCK_FILE_NAME);

        match Self::create(&path) {
            Ok(lock) => Ok(lock),
            Err(SuncacheError::Io(e)) if e.kind() == ErrorKind::AlreadyExists => {
                if !is_stale(&path) {
                    return Err(SuncacheError::Locked(path));
                }
                tracing::warn!("Replacing stale lock at {}", path.display());
                fs::remove_file(&path)?;
                Self::create(&path).map_err(|e| match e {
                    SuncacheError::Io(io) if io.kind() == ErrorKind::AlreadyExists => {
                        SuncacheError::Locked(path.clone())
                    }
                    other => other,
                })
            }
            Err(e) => Err(e),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn create(path: &Path) -> Result<Self> {
        let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
        writeln!(file, "{} {}", std::process::id(), Utc::now().to_rfc3339())?;
        Ok(Self {
            path: path.to_path_buf(),
        })
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!("Failed to remove lock {}: {}", self.path.display(), e);
        }
    }
}

fn is_stale(path: &Path) -> bool {
    store::modified_at(path)
        .ok()
        .and_then(|modified| SystemTime::now().duration_since(modified).ok())
        .is_some_and(|age| age > STALE_LOCK_AGE)
}
