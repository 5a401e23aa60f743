//! Execution lock marker
//!
//! A single persistent marker whose presence means "a run is in progress".
//! The marker is advisory: it is only ever created by `acquire` and removed
//! by `release`, and nothing enforces it at the OS level.
//!
//! There is no expiry. If the process dies while holding the marker, the
//! marker stays behind and blocks every later trigger until an operator
//! removes it (`shopflow lock clear`).

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info};

/// Errors raised while taking or dropping the lock marker
#[derive(Debug, Error)]
pub enum LockError {
    #[error("lock marker {0} already exists")]
    AlreadyHeld(PathBuf),

    #[error("failed to create lock marker {path}: {source}")]
    Acquire {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to remove lock marker {path}: {source}")]
    Release {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Exclusive marker guarding single-instance execution
///
/// Implementations may back this with a file, an OS advisory lock or
/// anything else; callers only rely on this contract.
pub trait LockMarker: Send + Sync {
    /// Returns `true` if the marker currently exists
    fn is_held(&self) -> bool;

    /// Creates the marker, recording the current process id
    fn acquire(&self) -> Result<(), LockError>;

    /// Removes the marker; succeeds if it is already gone
    fn release(&self) -> Result<(), LockError>;

    /// The recorded owner of the marker, if it exists and is readable
    fn owner(&self) -> Option<String>;
}

/// Lock marker backed by a file holding the owner's pid
pub struct FileLock {
    path: PathBuf,
}

impl FileLock {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LockMarker for FileLock {
    fn is_held(&self) -> bool {
        self.path.exists()
    }

    fn acquire(&self) -> Result<(), LockError> {
        let acquire_err = |source| LockError::Acquire {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(acquire_err)?;
        }

        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(LockError::AlreadyHeld(self.path.clone()));
            }
            Err(e) => return Err(acquire_err(e)),
        };

        if let Err(e) = file.write_all(std::process::id().to_string().as_bytes()) {
            // Do not leave a half-written marker behind
            let _ = fs::remove_file(&self.path);
            return Err(acquire_err(e));
        }

        info!("Acquired lock {}", self.path.display());
        Ok(())
    }

    fn release(&self) -> Result<(), LockError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!("Released lock {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Lock {} already absent", self.path.display());
                Ok(())
            }
            Err(source) => Err(LockError::Release {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn owner(&self) -> Option<String> {
        fs::read_to_string(&self.path)
            .ok()
            .map(|s| s.trim().to_string())
    }
}

/// Scoped hold on a lock marker
///
/// The marker is released when the guard is dropped, on every exit path of
/// the holder including early returns and unwinding.
pub struct LockGuard<'a> {
    marker: &'a dyn LockMarker,
}

impl<'a> LockGuard<'a> {
    pub fn acquire(marker: &'a dyn LockMarker) -> Result<Self, LockError> {
        marker.acquire()?;
        Ok(Self { marker })
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.marker.release() {
            error!("Failed to release lock: {}", e);
        }
    }
}
