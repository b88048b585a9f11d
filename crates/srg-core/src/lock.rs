//! Per-snap advisory locks.
//!
//! Each snap has a lock file at `<lock_dir>/<snap>.lock`. Holding an
//! exclusive `flock` on it keeps snapd from starting new processes of that
//! snap, which makes a process census stable for as long as the lock is held.
//!
//! The lock file itself is never removed.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::logging::event_names;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("lock {path} is held by another process")]
    Unavailable { path: PathBuf },

    #[error("cannot lock {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Apply an `flock` operation, retrying when interrupted by a signal.
pub(crate) fn flock(file: &File, op: libc::c_int) -> io::Result<()> {
    let fd = file.as_raw_fd();
    loop {
        // SAFETY: fd is a valid descriptor owned by `file` for the duration of the call.
        let result = unsafe { libc::flock(fd, op) };
        if result == 0 {
            return Ok(());
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}

/// Directory holding per-snap lock files.
#[derive(Debug, Clone)]
pub struct LockDir {
    dir: PathBuf,
}

impl LockDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, snap: &str) -> PathBuf {
        self.dir.join(format!("{snap}.lock"))
    }

    /// Take the snap lock, blocking until it is free.
    pub fn lock(&self, snap: &str) -> Result<SnapLock, LockError> {
        self.acquire(snap, libc::LOCK_EX)
    }

    /// Take the snap lock without waiting.
    pub fn try_lock(&self, snap: &str) -> Result<SnapLock, LockError> {
        self.acquire(snap, libc::LOCK_EX | libc::LOCK_NB)
    }

    fn acquire(&self, snap: &str, op: libc::c_int) -> Result<SnapLock, LockError> {
        let path = self.path_for(snap);
        let io_err = |source| LockError::Io {
            path: path.clone(),
            source,
        };

        std::fs::create_dir_all(&self.dir).map_err(io_err)?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(io_err)?;

        match flock(&file, op) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                return Err(LockError::Unavailable { path });
            }
            Err(source) => return Err(LockError::Io { path, source }),
        }

        debug!(event = event_names::LOCK_ACQUIRED, snap, path = %path.display(), "snap lock acquired");
        Ok(SnapLock { file, path })
    }
}

/// A held snap lock. Released on drop.
#[derive(Debug)]
pub struct SnapLock {
    file: File,
    path: PathBuf,
}

impl SnapLock {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SnapLock {
    fn drop(&mut self) {
        let _ = flock(&self.file, libc::LOCK_UN);
        debug!(event = event_names::LOCK_RELEASED, path = %self.path.display(), "snap lock released");
    }
}
