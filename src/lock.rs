//! Single-instance run lock
//!
//! A scheduled invocation that starts while a previous run is still going
//! must exit instead of running alongside it. [`RunLock::acquire`] creates
//! the lock file atomically (`create_new`) and records the owning pid; the
//! file is removed when the lock is dropped.
//!
//! An existing lock is honoured only while it is younger than `stale_after`
//! and its process is still alive. Anything else is treated as left behind
//! by a crashed run and replaced.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

/// Attempts at creating the lock file after removing a stale one
const MAX_ACQUIRE_ATTEMPTS: u32 = 3;

/// Reads of a lock file that may still be being written
const MAX_READ_RETRIES: u32 = 3;
const READ_RETRY_DELAY: Duration = Duration::from_millis(10);

/// Contents of the lock file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockInfo {
    /// Process ID that created the lock
    pub pid: u32,
    /// When the lock was created
    pub created_at: DateTime<Utc>,
    /// blog-pipeline version that created the lock
    pub version: String,
}

/// Held run lock; released on drop
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
    info: LockInfo,
}

impl RunLock {
    /// Acquire the lock at `path`
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyRunning`] if a live, fresh lock is held by another process
    /// - [`Error::Lock`] if the lock file cannot be created
    pub fn acquire(path: &Path, stale_after: Duration) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| {
                Error::Lock(format!("cannot create lock directory {}: {e}", parent.display()))
            })?;
        }

        for attempt in 0..MAX_ACQUIRE_ATTEMPTS {
            let info = LockInfo {
                pid: process::id(),
                created_at: Utc::now(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            };

            match fs::OpenOptions::new()
                .create_new(true)
                .write(true)
                .open(path)
            {
                Ok(file) => return Self::finalize(path, file, info),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    Self::check_existing(path, stale_after)?;
                    match fs::remove_file(path) {
                        Ok(()) => {}
                        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                        Err(e) => {
                            return Err(Error::Lock(format!(
                                "cannot remove stale lock {}: {e}",
                                path.display()
                            )));
                        }
                    }
                    tracing::warn!(path = %path.display(), attempt, "removed stale run lock");
                }
                Err(e) => {
                    return Err(Error::Lock(format!(
                        "cannot create lock file {}: {e}",
                        path.display()
                    )));
                }
            }
        }

        Err(Error::Lock(format!(
            "lock {} was taken by another process after stale removal",
            path.display()
        )))
    }

    /// Path of the lock file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Information written to the lock file
    pub fn info(&self) -> &LockInfo {
        &self.info
    }

    fn finalize(path: &Path, mut file: fs::File, info: LockInfo) -> Result<Self> {
        let write = serde_json::to_vec_pretty(&info)
            .map_err(io::Error::other)
            .and_then(|json| file.write_all(&json))
            .and_then(|()| file.sync_all());

        if let Err(e) = write {
            let _ = fs::remove_file(path);
            return Err(Error::Lock(format!(
                "cannot write lock file {}: {e}",
                path.display()
            )));
        }

        tracing::debug!(path = %path.display(), pid = info.pid, "run lock acquired");
        Ok(Self {
            path: path.to_path_buf(),
            info,
        })
    }

    /// Fail with `AlreadyRunning` unless the existing lock may be replaced
    fn check_existing(path: &Path, stale_after: Duration) -> Result<()> {
        let Some(existing) = read_lock_info(path) else {
            // Missing or unreadable after retries: left behind by a crashed writer
            return Ok(());
        };

        let age = Utc::now()
            .signed_duration_since(existing.created_at)
            .to_std()
            .unwrap_or(Duration::ZERO);

        if age < stale_after && is_process_running(existing.pid) {
            return Err(Error::AlreadyRunning {
                pid: existing.pid,
                lock_path: path.to_path_buf(),
            });
        }

        tracing::info!(
            pid = existing.pid,
            age_secs = age.as_secs(),
            "existing run lock is abandoned"
        );
        Ok(())
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        // Only remove the file if it is still ours
        if read_lock_info(&self.path).is_some_and(|info| info == self.info) {
            let _ = fs::remove_file(&self.path);
        }
    }
}

/// Read and parse a lock file, retrying briefly while it may be mid-write
fn read_lock_info(path: &Path) -> Option<LockInfo> {
    for attempt in 0..MAX_READ_RETRIES {
        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str::<LockInfo>(&content) {
                Ok(info) => return Some(info),
                Err(_) if attempt + 1 < MAX_READ_RETRIES => {
                    std::thread::sleep(READ_RETRY_DELAY);
                }
                Err(_) => return None,
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(_) if attempt + 1 < MAX_READ_RETRIES => std::thread::sleep(READ_RETRY_DELAY),
            Err(_) => return None,
        }
    }
    None
}

/// Check if a process with the given PID is still running
fn is_process_running(pid: u32) -> bool {
    #[cfg(unix)]
    {
        let Ok(pid) = i32::try_from(pid) else {
            return false;
        };
        // SAFETY: signal 0 performs error checking only and sends nothing
        let rc = unsafe { libc::kill(pid, 0) };
        if rc == 0 {
            true
        } else {
            // EPERM: the process exists but belongs to someone else
            matches!(
                io::Error::last_os_error().raw_os_error(),
                Some(code) if code == libc::EPERM
            )
        }
    }

    #[cfg(not(unix))]
    {
        let _ = pid;
        true
    }
}
