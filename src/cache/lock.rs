//! Cross-process advisory locking for the Install Cache (`spec.md` §5).
//! `avm` has no equivalent (its CLI only ever touches one tag at a time and
//! relies on racy directory-existence checks); this is grounded on the
//! portable `FileExt::lock_exclusive`/`try_lock_exclusive` shape the `fs4`
//! crate exposes over `std::fs::File`, the same primitive `kopi-vm/kopi`
//! reaches for via platform-specific `nix`/`winapi` file locking.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use fs4::fs_std::FileExt;

use crate::error::InstallError;

/// A held exclusive lock on one `*.lock` file. Dropping this releases the
/// lock (an unreleased lock is also fine: the OS releases it when the file
/// descriptor closes, which `Drop` guarantees happens here).
pub struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// Blocks with no timeout until the lock is acquired.
    pub fn acquire(path: &Path) -> Result<FileLock, InstallError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).write(true).open(path)?;
        file.lock_exclusive()
            .map_err(|e| InstallError::Io(std::io::Error::other(e)))?;
        Ok(FileLock {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Polls `try_lock_exclusive` until it succeeds or `timeout` elapses.
    /// The façade MAY expose this per `spec.md` §5 ("the façade MAY accept
    /// a timeout and signal InstallError on expiry").
    pub fn acquire_with_timeout(path: &Path, timeout: Duration) -> Result<FileLock, InstallError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).write(true).open(path)?;
        let deadline = Instant::now() + timeout;
        loop {
            match file.try_lock_exclusive() {
                Ok(true) => {
                    return Ok(FileLock {
                        file,
                        path: path.to_path_buf(),
                    })
                }
                Ok(false) => {}
                Err(e) => return Err(InstallError::Io(std::io::Error::other(e))),
            }
            if Instant::now() >= deadline {
                return Err(InstallError::LockTimeout(path.display().to_string()));
            }
            std::thread::sleep(Duration::from_millis(25));
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            log::warn!("failed to unlock {}: {e}", self.path.display());
        }
    }
}

/// Non-blocking check of whether `path`'s lock is currently held by
/// someone else, used by `clear_cache` to refuse clearing a locked
/// install (`spec.md` §4.6).
pub fn is_locked(path: &Path) -> std::io::Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    let file = OpenOptions::new().write(true).open(path)?;
    match file.try_lock_exclusive() {
        Ok(true) => {
            FileExt::unlock(&file)?;
            Ok(false)
        }
        Ok(false) => Ok(true),
        Err(e) => Err(e),
    }
}
