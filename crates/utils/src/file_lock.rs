//! Advisory cross-process file locks
//!
//! Locks are `flock`-style advisory locks taken through `fs2`. They are
//! released when the guard is dropped or when the owning process exits, so a
//! crashed holder never leaves a lock behind. Lock files themselves are left
//! in place: unlinking a lock file while another process waits on it would
//! let two processes hold "the same" lock on different inodes.

use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

const INITIAL_BACKOFF: Duration = Duration::from_millis(1);
const MAX_BACKOFF: Duration = Duration::from_millis(25);

/// An exclusive advisory lock held on a file
#[derive(Debug)]
pub struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// Try to acquire the lock without waiting
    ///
    /// Returns an error of kind [`io::ErrorKind::WouldBlock`] when another
    /// holder owns the lock.
    pub fn try_acquire(path: &Path) -> io::Result<Self> {
        let file = open_lock_file(path)?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Self {
                file,
                path: path.to_path_buf(),
            }),
            Err(e) if is_contended(&e) => Err(io::Error::new(
                io::ErrorKind::WouldBlock,
                format!("lock already held: {}", path.display()),
            )),
            Err(e) => Err(e),
        }
    }

    /// Acquire the lock, waiting at most `timeout`
    ///
    /// Polls with a jittered exponential backoff. Returns an error of kind
    /// [`io::ErrorKind::TimedOut`] when the deadline passes.
    pub fn acquire_timeout(path: &Path, timeout: Duration) -> io::Result<Self> {
        let file = open_lock_file(path)?;
        let deadline = Instant::now() + timeout;
        let mut backoff = INITIAL_BACKOFF;

        loop {
            match file.try_lock_exclusive() {
                Ok(()) => {
                    return Ok(Self {
                        file,
                        path: path.to_path_buf(),
                    })
                }
                Err(e) if is_contended(&e) => {}
                Err(e) => return Err(e),
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!(
                        "timed out after {timeout:?} waiting for lock: {}",
                        path.display()
                    ),
                ));
            }

            let jitter = Duration::from_micros(fastrand::u64(0..=backoff.as_micros() as u64 / 2));
            thread::sleep((backoff + jitter).min(deadline - now));
            backoff = (backoff * 2).min(MAX_BACKOFF);
        }
    }

    /// Path of the underlying lock file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

fn open_lock_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
}

fn is_contended(error: &io::Error) -> bool {
    error.kind() == io::ErrorKind::WouldBlock
        || error.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_lock_exclusive() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join("locks").join("a.lock");

        let lock1 = FileLock::try_acquire(&lock_path).unwrap();

        let lock2 = FileLock::try_acquire(&lock_path);
        assert!(lock2.is_err());
        assert_eq!(lock2.unwrap_err().kind(), io::ErrorKind::WouldBlock);

        drop(lock1);

        let lock3 = FileLock::try_acquire(&lock_path).unwrap();
        assert_eq!(lock3.path(), lock_path.as_path());
    }

    #[test]
    fn test_acquire_timeout_expires() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join("held.lock");

        let _held = FileLock::try_acquire(&lock_path).unwrap();

        let start = Instant::now();
        let result = FileLock::acquire_timeout(&lock_path, Duration::from_millis(50));
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::TimedOut);
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_acquire_timeout_after_release() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join("handoff.lock");

        let held = FileLock::try_acquire(&lock_path).unwrap();
        let waiter = {
            let lock_path = lock_path.clone();
            thread::spawn(move || FileLock::acquire_timeout(&lock_path, Duration::from_secs(5)))
        };

        thread::sleep(Duration::from_millis(20));
        drop(held);

        assert!(waiter.join().unwrap().is_ok());
        assert!(lock_path.exists());
    }
}
