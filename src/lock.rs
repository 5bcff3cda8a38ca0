//! Run-level exclusive lock.
//!
//! Two concurrent runs would race the package manager and each other's
//! file copies; an exclusive file lock serializes them. The lock releases
//! on drop and, via the OS, on process death.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

const LOCK_POLL: Duration = Duration::from_millis(100);

/// Held for the duration of a run. Unlocks on drop.
pub struct RunLock {
    file: File,
}

impl Drop for RunLock {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
    }
}

/// Default lock path, shared by every invocation on the machine.
pub fn default_path() -> PathBuf {
    std::env::temp_dir().join("groundwork.lock")
}

/// Acquire the run lock, polling until `timeout` elapses.
pub fn acquire(path: &Path, timeout: Duration) -> Result<RunLock> {
    let file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(true)
        .open(path)
        .with_context(|| format!("failed to open lock file {}", path.display()))?;

    let t0 = Instant::now();
    loop {
        match file.try_lock_exclusive() {
            Ok(()) => return Ok(RunLock { file }),
            Err(_) => {
                if t0.elapsed() >= timeout {
                    anyhow::bail!(
                        "another run holds the lock at {} (waited {:?})",
                        path.display(),
                        timeout
                    );
                }
                thread::sleep(LOCK_POLL);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};

    #[test]
    fn test_second_acquire_times_out_until_release() {
        let td = tempfile::tempdir().unwrap();
        let path = td.path().join("groundwork.lock");

        let guard = acquire(&path, Duration::from_millis(200)).expect("first lock");

        let barrier = Arc::new(Barrier::new(2));
        let b2 = barrier.clone();
        let p2 = path.clone();
        let h = thread::spawn(move || {
            b2.wait();
            let res = acquire(&p2, Duration::from_millis(150));
            assert!(res.is_err(), "second acquire should time out");
        });
        barrier.wait();
        h.join().unwrap();

        drop(guard);
        let again = acquire(&path, Duration::from_millis(200));
        assert!(again.is_ok(), "lock reacquires after release");
    }
}
