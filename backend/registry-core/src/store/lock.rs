use crate::error::RegistryError;

use common::ErrorLocation;

use std::fs::{File, OpenOptions};
use std::io::Error as IoError;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::thread::sleep;
use std::time::{Duration, Instant};

use backoff::{ExponentialBackoff, backoff::Backoff};
use fs2::FileExt;
use log::{debug, trace};

const LOCK_INITIAL_INTERVAL: Duration = Duration::from_millis(5);
const LOCK_MAX_INTERVAL: Duration = Duration::from_millis(250);

/// Exclusive advisory lock on the registry lock file.
///
/// The lock is released when the guard is dropped, and by the OS if the
/// holder dies.
#[derive(Debug)]
pub struct RegistryLock {
    file: File,
    path: PathBuf,
}

impl RegistryLock {
    /// Acquire the lock, waiting at most `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::LockTimeout` once `timeout` elapses with the
    /// lock still held elsewhere, `RegistryError::Lock` for any other failure.
    #[track_caller]
    pub fn acquire(path: &Path, timeout: Duration) -> Result<Self, RegistryError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| RegistryError::Lock {
                location: ErrorLocation::from(Location::caller()),
                path: path.to_path_buf(),
                source: e,
            })?;

        let started = Instant::now();
        let mut backoff = ExponentialBackoff {
            initial_interval: LOCK_INITIAL_INTERVAL,
            max_interval: LOCK_MAX_INTERVAL,
            max_elapsed_time: Some(timeout),
            ..Default::default()
        };

        loop {
            match file.try_lock_exclusive() {
                Ok(()) => {
                    trace!("Acquired registry lock {}", path.display());
                    return Ok(Self {
                        file,
                        path: path.to_path_buf(),
                    });
                }
                Err(e) if is_contended(&e) => match backoff.next_backoff() {
                    Some(duration) => {
                        trace!("Registry lock busy, retrying after {duration:?}");
                        sleep(duration);
                    }
                    None => {
                        debug!(
                            "Gave up on registry lock {} after {:?}",
                            path.display(),
                            started.elapsed()
                        );
                        return Err(RegistryError::LockTimeout {
                            location: ErrorLocation::from(Location::caller()),
                            path: path.to_path_buf(),
                            waited: started.elapsed(),
                        });
                    }
                },
                Err(e) => {
                    return Err(RegistryError::Lock {
                        location: ErrorLocation::from(Location::caller()),
                        path: path.to_path_buf(),
                        source: e,
                    });
                }
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release explicitly (normally handled by Drop).
    #[track_caller]
    pub fn release(self) -> Result<(), RegistryError> {
        FileExt::unlock(&self.file).map_err(|e| RegistryError::Lock {
            location: ErrorLocation::from(Location::caller()),
            path: self.path.clone(),
            source: e,
        })?;
        trace!("Released registry lock {}", self.path.display());
        Ok(())
    }
}

fn is_contended(error: &IoError) -> bool {
    let contended = fs2::lock_contended_error();
    match (error.raw_os_error(), contended.raw_os_error()) {
        (Some(actual), Some(expected)) => actual == expected,
        _ => error.kind() == contended.kind(),
    }
}
