use common::{ErrorLocation, Remedy};

use std::io::Error as IoError;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum RegistryError {
    #[error("Registry Path Error: {message} {location}")]
    PathDetection {
        message: String,
        location: ErrorLocation,
    },

    #[error("Registry Lock Error: {path}: {source} {location}")]
    Lock {
        location: ErrorLocation,
        path: PathBuf,
        #[source]
        source: IoError,
    },

    #[error("Registry Lock Timeout Error: {path} still held after {waited:?} {location}")]
    LockTimeout {
        location: ErrorLocation,
        path: PathBuf,
        waited: Duration,
    },

    #[error("Registry Read Error: {path}: {source} {location}")]
    Read {
        location: ErrorLocation,
        path: PathBuf,
        #[source]
        source: IoError,
    },

    #[error("Registry Write Error: {path}: {source} {location}")]
    Write {
        location: ErrorLocation,
        path: PathBuf,
        #[source]
        source: IoError,
    },

    #[error("Registry Serialize Error: {reason} {location}")]
    Serialize {
        location: ErrorLocation,
        reason: String,
    },
}

impl RegistryError {
    /// Whether a later attempt can reasonably succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            RegistryError::Lock { .. }
                | RegistryError::LockTimeout { .. }
                | RegistryError::Read { .. }
                | RegistryError::Write { .. }
        )
    }
}

impl Remedy for RegistryError {
    fn remedy(&self) -> &'static str {
        match self {
            RegistryError::PathDetection { .. } => {
                "set TODOTRACKER_HOME to a writable directory"
            }
            RegistryError::Lock { .. } => {
                "check permissions on the todotracker home directory and retry"
            }
            RegistryError::LockTimeout { .. } => {
                "another todotracker process holds the registry lock; if none is running, remove the stale lock file and retry"
            }
            RegistryError::Read { .. } | RegistryError::Write { .. } => {
                "check permissions and free disk space for the todotracker home directory, then retry"
            }
            RegistryError::Serialize { .. } => {
                "delete servers.json in the todotracker home directory; it is rebuilt on the next start"
            }
        }
    }
}
