//! Location of the per-user TodoTracker home directory.
//!
//! Lookup order:
//! 1. TODOTRACKER_HOME environment variable (explicit override)
//! 2. `~/.todotracker` via the `dirs` crate
//! 3. `$HOME/.todotracker` on unix
//!
//! Returns Result, never silently falls back to a relative path.

use crate::error::RegistryError;

use common::ErrorLocation;

use std::env;
use std::panic::Location;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

pub const HOME_ENV: &str = "TODOTRACKER_HOME";
pub const HOME_DIR_NAME: &str = ".todotracker";
pub const REGISTRY_FILE_NAME: &str = "servers.json";
pub const LOCK_FILE_NAME: &str = "servers.lock";

/// Files shared by every TodoTracker process of one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryPaths {
    /// Base directory (e.g., ~/.todotracker).
    pub home: PathBuf,
    /// Path to servers.json.
    pub registry_file: PathBuf,
    /// Path to the advisory lock file guarding servers.json.
    pub lock_file: PathBuf,
    /// How the home directory was determined.
    pub source: PathSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathSource {
    /// Set via TODOTRACKER_HOME.
    EnvVar,
    /// Resolved through the `dirs` crate.
    HomeDir,
    /// Unix fallback through $HOME.
    HomeEnvFallback,
    /// Constructed explicitly by the caller.
    Explicit,
}

impl std::fmt::Display for PathSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathSource::EnvVar => write!(f, "{HOME_ENV}"),
            PathSource::HomeDir => write!(f, "home directory"),
            PathSource::HomeEnvFallback => write!(f, "$HOME fallback"),
            PathSource::Explicit => write!(f, "explicit"),
        }
    }
}

impl RegistryPaths {
    pub fn in_dir(home: impl Into<PathBuf>, source: PathSource) -> Self {
        let home = home.into();
        Self {
            registry_file: home.join(REGISTRY_FILE_NAME),
            lock_file: home.join(LOCK_FILE_NAME),
            home,
            source,
        }
    }

    /// Detect the TodoTracker home directory.
    ///
    /// # Errors
    /// Returns `RegistryError::PathDetection` if no home directory can be determined.
    #[track_caller]
    pub fn detect() -> Result<Self, RegistryError> {
        if let Some(custom) = env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
            let home = PathBuf::from(custom);
            info!("Using {HOME_ENV} override: {}", home.display());
            return Ok(Self::in_dir(home, PathSource::EnvVar));
        }

        if let Some(home) = dirs::home_dir() {
            let dir = home.join(HOME_DIR_NAME);
            debug!("TodoTracker home: {}", dir.display());
            return Ok(Self::in_dir(dir, PathSource::HomeDir));
        }

        #[cfg(unix)]
        {
            if let Some(home) = env::var_os("HOME").filter(|v| !v.is_empty()) {
                let dir = Path::new(&home).join(HOME_DIR_NAME);
                warn!("Using $HOME fallback path: {}", dir.display());
                return Ok(Self::in_dir(dir, PathSource::HomeEnvFallback));
            }
        }

        Err(RegistryError::PathDetection {
            message: format!("could not determine a home directory; set {HOME_ENV}"),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    pub fn home(&self) -> &Path {
        &self.home
    }
}
