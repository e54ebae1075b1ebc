//! The shared `servers.json` file and the lock that serializes its writers.
//!
//! Every read-modify-write goes through [`RegistryStore::with_lock`], which
//! holds the exclusive lock for the whole load/mutate/persist sequence.
//! Writes go to a temp file that is fsynced and renamed over the target, so
//! readers see either the old or the new document, never a partial one.

pub mod lock;

pub use lock::RegistryLock;

use crate::error::RegistryError;
use crate::paths::RegistryPaths;

use common::ErrorLocation;
use models::Registry;

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, trace, warn};

const TEMP_SUFFIX: &str = "tmp";

#[derive(Debug, Clone)]
pub struct RegistryStore {
    home: PathBuf,
    registry_file: PathBuf,
    lock_file: PathBuf,
    lock_timeout: Duration,
}

impl RegistryStore {
    pub fn new(paths: &RegistryPaths, lock_timeout: Duration) -> Self {
        Self {
            home: paths.home.clone(),
            registry_file: paths.registry_file.clone(),
            lock_file: paths.lock_file.clone(),
            lock_timeout,
        }
    }

    pub fn registry_file(&self) -> &Path {
        &self.registry_file
    }

    pub fn lock_timeout(&self) -> Duration {
        self.lock_timeout
    }

    /// Read the registry without taking the lock.
    ///
    /// A missing or blank file is an empty registry. A file that does not
    /// parse is logged and also treated as empty; the next locked write
    /// replaces it.
    #[track_caller]
    pub fn load(&self) -> Result<Registry, RegistryError> {
        let contents = match fs::read_to_string(&self.registry_file) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                trace!("No registry at {}", self.registry_file.display());
                return Ok(Registry::default());
            }
            Err(e) => {
                return Err(RegistryError::Read {
                    location: ErrorLocation::from(Location::caller()),
                    path: self.registry_file.clone(),
                    source: e,
                });
            }
        };

        Ok(parse_registry(&contents, &self.registry_file))
    }

    /// Run `f` against the current registry while holding the exclusive lock.
    ///
    /// The registry is persisted only if `f` succeeds and actually changed it.
    /// The lock is released on every path out of this function.
    #[track_caller]
    pub fn with_lock<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Registry) -> Result<T, E>,
        E: From<RegistryError>,
    {
        self.ensure_home()?;
        let lock = RegistryLock::acquire(&self.lock_file, self.lock_timeout)?;

        let original = self.load()?;
        let mut registry = original.clone();

        let value = f(&mut registry)?;

        if registry != original {
            self.persist(&registry)?;
            debug!(
                "Registry updated: {} -> {} entries",
                original.len(),
                registry.len()
            );
        }

        lock.release()?;
        Ok(value)
    }

    #[track_caller]
    fn ensure_home(&self) -> Result<(), RegistryError> {
        fs::create_dir_all(&self.home).map_err(|e| RegistryError::Write {
            location: ErrorLocation::from(Location::caller()),
            path: self.home.clone(),
            source: e,
        })
    }

    #[track_caller]
    fn persist(&self, registry: &Registry) -> Result<(), RegistryError> {
        let json =
            serde_json::to_string_pretty(registry).map_err(|e| RegistryError::Serialize {
                location: ErrorLocation::from(Location::caller()),
                reason: e.to_string(),
            })?;

        let temp_path = self.temp_path();

        if let Err(e) = write_atomically(&temp_path, &self.registry_file, json.as_bytes()) {
            let _ = fs::remove_file(&temp_path);
            return Err(RegistryError::Write {
                location: ErrorLocation::from(Location::caller()),
                path: self.registry_file.clone(),
                source: e,
            });
        }

        if let Some(parent) = self.registry_file.parent()
            && let Ok(dir) = File::open(parent)
        {
            let _ = dir.sync_all();
        }

        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .registry_file
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".");
        name.push(TEMP_SUFFIX);
        self.registry_file.with_file_name(name)
    }
}

pub(crate) fn parse_registry(contents: &str, path: &Path) -> Registry {
    if contents.trim().is_empty() {
        return Registry::default();
    }

    match serde_json::from_str(contents) {
        Ok(registry) => registry,
        Err(e) => {
            warn!(
                "Registry at {} is unreadable ({e}); treating it as empty",
                path.display()
            );
            Registry::default()
        }
    }
}

fn write_atomically(temp_path: &Path, target: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(temp_path)?;
    file.write_all(bytes)?;
    file.flush()?;
    file.sync_all()?;
    drop(file);
    fs::rename(temp_path, target)
}
