use crate::error::TodotrackerError;

use registry_core::{RegistryConfig, RegistryPaths, RegistryStore};

use std::fs::create_dir_all;

use log::debug;

/// Paths, config and store shared by every command.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub paths: RegistryPaths,
    pub config: RegistryConfig,
    pub store: RegistryStore,
}

impl AppContext {
    /// Ensure the home directory exists so the logger and registry can use it.
    #[track_caller]
    pub fn prepare_home(paths: &RegistryPaths) -> Result<(), TodotrackerError> {
        create_dir_all(&paths.home).map_err(|e| {
            TodotrackerError::io(
                format!("Failed to create {}", paths.home.display()),
                e,
            )
        })
    }

    pub fn load(paths: RegistryPaths) -> Result<Self, TodotrackerError> {
        let config = RegistryConfig::load(&paths.home)?;
        let store = RegistryStore::new(&paths, config.lock_timeout());

        debug!(
            "Home {} ({}), registry {}",
            paths.home.display(),
            paths.source,
            paths.registry_file.display()
        );

        Ok(Self {
            paths,
            config,
            store,
        })
    }
}
