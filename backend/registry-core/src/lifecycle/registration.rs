use crate::error::RegistryError;
use crate::lifecycle::LifecycleState;
use crate::store::RegistryStore;

use models::ServerEntry;

use chrono::Utc;
use log::{error, info, warn};

/// Ownership of one registry entry.
///
/// Removes the entry when released or dropped, exactly once. Removal matches
/// on this process's pid, so an entry another process registered for the
/// same database is never touched.
#[derive(Debug)]
pub struct Registration {
    store: RegistryStore,
    entry: ServerEntry,
    state: LifecycleState,
}

impl Registration {
    pub(crate) fn new(store: RegistryStore, entry: ServerEntry) -> Self {
        info!(
            "{}: {} on port {}",
            LifecycleState::Running,
            entry.project_name,
            entry.port
        );
        Self {
            store,
            entry,
            state: LifecycleState::Running,
        }
    }

    pub fn entry(&self) -> &ServerEntry {
        &self.entry
    }

    pub fn port(&self) -> u16 {
        self.entry.port
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Handle that refreshes `last_heartbeat` without owning the entry.
    pub fn heartbeat(&self) -> Heartbeat {
        Heartbeat {
            store: self.store.clone(),
            pid: self.entry.pid,
        }
    }

    /// Remove this process's entry. Returns how many entries were removed.
    pub fn release(mut self) -> Result<usize, RegistryError> {
        self.deregister()
    }

    fn deregister(&mut self) -> Result<usize, RegistryError> {
        if self.state != LifecycleState::Running {
            return Ok(0);
        }

        self.state = LifecycleState::Stopping;
        info!("{}: {}", self.state, self.entry.project_name);

        let pid = self.entry.pid;
        let result = self
            .store
            .with_lock(|registry| Ok::<_, RegistryError>(registry.remove_by_pid(pid)));

        self.state = LifecycleState::Stopped;
        info!("{}: {}", self.state, self.entry.project_name);
        result
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        if let Err(e) = self.deregister() {
            error!("Failed to deregister {}: {e}", self.entry.project_name);
        }
    }
}

/// Cloneable handle for periodic liveness updates of one pid's entry.
#[derive(Debug, Clone)]
pub struct Heartbeat {
    store: RegistryStore,
    pid: u32,
}

impl Heartbeat {
    /// Stamp `last_heartbeat` with the current time.
    ///
    /// Returns `Ok(false)` if the entry is no longer in the registry.
    pub fn beat(&self) -> Result<bool, RegistryError> {
        let pid = self.pid;
        let found = self.store.with_lock(|registry| {
            Ok::<_, RegistryError>(match registry.find_by_pid_mut(pid) {
                Some(entry) => {
                    entry.last_heartbeat = Some(Utc::now());
                    true
                }
                None => false,
            })
        })?;

        if !found {
            warn!("Heartbeat found no registry entry for PID {pid}");
        }
        Ok(found)
    }
}
