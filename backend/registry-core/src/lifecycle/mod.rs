//! Start-up and shutdown of a project server's registry entry.
//!
//! Starting is a single locked transaction: sweep dead entries, reuse a live
//! server for the same database if there is one, otherwise allocate a port
//! and record a new entry. Only after that transaction commits does the
//! caller bind the port.

pub mod registration;

pub use registration::{Heartbeat, Registration};

use crate::allocator::PortAllocator;
use crate::config::RegistryConfig;
use crate::discovery::port::{BindProbe, PortProbe};
use crate::discovery::process::LivenessChecker;
use crate::error::LifecycleError;
use crate::identity::ProjectIdentity;
use crate::store::RegistryStore;

use models::{ServerEntry, ServerEntryBuilder};

use std::thread::sleep;
use std::time::Duration;

use backoff::{ExponentialBackoff, backoff::Backoff};
use log::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Starting,
    ReusingExisting,
    Running,
    Stopping,
    Stopped,
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleState::Starting => write!(f, "starting"),
            LifecycleState::ReusingExisting => write!(f, "reusing existing"),
            LifecycleState::Running => write!(f, "running"),
            LifecycleState::Stopping => write!(f, "stopping"),
            LifecycleState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Result of [`ServerLifecycle::start`].
#[derive(Debug)]
pub enum StartOutcome {
    /// A live server already serves this database. Nothing was registered.
    ReusingExisting(ServerEntry),
    /// A new entry was recorded. Bind `registration.port()` next.
    Registered(Registration),
}

enum Decision {
    Reuse(ServerEntry),
    Register(ServerEntry),
}

pub struct ServerLifecycle<P = BindProbe> {
    store: RegistryStore,
    allocator: PortAllocator<P>,
    registration_retry: Duration,
}

impl ServerLifecycle<BindProbe> {
    pub fn new(store: RegistryStore, config: &RegistryConfig) -> Self {
        Self::with_probe(store, config, BindProbe)
    }
}

impl<P: PortProbe> ServerLifecycle<P> {
    pub fn with_probe(store: RegistryStore, config: &RegistryConfig, probe: P) -> Self {
        Self {
            store,
            allocator: PortAllocator::with_probe(config.port_range(), probe),
            registration_retry: config.registration_retry(),
        }
    }

    pub fn store(&self) -> &RegistryStore {
        &self.store
    }

    /// Register `identity` for process `pid`, or report the live server that
    /// already serves it.
    ///
    /// Lock timeouts and registry I/O failures are retried with backoff for
    /// up to the configured registration window. Port exhaustion and probe
    /// failures are returned immediately.
    pub fn start(
        &self,
        identity: &ProjectIdentity,
        pid: u32,
    ) -> Result<StartOutcome, LifecycleError> {
        info!(
            "{}: {} ({})",
            LifecycleState::Starting,
            identity.project_name,
            identity.db_path.display()
        );

        let mut backoff = ExponentialBackoff {
            max_elapsed_time: Some(self.registration_retry),
            ..Default::default()
        };

        loop {
            match self.try_start(identity, pid) {
                Ok(outcome) => return Ok(outcome),
                Err(e) if e.is_transient() => match backoff.next_backoff() {
                    Some(duration) => {
                        warn!("Registration attempt failed, retrying after {duration:?}: {e}");
                        sleep(duration);
                    }
                    None => return Err(e),
                },
                Err(e) => return Err(e),
            }
        }
    }

    fn try_start(
        &self,
        identity: &ProjectIdentity,
        pid: u32,
    ) -> Result<StartOutcome, LifecycleError> {
        let decision = self.store.with_lock(|registry| {
            *registry = LivenessChecker::new().sweep(registry);

            if let Some(existing) = registry.find_by_db_path(&identity.db_path) {
                return Ok::<_, LifecycleError>(Decision::Reuse(existing.clone()));
            }

            let port = self.allocator.allocate(registry)?;
            let entry = ServerEntryBuilder::default()
                .with_project_name(identity.project_name.as_str())
                .with_db_path(identity.db_path.as_path())
                .with_port(port)
                .with_pid(pid)
                .build()?;

            registry.push(entry.clone());
            Ok(Decision::Register(entry))
        })?;

        match decision {
            Decision::Reuse(entry) => {
                info!(
                    "{}: {} on port {} (PID {})",
                    LifecycleState::ReusingExisting,
                    entry.project_name,
                    entry.port,
                    entry.pid
                );
                Ok(StartOutcome::ReusingExisting(entry))
            }
            Decision::Register(entry) => {
                debug!(
                    "Registered {} on port {} for PID {}",
                    entry.project_name, entry.port, entry.pid
                );
                Ok(StartOutcome::Registered(Registration::new(
                    self.store.clone(),
                    entry,
                )))
            }
        }
    }
}
