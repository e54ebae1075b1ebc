use registry_core::error::DiscoveryError;
use registry_core::{PathSource, PortProbe, RegistryConfig, RegistryPaths, RegistryStore};

use models::{ServerEntry, ServerEntryBuilder};

use std::collections::HashSet;
use std::process::{Child, Command};
use std::sync::Mutex;
use std::time::Duration;

use tempfile::TempDir;

/// An isolated TodoTracker home with its own registry and lock file.
pub struct TestHome {
    pub dir: TempDir,
    pub paths: RegistryPaths,
}

impl TestHome {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let paths = RegistryPaths::in_dir(dir.path(), PathSource::Explicit);
        Self { dir, paths }
    }

    pub fn store(&self) -> RegistryStore {
        RegistryStore::new(&self.paths, Duration::from_secs(5))
    }

    pub fn store_with_timeout(&self, timeout: Duration) -> RegistryStore {
        RegistryStore::new(&self.paths, timeout)
    }

    pub fn seed(&self, entries: Vec<ServerEntry>) {
        self.store()
            .with_lock(|registry| {
                for entry in entries {
                    registry.push(entry);
                }
                Ok::<_, registry_core::error::RegistryError>(())
            })
            .unwrap();
    }
}

/// Config with the default layout: dashboard on 8069, servers on 8070-8169.
pub fn default_config() -> RegistryConfig {
    RegistryConfig::default()
}

pub fn config_with(dashboard_port: u16, port_range: u16) -> RegistryConfig {
    let mut config = RegistryConfig::default();
    config.ports.dashboard_port = dashboard_port;
    config.ports.port_range = port_range;
    config
}

/// Probe backed by a fixed set of occupied ports.
#[derive(Debug, Default)]
pub struct FakeProbe {
    occupied: Mutex<HashSet<u16>>,
    probed: Mutex<Vec<u16>>,
}

impl FakeProbe {
    pub fn occupied(ports: &[u16]) -> Self {
        Self {
            occupied: Mutex::new(ports.iter().copied().collect()),
            probed: Mutex::new(Vec::new()),
        }
    }

    pub fn probed(&self) -> Vec<u16> {
        self.probed.lock().unwrap().clone()
    }
}

impl PortProbe for FakeProbe {
    fn is_free(&self, port: u16) -> Result<bool, DiscoveryError> {
        self.probed.lock().unwrap().push(port);
        Ok(!self.occupied.lock().unwrap().contains(&port))
    }
}

/// Probe whose every call fails as a non "in use" bind error would.
pub struct FailingProbe;

impl PortProbe for FailingProbe {
    #[track_caller]
    fn is_free(&self, port: u16) -> Result<bool, DiscoveryError> {
        Err(DiscoveryError::Bind {
            port,
            location: common::ErrorLocation::from(std::panic::Location::caller()),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        })
    }
}

/// A long-running child process giving tests a distinct live pid.
pub struct LiveProcess {
    child: Child,
}

impl LiveProcess {
    pub fn spawn() -> Self {
        let child = Command::new("sleep").arg("60").spawn().unwrap();
        Self { child }
    }

    pub fn pid(&self) -> u32 {
        self.child.id()
    }
}

impl Drop for LiveProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Pid of a process that has already exited and been reaped.
pub fn dead_pid() -> u32 {
    let mut child = Command::new("true").spawn().unwrap();
    let pid = child.id();
    child.wait().unwrap();
    pid
}

pub fn entry(name: &str, port: u16, pid: u32) -> ServerEntry {
    ServerEntryBuilder::default()
        .with_project_name(name)
        .with_db_path(format!("/work/{name}/.todos/project.db"))
        .with_port(port)
        .with_pid(pid)
        .build()
        .unwrap()
}

pub fn identity(name: &str) -> registry_core::ProjectIdentity {
    registry_core::ProjectIdentity::new(name, format!("/work/{name}/.todos/project.db"))
}
