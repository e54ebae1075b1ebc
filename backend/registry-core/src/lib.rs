pub mod allocator;
pub mod config;
pub mod dashboard;
pub mod discovery;
pub mod error;
pub mod identity;
pub mod lifecycle;
pub mod paths;
pub mod store;

#[cfg(test)]
mod tests;

pub use allocator::{PortAllocator, PortRange};
pub use config::RegistryConfig;
pub use dashboard::{CleanupReport, Dashboard, DashboardRow, InstanceStatus};
pub use discovery::port::{BindProbe, PortProbe};
pub use error::CoreError;
pub use identity::ProjectIdentity;
pub use lifecycle::{LifecycleState, ServerLifecycle, StartOutcome};
pub use lifecycle::registration::{Heartbeat, Registration};
pub use paths::{PathSource, RegistryPaths};
pub use store::RegistryStore;

pub const TODOTRACKER_BINARY: &str = "todotracker";
pub const TODOTRACKER_HOSTNAME: &str = "localhost";
pub const TODOTRACKER_BASE_URL: &str = const_format::concatcp!("http://", TODOTRACKER_HOSTNAME);

/// Loopback address used for health probes.
pub const LOOPBACK_HOSTNAME: &str = "127.0.0.1";
pub const LOOPBACK_BASE_URL: &str = const_format::concatcp!("http://", LOOPBACK_HOSTNAME);

/// Address project servers and the dashboard listen on.
pub const BIND_ADDRESS: &str = "0.0.0.0";

pub const DEFAULT_DASHBOARD_PORT: u16 = 8069;
pub const DEFAULT_PORT_RANGE: u16 = 100;

pub const HEALTH_ENDPOINT: &str = "/api/health";
