pub mod config;
pub mod dashboard;
pub mod discovery;
pub mod identity;
pub mod lifecycle;
pub mod registry;

pub use config::ConfigError;
pub use dashboard::DashboardError;
pub use discovery::DiscoveryError;
pub use identity::IdentityError;
pub use lifecycle::LifecycleError;
pub use registry::RegistryError;

use common::Remedy;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Dashboard(#[from] DashboardError),
}

impl Remedy for CoreError {
    fn remedy(&self) -> &'static str {
        match self {
            CoreError::Registry(e) => e.remedy(),
            CoreError::Discovery(e) => e.remedy(),
            CoreError::Lifecycle(e) => e.remedy(),
            CoreError::Config(e) => e.remedy(),
            CoreError::Identity(e) => e.remedy(),
            CoreError::Dashboard(e) => e.remedy(),
        }
    }
}
