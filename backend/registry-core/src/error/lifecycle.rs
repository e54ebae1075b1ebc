use crate::error::{DiscoveryError, RegistryError};

use common::{ErrorLocation, Remedy};
use models::ModelError;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum LifecycleError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Port Exhausted Error: no free port in {first}-{last} {location}")]
    PortExhausted {
        first: u16,
        last: u16,
        location: ErrorLocation,
    },
}

impl LifecycleError {
    /// Lock contention and I/O hiccups are retried; everything else is final.
    pub fn is_transient(&self) -> bool {
        match self {
            LifecycleError::Registry(e) => e.is_transient(),
            _ => false,
        }
    }
}

impl Remedy for LifecycleError {
    fn remedy(&self) -> &'static str {
        match self {
            LifecycleError::Registry(e) => e.remedy(),
            LifecycleError::Discovery(e) => e.remedy(),
            LifecycleError::Model(_) => {
                "pass an existing --db-path and a non-empty --name"
            }
            LifecycleError::PortExhausted { .. } => {
                "stop unused TodoTracker servers or raise port_range in config.toml"
            }
        }
    }
}
