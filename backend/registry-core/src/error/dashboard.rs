use crate::error::{DiscoveryError, RegistryError};

use common::{ErrorLocation, Remedy};

use std::io::Error as IoError;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum DashboardError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error("Dashboard Port Occupied Error: port {port} is held by {owner} {location}")]
    PortOccupied {
        port: u16,
        owner: String,
        location: ErrorLocation,
    },

    #[error("Dashboard Bind Error: {address}: {source} {location}")]
    Bind {
        address: String,
        location: ErrorLocation,
        #[source]
        source: IoError,
    },

    #[error("Dashboard Serve Error: {source} {location}")]
    Serve {
        location: ErrorLocation,
        #[source]
        source: IoError,
    },

    #[error("Dashboard Task Error: {message} {location}")]
    Task {
        message: String,
        location: ErrorLocation,
    },
}

impl Remedy for DashboardError {
    fn remedy(&self) -> &'static str {
        match self {
            DashboardError::Registry(e) => e.remedy(),
            DashboardError::Discovery(e) => e.remedy(),
            DashboardError::PortOccupied { .. } => {
                "stop the process holding the dashboard port or change dashboard_port in config.toml"
            }
            DashboardError::Bind { .. } => {
                "check that the dashboard port is free and may be bound by this user"
            }
            DashboardError::Serve { .. } | DashboardError::Task { .. } => {
                "restart the dashboard"
            }
        }
    }
}
