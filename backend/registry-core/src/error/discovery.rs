use common::{ErrorLocation, Remedy};

use std::error::Error as StdError;
use std::io::Error as IoError;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum DiscoveryError {
    #[error("Port Probe Error: port {port}: {source} {location}")]
    Bind {
        port: u16,
        location: ErrorLocation,
        #[source]
        source: IoError,
    },

    #[error("Network Query Error: {message} {location}")]
    NetworkQuery {
        message: String,
        location: ErrorLocation,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("System Query Error: {message} {location}")]
    SystemQuery {
        message: String,
        location: ErrorLocation,
    },
}

impl Remedy for DiscoveryError {
    fn remedy(&self) -> &'static str {
        match self {
            DiscoveryError::Bind { .. } => {
                "check that this user may bind local TCP ports in the configured range"
            }
            DiscoveryError::NetworkQuery { .. } | DiscoveryError::SystemQuery { .. } => {
                "check that this user may inspect local sockets and processes"
            }
        }
    }
}
