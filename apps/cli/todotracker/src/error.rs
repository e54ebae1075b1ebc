use registry_core::error::{
    ConfigError, CoreError, DashboardError, IdentityError, LifecycleError, RegistryError,
};

use common::{ErrorLocation, Remedy};

use std::panic::Location;

use thiserror::Error;
use tokio::task::JoinError;

/// Everything a command can fail with.
///
/// Printed to the user as a single `error: ... | remedy: ...` line.
#[derive(Debug, Error)]
pub enum TodotrackerError {
    /// Error from registry-core operations (lock, allocation, dashboard, etc.)
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Logger Error: {message} {location}")]
    Logger {
        message: String,
        location: ErrorLocation,
    },

    #[error("IO Error: {message} {location}")]
    Io {
        message: String,
        location: ErrorLocation,
        #[source]
        source: std::io::Error,
    },

    #[error("Task Error: {message} {location}")]
    Task {
        message: String,
        location: ErrorLocation,
    },

    #[error("Output Error: {message} {location}")]
    Output {
        message: String,
        location: ErrorLocation,
    },
}

impl TodotrackerError {
    #[track_caller]
    pub fn task(error: JoinError) -> Self {
        TodotrackerError::Task {
            message: format!("Background task failed: {error}"),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        TodotrackerError::Io {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
            source,
        }
    }

    /// The one line shown to the user on failure.
    pub fn report_line(&self) -> String {
        format!("error: {self} | remedy: {}", self.remedy())
    }
}

impl Remedy for TodotrackerError {
    fn remedy(&self) -> &'static str {
        match self {
            TodotrackerError::Core(e) => e.remedy(),
            TodotrackerError::Logger { .. } => {
                "check that the todotracker home directory is writable"
            }
            TodotrackerError::Io { .. } => {
                "check that the port is free and the todotracker home directory is writable"
            }
            TodotrackerError::Task { .. } => "retry the command",
            TodotrackerError::Output { .. } => "retry with --format pretty",
        }
    }
}

macro_rules! from_core {
    ($($error:ty),* $(,)?) => {
        $(
            impl From<$error> for TodotrackerError {
                fn from(error: $error) -> Self {
                    TodotrackerError::Core(CoreError::from(error))
                }
            }
        )*
    };
}

from_core!(
    RegistryError,
    LifecycleError,
    ConfigError,
    IdentityError,
    DashboardError,
);
