use crate::error::model_error::ModelError;
use crate::{ErrorLocation, ServerEntry};

use std::panic::Location;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

/// Builder for creating validated ServerEntry instances.
///
/// `started_at` defaults to the moment `build()` runs and `last_heartbeat`
/// defaults to `started_at`, so a freshly registered entry always has both.
#[derive(Debug, Default)]
pub struct ServerEntryBuilder {
    project_name: Option<String>,
    db_path: Option<PathBuf>,
    port: Option<u16>,
    pid: Option<u32>,
    started_at: Option<DateTime<Utc>>,
    last_heartbeat: Option<DateTime<Utc>>,
}

impl ServerEntryBuilder {
    pub fn with_project_name(mut self, name: impl Into<String>) -> Self {
        self.project_name = Some(name.into());
        self
    }

    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = Some(path.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_pid(mut self, pid: u32) -> Self {
        self.pid = Some(pid);
        self
    }

    pub fn with_started_at(mut self, started_at: DateTime<Utc>) -> Self {
        self.started_at = Some(started_at);
        self
    }

    pub fn with_last_heartbeat(mut self, heartbeat: DateTime<Utc>) -> Self {
        self.last_heartbeat = Some(heartbeat);
        self
    }

    /// Build the ServerEntry with validation.
    #[track_caller]
    pub fn build(self) -> Result<ServerEntry, ModelError> {
        let pid = self.pid.ok_or_else(|| ModelError::Validation {
            message: String::from("PID is required"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        if pid == 0 {
            return Err(ModelError::Validation {
                message: String::from("PID must be non-zero"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let port = self.port.ok_or_else(|| ModelError::Validation {
            message: String::from("Port is required"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        if port == 0 {
            return Err(ModelError::Validation {
                message: String::from("Port must be non-zero"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let db_path = self.db_path.ok_or_else(|| ModelError::Validation {
            message: String::from("Database path is required"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        if !db_path.is_absolute() {
            return Err(ModelError::Validation {
                message: format!("Database path must be absolute: {}", db_path.display()),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let project_name = self.project_name.ok_or_else(|| ModelError::Validation {
            message: String::from("Project name is required"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        if project_name.trim().is_empty() {
            return Err(ModelError::Validation {
                message: String::from("Project name cannot be empty"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let started_at = self.started_at.unwrap_or_else(Utc::now);
        let last_heartbeat = self.last_heartbeat.unwrap_or(started_at);

        Ok(ServerEntry {
            project_name,
            db_path,
            port,
            pid,
            started_at,
            last_heartbeat: Some(last_heartbeat),
        })
    }
}
