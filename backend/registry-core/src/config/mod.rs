//! Tunables shared by the serve, dashboard and maintenance commands.
//!
//! Stored as `config.toml` in the TodoTracker home directory. Every field is
//! optional; a missing file means all defaults.

use crate::allocator::PortRange;
use crate::error::ConfigError;
use crate::{DEFAULT_DASHBOARD_PORT, DEFAULT_PORT_RANGE};

use common::ErrorLocation;

use std::panic::Location;
use std::path::Path;
use std::time::Duration;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE_NAME: &str = "config.toml";
const CONFIG_VERSION: u32 = 1;

// ============================================
// CONFIG STRUCTS
// ============================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PortsConfig {
    #[serde(default = "default_dashboard_port")]
    pub dashboard_port: u16,
    #[serde(default = "default_port_range")]
    pub port_range: u16,
}

impl Default for PortsConfig {
    fn default() -> Self {
        Self {
            dashboard_port: default_dashboard_port(),
            port_range: default_port_range(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimingConfig {
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
    #[serde(default = "default_registration_retry_ms")]
    pub registration_retry_ms: u64,
    #[serde(default = "default_heartbeat_interval_secs")]
    pub heartbeat_interval_secs: u64,
    #[serde(default = "default_dashboard_poll_secs")]
    pub dashboard_poll_secs: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: default_lock_timeout_ms(),
            registration_retry_ms: default_registration_retry_ms(),
            heartbeat_interval_secs: default_heartbeat_interval_secs(),
            dashboard_poll_secs: default_dashboard_poll_secs(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegistryConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub ports: PortsConfig,

    #[serde(default)]
    pub timing: TimingConfig,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            ports: PortsConfig::default(),
            timing: TimingConfig::default(),
        }
    }
}

// ============================================
// DEFAULT FUNCTIONS
// ============================================

fn default_version() -> u32 {
    CONFIG_VERSION
}
fn default_dashboard_port() -> u16 {
    DEFAULT_DASHBOARD_PORT
}
fn default_port_range() -> u16 {
    DEFAULT_PORT_RANGE
}
fn default_lock_timeout_ms() -> u64 {
    10_000
}
fn default_registration_retry_ms() -> u64 {
    30_000
}
fn default_heartbeat_interval_secs() -> u64 {
    30
}
fn default_dashboard_poll_secs() -> u64 {
    5
}

// ============================================
// IMPLEMENTATION
// ============================================

impl RegistryConfig {
    /// Load config from {home}/config.toml.
    ///
    /// # Returns
    ///
    /// Returns defaults if the file is missing.
    /// Returns `Err(ConfigError)` if the file exists but is unreadable or invalid.
    #[track_caller]
    pub fn load(home: &Path) -> Result<Self, ConfigError> {
        let config_path = home.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            debug!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path).map_err(|e| {
            warn!("Failed to read config file: {e}");
            ConfigError::ReadError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                source: e,
            }
        })?;

        let config: RegistryConfig = toml::from_str(&contents).map_err(|e| {
            warn!("Failed to parse config TOML: {e}");
            ConfigError::ParseError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                reason: e.to_string(),
            }
        })?;

        config.validate()?;

        info!("Config loaded from {}", config_path.display());
        Ok(config)
    }

    /// Save config to {home}/config.toml using temp file + rename.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if validation, serialization or any write step fails.
    #[track_caller]
    pub fn save(&self, home: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        std::fs::create_dir_all(home).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: home.to_path_buf(),
            source: e,
        })?;

        let config_path = home.join(CONFIG_FILE_NAME);
        let temp_path = home.join(format!("{CONFIG_FILE_NAME}.tmp"));

        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError {
                location: ErrorLocation::from(Location::caller()),
                reason: e.to_string(),
            })?;

        std::fs::write(&temp_path, contents).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: temp_path.clone(),
            source: e,
        })?;

        std::fs::rename(&temp_path, &config_path).map_err(|e| {
            let _ = std::fs::remove_file(&temp_path);
            ConfigError::WriteError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                source: e,
            }
        })?;

        info!("Config saved to {}", config_path.display());
        Ok(())
    }

    /// Validate config values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if any value is invalid.
    #[track_caller]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version == 0 || self.version > CONFIG_VERSION {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!(
                    "Invalid version: {} (expected 1-{CONFIG_VERSION})",
                    self.version
                ),
            });
        }

        if self.ports.dashboard_port == 0 {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: String::from("dashboard_port must be non-zero"),
            });
        }

        if self.ports.port_range == 0 {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: String::from("port_range must be non-zero"),
            });
        }

        if self
            .ports
            .dashboard_port
            .checked_add(self.ports.port_range)
            .is_none()
        {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!(
                    "dashboard_port {} + port_range {} exceeds 65535",
                    self.ports.dashboard_port, self.ports.port_range
                ),
            });
        }

        let timings = [
            ("lock_timeout_ms", self.timing.lock_timeout_ms),
            ("registration_retry_ms", self.timing.registration_retry_ms),
            ("heartbeat_interval_secs", self.timing.heartbeat_interval_secs),
            ("dashboard_poll_secs", self.timing.dashboard_poll_secs),
        ];
        if let Some((name, _)) = timings.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!("{name} must be non-zero"),
            });
        }

        Ok(())
    }

    pub fn port_range(&self) -> PortRange {
        PortRange::above(self.ports.dashboard_port, self.ports.port_range)
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.timing.lock_timeout_ms)
    }

    pub fn registration_retry(&self) -> Duration {
        Duration::from_millis(self.timing.registration_retry_ms)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.timing.heartbeat_interval_secs)
    }

    pub fn dashboard_poll(&self) -> Duration {
        Duration::from_secs(self.timing.dashboard_poll_secs)
    }
}
