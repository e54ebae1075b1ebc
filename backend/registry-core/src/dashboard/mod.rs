//! Read side of the registry: what is running, for how long, and cleanup of
//! entries whose process is gone.

pub mod server;

use crate::config::RegistryConfig;
use crate::discovery::health::check_health;
use crate::discovery::port::{PortProbe, port_owner};
use crate::discovery::process::{LivenessChecker, stop_pid};
use crate::error::{DashboardError, RegistryError};
use crate::store::RegistryStore;
use crate::{LOOPBACK_BASE_URL, TODOTRACKER_BINARY, TODOTRACKER_HOSTNAME};

use common::ErrorLocation;
use models::{Registry, ServerEntry};

use std::panic::Location;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::Serialize;
use tokio::task::JoinSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceStatus {
    Running,
    Unresponsive,
}

/// One live server as shown by the dashboard and `list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardRow {
    pub project_name: String,
    pub db_path: String,
    pub port: u16,
    pub pid: u32,
    pub url: String,
    pub started_at: DateTime<Utc>,
    pub last_heartbeat: Option<DateTime<Utc>>,
    pub uptime: String,
    pub uptime_seconds: i64,
    pub status: InstanceStatus,
}

impl DashboardRow {
    pub fn from_entry(entry: &ServerEntry, now: DateTime<Utc>) -> Self {
        let uptime_seconds = (now - entry.started_at).num_seconds().max(0);
        Self {
            project_name: entry.project_name.clone(),
            db_path: entry.db_path.display().to_string(),
            port: entry.port,
            pid: entry.pid,
            url: entry.url(TODOTRACKER_HOSTNAME),
            started_at: entry.started_at,
            last_heartbeat: entry.last_heartbeat,
            uptime: format_uptime(uptime_seconds),
            uptime_seconds,
            status: InstanceStatus::Running,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub removed: usize,
    pub active: usize,
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    store: RegistryStore,
    dashboard_port: u16,
}

impl Dashboard {
    pub fn new(store: RegistryStore, config: &RegistryConfig) -> Self {
        Self {
            store,
            dashboard_port: config.ports.dashboard_port,
        }
    }

    pub fn dashboard_port(&self) -> u16 {
        self.dashboard_port
    }

    pub fn store(&self) -> &RegistryStore {
        &self.store
    }

    /// Sweep dead entries and any entry squatting on the dashboard port,
    /// persist, and return what is left.
    pub fn refresh(&self) -> Result<Registry, RegistryError> {
        self.sweep_locked().map(|(_, survivors)| survivors)
    }

    /// Live servers sorted by port, with uptime measured against `now`.
    pub fn rows(&self, now: DateTime<Utc>) -> Result<Vec<DashboardRow>, RegistryError> {
        let registry = self.refresh()?;

        let mut rows: Vec<DashboardRow> = registry
            .iter()
            .map(|entry| DashboardRow::from_entry(entry, now))
            .collect();
        rows.sort_by_key(|row| row.port);

        Ok(rows)
    }

    pub fn cleanup(&self) -> Result<CleanupReport, RegistryError> {
        let (removed, survivors) = self.sweep_locked()?;
        let report = CleanupReport {
            removed,
            active: survivors.len(),
        };

        info!(
            "Cleanup removed {} stale entries, {} active",
            report.removed, report.active
        );
        Ok(report)
    }

    fn sweep_locked(&self) -> Result<(usize, Registry), RegistryError> {
        let reserved = self.dashboard_port;

        self.store.with_lock(|registry| {
            let before = registry.len();
            *registry = LivenessChecker::new().sweep(registry);

            let evicted = registry.evict_port(reserved);
            if evicted > 0 {
                warn!("Evicted {evicted} entries claiming dashboard port {reserved}");
            }

            Ok((before - registry.len(), registry.clone()))
        })
    }

    /// Make sure the dashboard port can be bound.
    ///
    /// A previous TodoTracker dashboard still holding the port is stopped.
    /// Any other owner is left alone and reported.
    #[track_caller]
    pub fn claim_port<P: PortProbe>(&self, probe: &P) -> Result<(), DashboardError> {
        let port = self.dashboard_port;

        if probe.is_free(port)? {
            return Ok(());
        }

        let owner = port_owner(port)?;
        let described = match owner {
            Some(ref owner)
                if owner.pid != std::process::id() && owner.is_todotracker(TODOTRACKER_BINARY) =>
            {
                warn!("Replacing previous dashboard {owner} on port {port}");
                if stop_pid(owner.pid) && probe.is_free(port)? {
                    debug!("Port {port} reclaimed");
                    return Ok(());
                }
                owner.to_string()
            }
            Some(ref owner) => owner.to_string(),
            None => String::from("an unknown process"),
        };

        Err(DashboardError::PortOccupied {
            port,
            owner: described,
            location: ErrorLocation::from(Location::caller()),
        })
    }
}

/// Probe every row's `/api/health` concurrently and flag the ones that do not
/// answer. Rows are otherwise untouched.
pub async fn mark_unresponsive(rows: &mut [DashboardRow]) {
    let mut probes = JoinSet::new();
    for (index, row) in rows.iter().enumerate() {
        let base_url = format!("{LOOPBACK_BASE_URL}:{}", row.port);
        probes.spawn(async move { (index, check_health(&base_url).await) });
    }

    while let Some(result) = probes.join_next().await {
        match result {
            Ok((index, false)) => {
                if let Some(row) = rows.get_mut(index) {
                    debug!("{} on port {} is unresponsive", row.project_name, row.port);
                    row.status = InstanceStatus::Unresponsive;
                }
            }
            Ok((_, true)) => {}
            Err(e) => debug!("Health probe task failed: {e}"),
        }
    }
}

/// "42s", "12m", "3h 7m". Negative durations read as zero.
pub fn format_uptime(seconds: i64) -> String {
    let seconds = seconds.max(0);
    match seconds {
        s if s < 60 => format!("{s}s"),
        s if s < 3600 => format!("{}m", s / 60),
        s => format!("{}h {}m", s / 3600, (s % 3600) / 60),
    }
}
