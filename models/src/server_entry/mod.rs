pub mod builder;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One running project server as recorded in the shared registry.
///
/// `db_path` is the project's identity: at most one live entry may exist per
/// path. The entry belongs to the process `pid`; only that process refreshes
/// `last_heartbeat` or removes the entry on shutdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEntry {
    pub project_name: String,
    pub db_path: PathBuf,
    pub port: u16,
    pub pid: u32,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_heartbeat: Option<DateTime<Utc>>,
}

impl ServerEntry {
    pub fn is_for_db(&self, db_path: &Path) -> bool {
        self.db_path == db_path
    }

    /// Local URL the instance is reachable on.
    pub fn url(&self, host: &str) -> String {
        format!("http://{host}:{}", self.port)
    }
}
