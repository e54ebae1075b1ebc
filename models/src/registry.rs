use crate::ServerEntry;

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// The persisted list of known project servers.
///
/// Serialized as `{ "servers": [ ... ] }`. Readers tolerate a missing
/// `servers` key and unknown sibling fields so older and newer writers can
/// share one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    #[serde(default)]
    pub servers: Vec<ServerEntry>,
}

impl Registry {
    pub fn new(servers: Vec<ServerEntry>) -> Self {
        Self { servers }
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServerEntry> {
        self.servers.iter()
    }

    pub fn find_by_db_path(&self, db_path: &Path) -> Option<&ServerEntry> {
        self.servers.iter().find(|s| s.is_for_db(db_path))
    }

    pub fn find_by_pid(&self, pid: u32) -> Option<&ServerEntry> {
        self.servers.iter().find(|s| s.pid == pid)
    }

    pub fn find_by_pid_mut(&mut self, pid: u32) -> Option<&mut ServerEntry> {
        self.servers.iter_mut().find(|s| s.pid == pid)
    }

    /// Ports held by recorded entries, ascending.
    pub fn claimed_ports(&self) -> BTreeSet<u16> {
        self.servers.iter().map(|s| s.port).collect()
    }

    pub fn push(&mut self, entry: ServerEntry) {
        self.servers.push(entry);
    }

    /// Remove every entry owned by `pid`. Returns how many were removed.
    pub fn remove_by_pid(&mut self, pid: u32) -> usize {
        let before = self.servers.len();
        self.servers.retain(|s| s.pid != pid);
        before - self.servers.len()
    }

    /// Remove every entry claiming `port`. Returns how many were removed.
    pub fn evict_port(&mut self, port: u16) -> usize {
        let before = self.servers.len();
        self.servers.retain(|s| s.port != port);
        before - self.servers.len()
    }

    pub fn retain<F>(&mut self, f: F)
    where
        F: FnMut(&ServerEntry) -> bool,
    {
        self.servers.retain(f);
    }
}
