use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

pub const BINARY: &str = "todotracker";

/// `todotracker` with an isolated home and no inherited project variables.
pub fn todotracker(home: &Path) -> Command {
    let mut command = Command::new(assert_cmd::cargo::cargo_bin(BINARY));
    command
        .env("TODOTRACKER_HOME", home)
        .env_remove("TODOTRACKER_DB_PATH")
        .env_remove("TODOTRACKER_PROJECT_NAME");
    command
}

/// Creates `<tmp>/<name>/.todos/project.db`; returns (tmp, canonical db path).
pub fn project(name: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let todos = dir.path().join(name).join(".todos");
    fs::create_dir_all(&todos).unwrap();
    let db = todos.join("project.db");
    fs::write(&db, b"").unwrap();
    let canonical = fs::canonicalize(&db).unwrap();
    (dir, canonical)
}

pub fn write_registry(home: &Path, servers: serde_json::Value) {
    fs::create_dir_all(home).unwrap();
    let document = serde_json::json!({ "servers": servers });
    fs::write(
        home.join("servers.json"),
        serde_json::to_string_pretty(&document).unwrap(),
    )
    .unwrap();
}

pub fn read_registry(home: &Path) -> serde_json::Value {
    let raw = fs::read_to_string(home.join("servers.json")).unwrap_or_default();
    if raw.trim().is_empty() {
        return serde_json::json!({ "servers": [] });
    }
    serde_json::from_str(&raw).unwrap()
}

pub fn server(name: &str, db_path: &Path, port: u16, pid: u32) -> serde_json::Value {
    serde_json::json!({
        "project_name": name,
        "db_path": db_path,
        "port": port,
        "pid": pid,
        "started_at": "2026-01-01T00:00:00Z"
    })
}

/// Pid of a process that has already exited and been reaped.
pub fn dead_pid() -> u32 {
    let mut child = Command::new("true").spawn().unwrap();
    let pid = child.id();
    child.wait().unwrap();
    pid
}

/// Writes a config moving the port range somewhere unlikely to collide.
pub fn write_config(home: &Path, dashboard_port: u16, port_range: u16) {
    fs::create_dir_all(home).unwrap();
    fs::write(
        home.join("config.toml"),
        format!(
            "[ports]\ndashboard_port = {dashboard_port}\nport_range = {port_range}\n\n\
             [timing]\nheartbeat_interval_secs = 1\n"
        ),
    )
    .unwrap();
}
