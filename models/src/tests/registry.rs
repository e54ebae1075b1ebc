use crate::{Registry, ServerEntry, ServerEntryBuilder};

use std::path::Path;

use chrono::{TimeZone, Utc};

fn entry(name: &str, port: u16, pid: u32) -> ServerEntry {
    ServerEntryBuilder::default()
        .with_project_name(name)
        .with_db_path(format!("/work/{name}/.todos/project.db"))
        .with_port(port)
        .with_pid(pid)
        .with_started_at(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap())
        .build()
        .unwrap()
}

/// **VALUE**: Verifies the on-disk document shape `{ "servers": [...] }`.
///
/// **WHY THIS MATTERS**: The registry file is shared by every TodoTracker process on
/// the machine, including ones built from older versions.
#[test]
fn given_registry_when_serialized_then_uses_servers_key() {
    // GIVEN
    let registry = Registry::new(vec![entry("alpha", 8070, 10)]);

    // WHEN
    let json = serde_json::to_value(&registry).unwrap();

    // THEN
    let servers = json["servers"].as_array().unwrap();
    assert_eq!(servers.len(), 1);
    assert_eq!(servers[0]["port"], 8070);
    assert_eq!(servers[0]["db_path"], "/work/alpha/.todos/project.db");
    assert_eq!(servers[0]["started_at"], "2026-03-01T12:00:00Z");
}

/// **VALUE**: Readers tolerate unknown fields and a missing heartbeat.
///
/// **BUG THIS CATCHES**: Would catch if someone adds `deny_unknown_fields` and a newer
/// writer's extra fields make every older reader treat the registry as corrupt.
#[test]
fn given_unknown_fields_when_deserialized_then_ignores_them() {
    // GIVEN: A document with extra fields at both levels
    let json = r#"{
        "version": 7,
        "servers": [{
            "project_name": "alpha",
            "db_path": "/work/alpha/.todos/project.db",
            "port": 8070,
            "pid": 42,
            "started_at": "2026-03-01T12:00:00Z",
            "is_running": true
        }]
    }"#;

    // WHEN
    let registry: Registry = serde_json::from_str(json).unwrap();

    // THEN
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.servers[0].pid, 42);
    assert!(registry.servers[0].last_heartbeat.is_none());
}

#[test]
fn given_document_without_servers_key_when_deserialized_then_is_empty() {
    let registry: Registry = serde_json::from_str("{}").unwrap();

    assert!(registry.is_empty());
}

#[test]
fn given_entries_when_finding_by_db_path_then_matches_exact_path() {
    let registry = Registry::new(vec![entry("alpha", 8070, 10), entry("beta", 8071, 11)]);

    let found = registry.find_by_db_path(Path::new("/work/beta/.todos/project.db"));

    assert_eq!(found.map(|e| e.port), Some(8071));
    assert!(
        registry
            .find_by_db_path(Path::new("/work/gamma/.todos/project.db"))
            .is_none()
    );
}

#[test]
fn given_entries_when_claimed_ports_called_then_returns_sorted_set() {
    let registry = Registry::new(vec![entry("beta", 8072, 11), entry("alpha", 8070, 10)]);

    let ports: Vec<u16> = registry.claimed_ports().into_iter().collect();

    assert_eq!(ports, vec![8070, 8072]);
}

/// **VALUE**: Removal by pid only touches that pid's entries.
///
/// **WHY THIS MATTERS**: Shutdown must never delete an entry that another process
/// registered for the same project after this one was considered dead.
#[test]
fn given_same_db_path_different_pids_when_remove_by_pid_then_keeps_other_owner() {
    // GIVEN: Two entries for the same project, different owners
    let mut registry = Registry::new(vec![entry("alpha", 8070, 10), entry("alpha", 8071, 20)]);

    // WHEN: The old owner deregisters
    let removed = registry.remove_by_pid(10);

    // THEN: Only its own entry goes away
    assert_eq!(removed, 1);
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.servers[0].pid, 20);
}

#[test]
fn given_entry_on_port_when_evict_port_then_removes_it() {
    let mut registry = Registry::new(vec![entry("dash", 8069, 5), entry("alpha", 8070, 10)]);

    assert_eq!(registry.evict_port(8069), 1);
    assert_eq!(registry.evict_port(8069), 0);
    assert_eq!(registry.len(), 1);
}

#[test]
fn given_entry_when_find_by_pid_mut_then_allows_heartbeat_update() {
    let mut registry = Registry::new(vec![entry("alpha", 8070, 10)]);
    let beat = Utc.with_ymd_and_hms(2026, 3, 1, 13, 0, 0).unwrap();

    if let Some(found) = registry.find_by_pid_mut(10) {
        found.last_heartbeat = Some(beat);
    }

    assert_eq!(registry.find_by_pid(10).unwrap().last_heartbeat, Some(beat));
}
