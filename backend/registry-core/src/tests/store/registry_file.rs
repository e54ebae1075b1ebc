use crate::error::RegistryError;
use crate::paths::{PathSource, RegistryPaths};
use crate::store::{RegistryStore, parse_registry};

use models::{Registry, ServerEntryBuilder};

use std::fs;
use std::path::Path;
use std::time::Duration;

use tempfile::tempdir;

fn store_in(dir: &Path) -> RegistryStore {
    let paths = RegistryPaths::in_dir(dir, PathSource::Explicit);
    RegistryStore::new(&paths, Duration::from_secs(2))
}

fn entry(port: u16, pid: u32) -> models::ServerEntry {
    ServerEntryBuilder::default()
        .with_project_name("alpha")
        .with_db_path(format!("/work/alpha-{port}/.todos/project.db"))
        .with_port(port)
        .with_pid(pid)
        .build()
        .unwrap()
}

#[test]
fn given_blank_contents_when_parsed_then_registry_is_empty() {
    assert!(parse_registry("", Path::new("servers.json")).is_empty());
    assert!(parse_registry("  \n\t", Path::new("servers.json")).is_empty());
}

/// **VALUE**: A corrupt registry is treated as empty instead of failing.
///
/// **WHY THIS MATTERS**: A truncated file from an older, non-atomic writer would
/// otherwise block every server start until someone deleted it by hand.
#[test]
fn given_corrupt_contents_when_parsed_then_registry_is_empty() {
    let registry = parse_registry("{\"servers\": [", Path::new("servers.json"));

    assert!(registry.is_empty());
}

#[test]
fn given_missing_file_when_loaded_then_registry_is_empty() {
    let dir = tempdir().unwrap();
    let store = store_in(dir.path());

    assert!(store.load().unwrap().is_empty());
}

/// **VALUE**: A successful mutation is persisted and no temp file is left behind.
///
/// **BUG THIS CATCHES**: Would catch a rename that is skipped or pointed at the
/// wrong target, leaving `servers.json.tmp` as the only copy of the data.
#[test]
fn given_mutation_when_with_lock_succeeds_then_persists_without_temp_file() {
    // GIVEN
    let dir = tempdir().unwrap();
    let store = store_in(dir.path());

    // WHEN
    store
        .with_lock(|registry| {
            registry.push(entry(8070, 10));
            Ok::<_, RegistryError>(())
        })
        .unwrap();

    // THEN
    let loaded = store.load().unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded.servers[0].port, 8070);
    assert!(!dir.path().join("servers.json.tmp").exists());
}

/// **VALUE**: A failing closure leaves the registry untouched.
///
/// **WHY THIS MATTERS**: Port exhaustion is reported from inside the locked
/// section. Whatever the closure did before failing must not be written.
#[test]
fn given_closure_error_when_with_lock_then_nothing_is_persisted() {
    // GIVEN: An existing registry
    let dir = tempdir().unwrap();
    let store = store_in(dir.path());
    store
        .with_lock(|registry| {
            registry.push(entry(8070, 10));
            Ok::<_, RegistryError>(())
        })
        .unwrap();

    // WHEN: A closure mutates and then fails
    let result: Result<(), RegistryError> = store.with_lock(|registry| {
        registry.push(entry(8071, 11));
        Err(RegistryError::Serialize {
            location: common::ErrorLocation::from(std::panic::Location::caller()),
            reason: String::from("forced"),
        })
    });

    // THEN: The error surfaces and the file still has one entry
    assert!(result.is_err());
    assert_eq!(store.load().unwrap().len(), 1);
}

#[test]
fn given_unchanged_registry_when_with_lock_then_file_is_not_created() {
    let dir = tempdir().unwrap();
    let store = store_in(dir.path());

    let count = store
        .with_lock(|registry| Ok::<_, RegistryError>(registry.len()))
        .unwrap();

    assert_eq!(count, 0);
    assert!(!store.registry_file().exists());
}

#[test]
fn given_corrupt_file_when_with_lock_writes_then_file_is_replaced() {
    let dir = tempdir().unwrap();
    let store = store_in(dir.path());
    fs::write(store.registry_file(), "not json").unwrap();

    store
        .with_lock(|registry| {
            registry.push(entry(8070, 10));
            Ok::<_, RegistryError>(())
        })
        .unwrap();

    let raw = fs::read_to_string(store.registry_file()).unwrap();
    let parsed: Registry = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed.len(), 1);
}

#[test]
fn given_missing_home_when_with_lock_then_creates_it() {
    let dir = tempdir().unwrap();
    let home = dir.path().join("nested").join("home");
    let store = store_in(&home);

    store
        .with_lock(|registry| {
            registry.push(entry(8070, 10));
            Ok::<_, RegistryError>(())
        })
        .unwrap();

    assert!(home.join("servers.json").is_file());
    assert!(home.join("servers.lock").is_file());
}
