use crate::helpers::{TestHome, entry};

use registry_core::error::RegistryError;

use models::Registry;

use std::fs;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

/// **VALUE**: `with_lock` persists what the closure changed, for the next reader.
#[test]
fn given_pushed_entry_when_loaded_by_another_store_then_visible() {
    // GIVEN
    let home = TestHome::new();
    home.store()
        .with_lock(|registry| {
            registry.push(entry("alpha", 8070, 10));
            Ok::<_, RegistryError>(())
        })
        .unwrap();

    // WHEN: A separate store instance reads the same home
    let loaded = home.store().load().unwrap();

    // THEN
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded.servers[0].project_name, "alpha");
}

/// **VALUE**: Persisting a registry and loading it back gives an equal registry.
///
/// **WHY THIS MATTERS**: Every start, heartbeat and sweep is a load followed by a
/// persist. Any field that does not survive the trip (a heartbeat turning into a
/// timestamp, sub-second precision lost) would drift with each write.
///
/// **BUG THIS CATCHES**: Would catch a serde attribute that skips or reshapes a
/// field on one side only.
#[test]
fn given_registry_when_persisted_and_loaded_then_equals_original() {
    // GIVEN: Two entries, one that has never sent a heartbeat
    let home = TestHome::new();
    let mut quiet = entry("beta", 8071, 11);
    quiet.last_heartbeat = None;
    let original = Registry::new(vec![entry("alpha", 8070, 10), quiet]);

    // WHEN: It is written under the lock and read back by a fresh store
    let written = original.clone();
    home.store()
        .with_lock(|registry| {
            *registry = written;
            Ok::<_, RegistryError>(())
        })
        .unwrap();
    let loaded = home.store().load().unwrap();

    // THEN
    assert_eq!(loaded, original);
}

/// **VALUE**: The on-disk document uses the `{ "servers": [...] }` layout.
///
/// **WHY THIS MATTERS**: Other tools read `servers.json` directly.
#[test]
fn given_persisted_registry_when_reading_raw_file_then_has_servers_array() {
    let home = TestHome::new();
    home.seed(vec![entry("alpha", 8070, 10)]);

    let raw = fs::read_to_string(&home.paths.registry_file).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();

    assert_eq!(json["servers"][0]["port"], 8070);
    assert_eq!(json["servers"][0]["pid"], 10);
}

/// **VALUE**: A writer blocked on the lock gives up after the configured timeout.
///
/// **WHY THIS MATTERS**: A wedged process holding the lock must not hang every
/// other TodoTracker start forever.
#[test]
fn given_lock_held_elsewhere_when_with_lock_then_returns_lock_timeout() {
    // GIVEN: Another thread holds the lock for a while
    let home = TestHome::new();
    let holder = home.store();
    let barrier = Arc::new(Barrier::new(2));
    let held = Arc::clone(&barrier);
    let handle = thread::spawn(move || {
        holder
            .with_lock(|_| {
                held.wait();
                thread::sleep(Duration::from_millis(500));
                Ok::<_, RegistryError>(())
            })
            .unwrap();
    });
    barrier.wait();

    // WHEN: A second store with a short timeout tries
    let started = Instant::now();
    let result = home
        .store_with_timeout(Duration::from_millis(100))
        .with_lock(|_| Ok::<_, RegistryError>(()));

    // THEN
    assert!(matches!(result, Err(RegistryError::LockTimeout { .. })));
    assert!(started.elapsed() < Duration::from_millis(500));
    handle.join().unwrap();
}

#[test]
fn given_blank_registry_file_when_loaded_then_empty() {
    let home = TestHome::new();
    fs::write(&home.paths.registry_file, "\n").unwrap();

    assert!(home.store().load().unwrap().is_empty());
}
