use crate::helpers::{
    FakeProbe, LiveProcess, TestHome, config_with, dead_pid, default_config, entry, identity,
};

use registry_core::error::{LifecycleError, RegistryError};
use registry_core::{LifecycleState, Registration, ServerLifecycle, StartOutcome};

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

fn registered(outcome: StartOutcome) -> Registration {
    match outcome {
        StartOutcome::Registered(registration) => registration,
        StartOutcome::ReusingExisting(entry) => panic!("expected registration, reused {entry:?}"),
    }
}

/// **VALUE**: A fresh start records an entry and hands back a running guard.
#[test]
fn given_empty_registry_when_starting_then_registers_first_port() {
    // GIVEN
    let home = TestHome::new();
    let lifecycle = ServerLifecycle::with_probe(home.store(), &default_config(), FakeProbe::default());

    // WHEN
    let registration = registered(lifecycle.start(&identity("alpha"), std::process::id()).unwrap());

    // THEN
    assert_eq!(registration.port(), 8070);
    assert_eq!(registration.state(), LifecycleState::Running);
    let stored = home.store().load().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored.servers[0].pid, std::process::id());
    assert_eq!(stored.servers[0].project_name, "alpha");
}

/// **VALUE**: A second start for the same database reuses the live server.
///
/// **WHY THIS MATTERS**: Two servers writing the same SQLite file from different
/// ports is the failure this registry exists to prevent.
///
/// **BUG THIS CATCHES**: Would catch a lookup by project name instead of database
/// path, or a reuse check that runs outside the lock.
#[test]
fn given_live_server_for_db_when_starting_again_then_reuses_existing() {
    // GIVEN: A live owner registered for alpha
    let home = TestHome::new();
    let owner = LiveProcess::spawn();
    let lifecycle = ServerLifecycle::with_probe(home.store(), &default_config(), FakeProbe::default());
    let _first = registered(lifecycle.start(&identity("alpha"), owner.pid()).unwrap());

    // WHEN: Another process starts for the same database
    let outcome = lifecycle.start(&identity("alpha"), std::process::id()).unwrap();

    // THEN: It is told about the existing server and nothing new is recorded
    match outcome {
        StartOutcome::ReusingExisting(existing) => {
            assert_eq!(existing.pid, owner.pid());
            assert_eq!(existing.port, 8070);
        }
        StartOutcome::Registered(_) => panic!("expected reuse"),
    }
    assert_eq!(home.store().load().unwrap().len(), 1);
}

#[test]
fn given_live_server_for_other_db_when_starting_then_takes_next_port() {
    let home = TestHome::new();
    let owner = LiveProcess::spawn();
    home.seed(vec![entry("alpha", 8070, owner.pid())]);
    let lifecycle = ServerLifecycle::with_probe(home.store(), &default_config(), FakeProbe::default());

    let registration = registered(lifecycle.start(&identity("beta"), std::process::id()).unwrap());

    assert_eq!(registration.port(), 8071);
    assert_eq!(home.store().load().unwrap().len(), 2);
}

/// **VALUE**: A crashed server's entry is swept and its port handed out again.
///
/// **WHY THIS MATTERS**: Servers killed with SIGKILL never deregister. Without the
/// sweep, each crash would leak a port and eventually exhaust the range.
#[test]
fn given_dead_entry_for_same_db_when_starting_then_replaces_it() {
    // GIVEN: alpha recorded on 8070 by a process that has exited
    let home = TestHome::new();
    home.seed(vec![entry("alpha", 8070, dead_pid())]);
    let lifecycle = ServerLifecycle::with_probe(home.store(), &default_config(), FakeProbe::default());

    // WHEN
    let registration = registered(lifecycle.start(&identity("alpha"), std::process::id()).unwrap());

    // THEN: Registered fresh on the freed port, the stale entry is gone
    assert_eq!(registration.port(), 8070);
    let stored = home.store().load().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored.servers[0].pid, std::process::id());
}

#[test]
fn given_registration_when_released_then_entry_removed_and_state_stopped() {
    let home = TestHome::new();
    let lifecycle = ServerLifecycle::with_probe(home.store(), &default_config(), FakeProbe::default());
    let registration = registered(lifecycle.start(&identity("alpha"), std::process::id()).unwrap());

    let removed = registration.release().unwrap();

    assert_eq!(removed, 1);
    assert!(home.store().load().unwrap().is_empty());
}

/// **VALUE**: Dropping the guard deregisters, so error paths clean up too.
///
/// **BUG THIS CATCHES**: Would catch a bind failure after registration leaving a
/// permanent entry for a server that never listened.
#[test]
fn given_registration_when_dropped_then_entry_removed() {
    let home = TestHome::new();
    let lifecycle = ServerLifecycle::with_probe(home.store(), &default_config(), FakeProbe::default());

    {
        let _registration =
            registered(lifecycle.start(&identity("alpha"), std::process::id()).unwrap());
        assert_eq!(home.store().load().unwrap().len(), 1);
    }

    assert!(home.store().load().unwrap().is_empty());
}

/// **VALUE**: Deregistration only removes entries owned by this pid.
///
/// **WHY THIS MATTERS**: If this server was presumed dead and replaced, its late
/// shutdown must not delete the replacement's entry.
#[test]
fn given_foreign_entry_when_releasing_then_foreign_entry_survives() {
    // GIVEN: Our registration plus another live owner's entry
    let home = TestHome::new();
    let other = LiveProcess::spawn();
    let lifecycle = ServerLifecycle::with_probe(home.store(), &default_config(), FakeProbe::default());
    let registration = registered(lifecycle.start(&identity("alpha"), std::process::id()).unwrap());
    home.seed(vec![entry("beta", 8090, other.pid())]);

    // WHEN
    registration.release().unwrap();

    // THEN
    let stored = home.store().load().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored.servers[0].pid, other.pid());
}

#[test]
fn given_registration_when_heartbeat_beats_then_updates_timestamp() {
    // GIVEN
    let home = TestHome::new();
    let lifecycle = ServerLifecycle::with_probe(home.store(), &default_config(), FakeProbe::default());
    let registration = registered(lifecycle.start(&identity("alpha"), std::process::id()).unwrap());
    let before = home.store().load().unwrap().servers[0].last_heartbeat.unwrap();
    thread::sleep(Duration::from_millis(20));

    // WHEN
    let found = registration.heartbeat().beat().unwrap();

    // THEN
    assert!(found);
    let after = home.store().load().unwrap().servers[0].last_heartbeat.unwrap();
    assert!(after > before);
}

#[test]
fn given_released_registration_when_heartbeat_beats_then_reports_missing() {
    let home = TestHome::new();
    let lifecycle = ServerLifecycle::with_probe(home.store(), &default_config(), FakeProbe::default());
    let registration = registered(lifecycle.start(&identity("alpha"), std::process::id()).unwrap());
    let heartbeat = registration.heartbeat();

    registration.release().unwrap();

    assert!(!heartbeat.beat().unwrap());
    assert!(home.store().load().unwrap().is_empty());
}

/// **VALUE**: Port exhaustion is reported at once instead of being retried.
///
/// **WHY THIS MATTERS**: Retrying cannot free a port; the user should hear about
/// it immediately rather than after the full registration window.
#[test]
fn given_exhausted_range_when_starting_then_fails_without_retry() {
    // GIVEN: A one-port range that is bound by someone else
    let home = TestHome::new();
    let mut config = config_with(8069, 1);
    config.timing.registration_retry_ms = 5_000;
    let lifecycle = ServerLifecycle::with_probe(home.store(), &config, FakeProbe::occupied(&[8070]));

    // WHEN
    let started = Instant::now();
    let result = lifecycle.start(&identity("alpha"), std::process::id());

    // THEN
    assert!(matches!(result, Err(LifecycleError::PortExhausted { .. })));
    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(home.store().load().unwrap().is_empty());
}

/// **VALUE**: A held lock is retried until the registration window closes.
///
/// **BUG THIS CATCHES**: Would catch lock timeouts being treated as fatal on the
/// first attempt, which fails server starts whenever two launch together.
#[test]
fn given_lock_held_past_window_when_starting_then_returns_lock_timeout_after_retrying() {
    // GIVEN: The lock is held for longer than the whole window
    let home = TestHome::new();
    let holder = home.store();
    let barrier = Arc::new(Barrier::new(2));
    let held = Arc::clone(&barrier);
    let handle = thread::spawn(move || {
        holder
            .with_lock(|_| {
                held.wait();
                thread::sleep(Duration::from_millis(1_500));
                Ok::<_, RegistryError>(())
            })
            .unwrap();
    });
    barrier.wait();

    let mut config = default_config();
    config.timing.lock_timeout_ms = 50;
    config.timing.registration_retry_ms = 300;
    let store = home.store_with_timeout(config.lock_timeout());
    let lifecycle = ServerLifecycle::with_probe(store, &config, FakeProbe::default());

    // WHEN
    let started = Instant::now();
    let result = lifecycle.start(&identity("alpha"), std::process::id());

    // THEN: It kept trying for at least the window, then gave up
    assert!(matches!(
        result,
        Err(LifecycleError::Registry(RegistryError::LockTimeout { .. }))
    ));
    assert!(started.elapsed() >= Duration::from_millis(300));
    handle.join().unwrap();
}

#[test]
fn given_lock_released_within_window_when_starting_then_succeeds() {
    let home = TestHome::new();
    let holder = home.store();
    let barrier = Arc::new(Barrier::new(2));
    let held = Arc::clone(&barrier);
    let handle = thread::spawn(move || {
        holder
            .with_lock(|_| {
                held.wait();
                thread::sleep(Duration::from_millis(200));
                Ok::<_, RegistryError>(())
            })
            .unwrap();
    });
    barrier.wait();

    let mut config = default_config();
    config.timing.lock_timeout_ms = 50;
    config.timing.registration_retry_ms = 10_000;
    let store = home.store_with_timeout(config.lock_timeout());
    let lifecycle = ServerLifecycle::with_probe(store, &config, FakeProbe::default());

    let registration = registered(lifecycle.start(&identity("alpha"), std::process::id()).unwrap());

    assert_eq!(registration.port(), 8070);
    handle.join().unwrap();
}
