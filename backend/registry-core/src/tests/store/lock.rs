use crate::error::RegistryError;
use crate::store::RegistryLock;

use std::time::{Duration, Instant};

use tempfile::tempdir;

/// **VALUE**: The lock excludes a second holder, even in the same process.
///
/// **WHY THIS MATTERS**: Each `RegistryStore` opens its own handle to the lock
/// file. Threads in one process and separate processes must both be serialized.
///
/// **BUG THIS CATCHES**: Would catch a switch to a lock flavor that is scoped to
/// the process (e.g. fcntl record locks), which would let two threads in one
/// binary write the registry at the same time.
#[test]
fn given_held_lock_when_acquiring_again_then_times_out() {
    // GIVEN: One holder
    let dir = tempdir().unwrap();
    let path = dir.path().join("servers.lock");
    let _held = RegistryLock::acquire(&path, Duration::from_secs(1)).unwrap();

    // WHEN: A second handle tries with a short timeout
    let started = Instant::now();
    let result = RegistryLock::acquire(&path, Duration::from_millis(100));

    // THEN: LockTimeout, after roughly the timeout
    match result {
        Err(RegistryError::LockTimeout { waited, .. }) => {
            assert!(waited >= Duration::from_millis(100));
        }
        other => panic!("expected LockTimeout, got {other:?}"),
    }
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[test]
fn given_released_lock_when_acquiring_again_then_succeeds() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("servers.lock");

    let first = RegistryLock::acquire(&path, Duration::from_secs(1)).unwrap();
    first.release().unwrap();

    let second = RegistryLock::acquire(&path, Duration::from_millis(100));
    assert!(second.is_ok(), "lock should be free after release");
}

/// **VALUE**: Dropping the guard frees the lock.
///
/// **BUG THIS CATCHES**: Would catch an early return path that leaks the guard
/// into a long-lived structure, blocking every other process for the timeout.
#[test]
fn given_dropped_lock_when_acquiring_again_then_succeeds() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("servers.lock");

    {
        let _guard = RegistryLock::acquire(&path, Duration::from_secs(1)).unwrap();
    }

    assert!(RegistryLock::acquire(&path, Duration::from_millis(100)).is_ok());
}

#[test]
fn given_missing_directory_when_acquiring_then_returns_lock_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing").join("servers.lock");

    let result = RegistryLock::acquire(&path, Duration::from_millis(100));

    assert!(matches!(result, Err(RegistryError::Lock { .. })));
}
