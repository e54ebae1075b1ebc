// Unit tests for process module private functions
// Integration tests for public API are in integration_tests/discovery.rs

use crate::discovery::process::{LivenessChecker, format_command, with_process};

use models::{Registry, ServerEntryBuilder};

/// **VALUE**: Tests the private `format_command()` helper on a real process.
///
/// **WHY THIS MATTERS**: The dashboard takeover decides whether a port owner is a
/// previous TodoTracker instance from its command line.
#[test]
fn given_valid_process_when_format_command_called_then_returns_command_string() {
    // GIVEN: A valid process (using our own PID)
    let our_pid = std::process::id();

    // WHEN: Calling format_command on the process
    let result = with_process(our_pid, format_command);

    // THEN: Should return Some with non-empty command string
    let cmd = result.expect("Should find the process");
    assert!(!cmd.is_empty(), "Command string should not be empty");
}

/// **VALUE**: Tests that `with_process()` gracefully handles non-existent PIDs.
///
/// **BUG THIS CATCHES**: Prevents crashes when querying processes that died between
/// the socket scan and the process lookup.
#[test]
fn given_nonexistent_pid_when_with_process_called_then_returns_none() {
    // GIVEN: A PID that doesn't exist
    let fake_pid = u32::MAX;

    // WHEN
    let result = with_process(fake_pid, |_| true);

    // THEN
    assert!(result.is_none(), "Should return None for non-existent process");
}

#[test]
fn given_pid_zero_when_is_alive_then_false() {
    let checker = LivenessChecker::new();

    assert!(!checker.is_alive(0));
}

/// **VALUE**: One snapshot sweeps out dead pids and keeps live ones.
///
/// **WHY THIS MATTERS**: This is the sole mechanism that frees ports of crashed
/// servers. Keeping a dead entry leaks its port forever; dropping a live one lets
/// a second server claim the same database.
#[test]
fn given_live_and_dead_entries_when_swept_then_only_live_remain() {
    // GIVEN: Our own pid (alive) and an impossible pid (dead)
    let live = ServerEntryBuilder::default()
        .with_project_name("live")
        .with_db_path("/work/live/.todos/project.db")
        .with_port(8070)
        .with_pid(std::process::id())
        .build()
        .unwrap();
    let dead = ServerEntryBuilder::default()
        .with_project_name("dead")
        .with_db_path("/work/dead/.todos/project.db")
        .with_port(8071)
        .with_pid(u32::MAX)
        .build()
        .unwrap();
    let registry = Registry::new(vec![live.clone(), dead]);

    // WHEN
    let swept = LivenessChecker::new().sweep(&registry);

    // THEN: Input is untouched, output holds only the live entry
    assert_eq!(registry.len(), 2);
    assert_eq!(swept.servers, vec![live]);
}

/// **VALUE**: Sweeping a registry whose processes are all alive changes nothing.
///
/// **WHY THIS MATTERS**: Every dashboard refresh sweeps. If a clean registry came
/// back different (reordered, reshaped), each refresh would rewrite the file and
/// churn the lock for no reason.
#[test]
fn given_only_live_entries_when_swept_then_registry_is_unchanged() {
    // GIVEN: Two entries, both owned by this (live) process
    let pid = std::process::id();
    let first = ServerEntryBuilder::default()
        .with_project_name("first")
        .with_db_path("/work/first/.todos/project.db")
        .with_port(8071)
        .with_pid(pid)
        .build()
        .unwrap();
    let second = ServerEntryBuilder::default()
        .with_project_name("second")
        .with_db_path("/work/second/.todos/project.db")
        .with_port(8070)
        .with_pid(pid)
        .build()
        .unwrap();
    let registry = Registry::new(vec![first, second]);

    // WHEN
    let swept = LivenessChecker::new().sweep(&registry);

    // THEN: Same entries, same order
    assert_eq!(swept, registry);
}
