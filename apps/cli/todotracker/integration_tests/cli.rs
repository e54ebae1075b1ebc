use crate::helpers::{
    dead_pid, project, read_registry, server, todotracker, write_registry,
};

use assert_cmd::assert::OutputAssertExt;
use predicates::prelude::*;

#[test]
fn given_empty_home_when_list_json_then_prints_empty_array() {
    let home = tempfile::tempdir().unwrap();

    let output = todotracker(home.path())
        .args(["list", "--format", "json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(rows, serde_json::json!([]));
}

#[test]
fn given_empty_home_when_list_pretty_then_prints_message() {
    let home = tempfile::tempdir().unwrap();

    todotracker(home.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No TodoTracker servers are running."));
}

/// **VALUE**: `list --format json` reports live servers and drops dead ones.
///
/// **WHY THIS MATTERS**: Editor integrations read this output to find the port
/// for the project they opened.
#[test]
fn given_live_and_dead_entries_when_list_json_then_only_live_rows() {
    // GIVEN: Our test process is alive, the other pid is not
    let home = tempfile::tempdir().unwrap();
    let (_alive_tmp, alive_db) = project("alive");
    let (_dead_tmp, dead_db) = project("dead");
    write_registry(
        home.path(),
        serde_json::json!([
            server("alive", &alive_db, 8075, std::process::id()),
            server("dead", &dead_db, 8071, dead_pid()),
        ]),
    );

    // WHEN
    let output = todotracker(home.path())
        .args(["list", "--format", "json"])
        .output()
        .unwrap();

    // THEN
    assert!(output.status.success());
    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["project_name"], "alive");
    assert_eq!(rows[0]["url"], "http://localhost:8075");
}

#[test]
fn given_dead_entry_when_cleanup_then_reports_and_removes_it() {
    let home = tempfile::tempdir().unwrap();
    let (_tmp, db) = project("ghost");
    write_registry(
        home.path(),
        serde_json::json!([server("ghost", &db, 8071, dead_pid())]),
    );

    todotracker(home.path())
        .arg("cleanup")
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 1 stale entry"));

    assert_eq!(read_registry(home.path())["servers"], serde_json::json!([]));
}

/// **VALUE**: A second `serve` for a running project reuses it and exits 0.
///
/// **WHY THIS MATTERS**: Launchers call `serve` unconditionally on project open.
/// A non-zero exit here would be reported to the user as a failure.
#[test]
fn given_live_server_for_db_when_serve_then_reports_existing_and_succeeds() {
    // GIVEN: The test process "owns" the project on 8090
    let home = tempfile::tempdir().unwrap();
    let (_tmp, db) = project("acme");
    write_registry(
        home.path(),
        serde_json::json!([server("acme", &db, 8090, std::process::id())]),
    );

    // WHEN / THEN
    todotracker(home.path())
        .args(["serve", "--db-path"])
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("already running"))
        .stdout(predicate::str::contains("http://localhost:8090"));

    // AND: Nothing new was registered
    assert_eq!(
        read_registry(home.path())["servers"].as_array().unwrap().len(),
        1
    );
}

/// **VALUE**: Fatal errors are one `error: ... | remedy: ...` line and exit 1.
///
/// **WHY THIS MATTERS**: Wrappers and users read stderr line by line. A log record
/// echoing the same failure ahead of the report line doubles every error.
///
/// **BUG THIS CATCHES**: Would catch the fatal error being logged to the console
/// dispatch as well as printed as the report line.
#[test]
fn given_no_project_database_when_serve_then_fails_with_remedy() {
    // GIVEN: A directory with no .todos/project.db anywhere above it
    let home = tempfile::tempdir().unwrap();
    let empty = tempfile::tempdir().unwrap();

    // WHEN
    let assert = todotracker(home.path())
        .arg("serve")
        .current_dir(empty.path())
        .assert()
        .failure()
        .code(1);

    // THEN: Exactly one stderr line, carrying the error and its remedy
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();
    assert_eq!(stderr.lines().count(), 1, "stderr was: {stderr}");
    assert!(stderr.starts_with("error: Database Not Found Error"));
    assert!(stderr.contains("| remedy: "));
    assert!(stderr.contains("--db-path"));

    // AND: The log file still records the failure
    let log = std::fs::read_to_string(home.path().join("todotracker.log")).unwrap();
    assert!(log.contains("Database Not Found Error"));
}

#[test]
fn given_invalid_config_when_list_then_fails_with_config_remedy() {
    let home = tempfile::tempdir().unwrap();
    std::fs::write(home.path().join("config.toml"), "[ports]\nport_range = 0\n").unwrap();

    todotracker(home.path())
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("port_range must be non-zero"))
        .stderr(predicate::str::contains("config.toml"));
}

#[test]
fn given_any_command_when_run_then_writes_log_file_in_home() {
    let home = tempfile::tempdir().unwrap();

    todotracker(home.path()).arg("cleanup").assert().success();

    assert!(home.path().join("todotracker.log").is_file());
}
