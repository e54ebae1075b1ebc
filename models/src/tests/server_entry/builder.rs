use crate::{ModelError, ServerEntryBuilder};

use chrono::{TimeZone, Utc};

fn valid_builder() -> ServerEntryBuilder {
    ServerEntryBuilder::default()
        .with_project_name("acme")
        .with_db_path("/p/.todos/project.db")
        .with_port(8070)
        .with_pid(12345)
}

fn validation_message(builder: ServerEntryBuilder) -> String {
    match builder.build().unwrap_err() {
        ModelError::Validation { message, .. } => message,
    }
}

/// **VALUE**: Verifies that builder validation rejects zero PIDs.
///
/// **WHY THIS MATTERS**: PID 0 never names a real process. An entry with pid 0 would
/// be swept immediately, or worse, never deregistered by its owner.
///
/// **BUG THIS CATCHES**: Would catch if the zero check is deleted during refactoring.
#[test]
fn given_zero_pid_when_building_server_entry_then_returns_validation_error() {
    // GIVEN: Builder with PID set to zero
    let builder = valid_builder().with_pid(0);

    // WHEN: Attempting to build
    let message = validation_message(builder);

    // THEN: Should return validation error
    assert_eq!(message, "PID must be non-zero");
}

/// **VALUE**: Verifies that builder validation rejects missing PID.
///
/// **WHY THIS MATTERS**: Deregistration on shutdown matches by pid. An entry without
/// one could never be removed by its owner.
#[test]
fn given_missing_pid_when_building_then_returns_validation_error() {
    // GIVEN: Builder without PID
    let builder = ServerEntryBuilder::default()
        .with_project_name("acme")
        .with_db_path("/p/.todos/project.db")
        .with_port(8070);

    // WHEN / THEN
    assert_eq!(validation_message(builder), "PID is required");
}

#[test]
fn given_missing_port_when_building_then_returns_validation_error() {
    let builder = ServerEntryBuilder::default()
        .with_project_name("acme")
        .with_db_path("/p/.todos/project.db")
        .with_pid(1);

    assert_eq!(validation_message(builder), "Port is required");
}

#[test]
fn given_zero_port_when_building_then_returns_validation_error() {
    assert_eq!(
        validation_message(valid_builder().with_port(0)),
        "Port must be non-zero"
    );
}

/// **VALUE**: Verifies that relative database paths are rejected.
///
/// **WHY THIS MATTERS**: `db_path` is the project identity. `./.todos/project.db`
/// launched from two directories would look identical while naming different
/// databases, defeating reuse detection.
///
/// **BUG THIS CATCHES**: Would catch if callers stop canonicalizing paths and the
/// builder silently accepts the result.
#[test]
fn given_relative_db_path_when_building_then_returns_validation_error() {
    // GIVEN: A relative database path
    let builder = valid_builder().with_db_path(".todos/project.db");

    // WHEN
    let message = validation_message(builder);

    // THEN: Message names the offending path
    assert!(message.starts_with("Database path must be absolute:"));
    assert!(message.contains(".todos/project.db"));
}

#[test]
fn given_missing_db_path_when_building_then_returns_validation_error() {
    let builder = ServerEntryBuilder::default()
        .with_project_name("acme")
        .with_port(8070)
        .with_pid(1);

    assert_eq!(validation_message(builder), "Database path is required");
}

#[test]
fn given_blank_project_name_when_building_then_returns_validation_error() {
    assert_eq!(
        validation_message(valid_builder().with_project_name("   ")),
        "Project name cannot be empty"
    );
}

#[test]
fn given_missing_project_name_when_building_then_returns_validation_error() {
    let builder = ServerEntryBuilder::default()
        .with_db_path("/p/.todos/project.db")
        .with_port(8070)
        .with_pid(1);

    assert_eq!(validation_message(builder), "Project name is required");
}

/// **VALUE**: Verifies a complete builder produces the expected entry.
///
/// **WHY THIS MATTERS**: This is the exact shape written to the shared registry file.
#[test]
fn given_all_valid_fields_when_building_then_returns_server_entry() {
    // GIVEN: A fixed start time
    let started = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();

    // WHEN
    let entry = valid_builder().with_started_at(started).build().unwrap();

    // THEN: Fields are carried over; heartbeat defaults to start time
    assert_eq!(entry.project_name, "acme");
    assert_eq!(entry.db_path.to_str(), Some("/p/.todos/project.db"));
    assert_eq!(entry.port, 8070);
    assert_eq!(entry.pid, 12345);
    assert_eq!(entry.started_at, started);
    assert_eq!(entry.last_heartbeat, Some(started));
}

#[test]
fn given_explicit_heartbeat_when_building_then_keeps_it() {
    let started = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
    let beat = Utc.with_ymd_and_hms(2026, 1, 2, 3, 5, 0).unwrap();

    let entry = valid_builder()
        .with_started_at(started)
        .with_last_heartbeat(beat)
        .build()
        .unwrap();

    assert_eq!(entry.last_heartbeat, Some(beat));
}

#[test]
fn given_no_started_at_when_building_then_defaults_to_now() {
    let before = Utc::now();

    let entry = valid_builder().build().unwrap();

    let after = Utc::now();
    assert!(entry.started_at >= before && entry.started_at <= after);
}

#[test]
fn given_built_entry_when_url_called_then_formats_host_and_port() {
    let entry = valid_builder().build().unwrap();

    assert_eq!(entry.url("localhost"), "http://localhost:8070");
}
