use crate::output::{NO_SERVERS_MESSAGE, format_cleanup, format_rows};

use registry_core::{CleanupReport, DashboardRow, InstanceStatus};

use models::ServerEntryBuilder;

use chrono::{Duration, TimeZone, Utc};

fn row(name: &str, port: u16) -> DashboardRow {
    let started = Utc.with_ymd_and_hms(2026, 4, 2, 9, 0, 0).unwrap();
    let entry = ServerEntryBuilder::default()
        .with_project_name(name)
        .with_db_path(format!("/work/{name}/.todos/project.db"))
        .with_port(port)
        .with_pid(4242)
        .with_started_at(started)
        .build()
        .unwrap();
    DashboardRow::from_entry(&entry, started + Duration::minutes(190))
}

#[test]
fn given_no_rows_when_formatted_then_prints_empty_message() {
    assert_eq!(format_rows(&[]), format!("{NO_SERVERS_MESSAGE}\n"));
}

#[test]
fn given_rows_when_formatted_then_one_line_each_after_header() {
    let mut slow = row("beta", 8071);
    slow.status = InstanceStatus::Unresponsive;
    let rows = vec![row("alpha-project", 8070), slow];

    let table = format_rows(&rows);
    let lines: Vec<&str> = table.lines().collect();

    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("PROJECT"));
    assert!(lines[1].contains("alpha-project"));
    assert!(lines[1].contains("3h 10m"));
    assert!(lines[1].contains("http://localhost:8070"));
    assert!(lines[2].contains("unresponsive"));
}

#[test]
fn given_cleanup_report_when_formatted_then_pluralizes() {
    assert_eq!(
        format_cleanup(&CleanupReport { removed: 1, active: 3 }),
        "Removed 1 stale entry; 3 active server(s)"
    );
    assert_eq!(
        format_cleanup(&CleanupReport { removed: 0, active: 0 }),
        "Removed 0 stale entries; 0 active server(s)"
    );
}
