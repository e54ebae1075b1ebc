use crate::dashboard::server::{escape_html, render_page};
use crate::dashboard::{DashboardRow, InstanceStatus, format_uptime};

use models::ServerEntryBuilder;

use std::time::Duration;

use chrono::{TimeZone, Utc};

/// **VALUE**: Uptime uses the coarsest readable unit.
///
/// **WHY THIS MATTERS**: The dashboard and `list` both show this string. Anyone
/// scripting against `list --format json` reads `uptime_seconds` instead.
#[test]
fn given_durations_when_formatting_uptime_then_uses_coarse_units() {
    assert_eq!(format_uptime(0), "0s");
    assert_eq!(format_uptime(42), "42s");
    assert_eq!(format_uptime(60), "1m");
    assert_eq!(format_uptime(12 * 60 + 59), "12m");
    assert_eq!(format_uptime(3600), "1h 0m");
    assert_eq!(format_uptime(3 * 3600 + 7 * 60 + 5), "3h 7m");
}

/// **BUG THIS CATCHES**: Would catch a clock skew between processes (start time
/// in the future) rendering as a negative uptime.
#[test]
fn given_negative_duration_when_formatting_uptime_then_clamps_to_zero() {
    assert_eq!(format_uptime(-30), "0s");
}

fn row(name: &str, status: InstanceStatus) -> DashboardRow {
    let started = Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).unwrap();
    let entry = ServerEntryBuilder::default()
        .with_project_name(name)
        .with_db_path("/work/p/.todos/project.db")
        .with_port(8070)
        .with_pid(4242)
        .with_started_at(started)
        .build()
        .unwrap();
    let mut row = DashboardRow::from_entry(&entry, started + chrono::Duration::seconds(125));
    row.status = status;
    row
}

#[test]
fn given_entry_when_row_built_then_carries_url_and_uptime() {
    let row = row("acme", InstanceStatus::Running);

    assert_eq!(row.url, "http://localhost:8070");
    assert_eq!(row.uptime, "2m");
    assert_eq!(row.uptime_seconds, 125);
    assert_eq!(row.db_path, "/work/p/.todos/project.db");
}

#[test]
fn given_no_rows_when_rendering_page_then_shows_empty_message_and_refresh() {
    let page = render_page(&[], Duration::from_secs(5), 8069);

    assert!(page.contains("http-equiv=\"refresh\" content=\"5\""));
    assert!(page.contains("No TodoTracker servers are running."));
}

/// **VALUE**: Project names are escaped before they reach the page.
///
/// **BUG THIS CATCHES**: Would catch a project named `<script>` from a
/// `.todos/config.json` injecting markup into the dashboard.
#[test]
fn given_markup_in_project_name_when_rendering_page_then_escapes_it() {
    let rows = vec![row("<script>x</script>", InstanceStatus::Unresponsive)];

    let page = render_page(&rows, Duration::from_secs(5), 8069);

    assert!(page.contains("&lt;script&gt;x&lt;/script&gt;"));
    assert!(!page.contains("<script>"));
    assert!(page.contains("unresponsive"));
}

/// **VALUE**: Every character with meaning in markup or a quoted attribute is
/// escaped; everything else passes through.
#[test]
fn given_special_characters_when_escaping_html_then_each_is_replaced() {
    assert_eq!(
        escape_html(r#"<a href="x">Tom & Jerry's</a>"#),
        "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;"
    );
    assert_eq!(escape_html("plain/path-ü"), "plain/path-ü");
}
