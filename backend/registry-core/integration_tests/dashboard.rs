use crate::helpers::{LiveProcess, TestHome, dead_pid, default_config, entry};

use registry_core::dashboard::server::{DashboardState, router};
use registry_core::{Dashboard, InstanceStatus};

use std::time::Duration;

use chrono::Utc;
use tokio::net::TcpListener;

/// **VALUE**: Rows list only live servers, sorted by port.
///
/// **WHY THIS MATTERS**: The dashboard is how users find which port belongs to
/// which project; stale rows send them to dead ports.
#[test]
fn given_mixed_entries_when_rows_requested_then_live_rows_sorted_by_port() {
    // GIVEN: Two live entries out of order and one dead one
    let home = TestHome::new();
    let a = LiveProcess::spawn();
    let b = LiveProcess::spawn();
    home.seed(vec![
        entry("beta", 8075, b.pid()),
        entry("ghost", 8071, dead_pid()),
        entry("alpha", 8072, a.pid()),
    ]);
    let dashboard = Dashboard::new(home.store(), &default_config());

    // WHEN
    let rows = dashboard.rows(Utc::now()).unwrap();

    // THEN
    let ports: Vec<u16> = rows.iter().map(|r| r.port).collect();
    assert_eq!(ports, vec![8072, 8075]);
    assert_eq!(rows[0].project_name, "alpha");
    assert_eq!(rows[0].url, "http://localhost:8072");
    assert!(rows.iter().all(|r| r.status == InstanceStatus::Running));

    // AND: The sweep was persisted
    assert_eq!(home.store().load().unwrap().len(), 2);
}

/// **VALUE**: An entry claiming the dashboard's own port is evicted on refresh.
///
/// **BUG THIS CATCHES**: Would catch an older build that registered the dashboard
/// itself as a project server leaving a row that can never be opened.
#[test]
fn given_entry_on_dashboard_port_when_refreshed_then_evicted() {
    let home = TestHome::new();
    home.seed(vec![
        entry("dash", 8069, std::process::id()),
        entry("alpha", 8070, std::process::id()),
    ]);
    let dashboard = Dashboard::new(home.store(), &default_config());

    let survivors = dashboard.refresh().unwrap();

    assert_eq!(survivors.len(), 1);
    assert_eq!(survivors.servers[0].port, 8070);
    assert!(home.store().load().unwrap().find_by_pid(std::process::id()).is_some());
}

#[test]
fn given_dead_entries_when_cleanup_then_reports_removed_and_active() {
    let home = TestHome::new();
    home.seed(vec![
        entry("ghost-a", 8071, dead_pid()),
        entry("ghost-b", 8072, dead_pid()),
        entry("alpha", 8073, std::process::id()),
    ]);
    let dashboard = Dashboard::new(home.store(), &default_config());

    let report = dashboard.cleanup().unwrap();

    assert_eq!(report.removed, 2);
    assert_eq!(report.active, 1);
    assert_eq!(dashboard.cleanup().unwrap().removed, 0);
}

async fn spawn_dashboard(home: &TestHome, probe_health: bool) -> String {
    let dashboard = Dashboard::new(home.store(), &default_config());
    let mut state = DashboardState::new(dashboard, Duration::from_secs(5));
    if !probe_health {
        state = state.without_health_probe();
    }

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });

    format!("http://{address}")
}

#[tokio::test]
async fn given_running_dashboard_when_health_requested_then_reports_service() {
    let home = TestHome::new();
    let base = spawn_dashboard(&home, false).await;

    let body: serde_json::Value = reqwest::get(format!("{base}/api/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "todotracker-dashboard");
    assert_eq!(body["port"], 8069);
}

#[tokio::test]
async fn given_live_entry_when_servers_requested_then_returns_json_rows() {
    let home = TestHome::new();
    home.seed(vec![entry("alpha", 8070, std::process::id())]);
    let base = spawn_dashboard(&home, false).await;

    let rows: serde_json::Value = reqwest::get(format!("{base}/api/servers"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(rows.as_array().unwrap().len(), 1);
    assert_eq!(rows[0]["project_name"], "alpha");
    assert_eq!(rows[0]["port"], 8070);
    assert_eq!(rows[0]["status"], "running");
}

/// **VALUE**: A live pid whose port does not answer is flagged unresponsive.
///
/// **WHY THIS MATTERS**: A hung server keeps its pid alive, so the sweep will
/// never remove it; the status column is the only signal the user gets.
#[tokio::test]
async fn given_live_pid_without_listener_when_servers_requested_then_unresponsive() {
    // GIVEN: Our pid, on a port where nothing listens
    let home = TestHome::new();
    let vacant = {
        let probe = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        probe.local_addr().unwrap().port()
    };
    home.seed(vec![entry("alpha", vacant, std::process::id())]);
    let base = spawn_dashboard(&home, true).await;

    // WHEN
    let rows: serde_json::Value = reqwest::get(format!("{base}/api/servers"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // THEN
    assert_eq!(rows[0]["status"], "unresponsive");
}

#[tokio::test]
async fn given_dead_entry_when_cleanup_posted_then_reports_counts() {
    let home = TestHome::new();
    home.seed(vec![
        entry("ghost", 8071, dead_pid()),
        entry("alpha", 8072, std::process::id()),
    ]);
    let base = spawn_dashboard(&home, false).await;

    let body: serde_json::Value = reqwest::Client::new()
        .post(format!("{base}/api/cleanup"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["removed"], 1);
    assert_eq!(body["active_servers"], 1);
    assert!(body["message"].as_str().unwrap().contains("Removed 1"));
}

#[tokio::test]
async fn given_live_entry_when_index_requested_then_renders_table() {
    let home = TestHome::new();
    home.seed(vec![entry("alpha", 8070, std::process::id())]);
    let base = spawn_dashboard(&home, false).await;

    let response = reqwest::get(format!("{base}/")).await.unwrap();
    assert!(response.status().is_success());
    let page = response.text().await.unwrap();

    assert!(page.contains("<table>"));
    assert!(page.contains("alpha"));
    assert!(page.contains("http://localhost:8070"));
}
