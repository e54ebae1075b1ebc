use crate::dashboard::{Dashboard, DashboardRow, InstanceStatus, mark_unresponsive};
use crate::error::DashboardError;
use crate::{BIND_ADDRESS, HEALTH_ENDPOINT};

use common::{ErrorLocation, Remedy};

use std::fmt::Write as _;
use std::future::Future;
use std::panic::Location;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::get;
use chrono::Utc;
use log::{error, info};
use serde::Serialize;
use tokio::net::TcpListener;

pub const DASHBOARD_SERVICE: &str = "todotracker-dashboard";

#[derive(Clone)]
pub struct DashboardState {
    dashboard: Arc<Dashboard>,
    poll_interval: Duration,
    probe_health: bool,
}

impl DashboardState {
    pub fn new(dashboard: Dashboard, poll_interval: Duration) -> Self {
        Self {
            dashboard: Arc::new(dashboard),
            poll_interval,
            probe_health: true,
        }
    }

    /// Skip the per-server HTTP health probe; every live pid reads as running.
    pub fn without_health_probe(mut self) -> Self {
        self.probe_health = false;
        self
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub port: u16,
}

#[derive(Debug, Serialize)]
pub struct CleanupResponse {
    pub message: String,
    pub removed: usize,
    pub active_servers: usize,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    remedy: &'static str,
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        error!("Dashboard request failed: {self}");
        let body = ErrorBody {
            error: self.to_string(),
            remedy: self.remedy(),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

pub fn router(state: DashboardState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/servers", get(list_servers))
        .route("/api/cleanup", get(cleanup).post(cleanup))
        .route(HEALTH_ENDPOINT, get(health))
        .with_state(state)
}

pub async fn bind(port: u16) -> Result<TcpListener, DashboardError> {
    TcpListener::bind((BIND_ADDRESS, port))
        .await
        .map_err(|e| DashboardError::Bind {
            address: format!("{BIND_ADDRESS}:{port}"),
            location: ErrorLocation::from(Location::caller()),
            source: e,
        })
}

/// Serve the dashboard on `listener` until `shutdown` resolves.
pub async fn serve<F>(
    listener: TcpListener,
    state: DashboardState,
    shutdown: F,
) -> Result<(), DashboardError>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(address) = listener.local_addr() {
        info!("Dashboard listening on http://{address}");
    }

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| DashboardError::Serve {
            location: ErrorLocation::from(Location::caller()),
            source: e,
        })
}

async fn index(State(state): State<DashboardState>) -> Result<Html<String>, DashboardError> {
    let rows = load_rows(&state).await?;
    Ok(Html(render_page(
        &rows,
        state.poll_interval,
        state.dashboard.dashboard_port(),
    )))
}

async fn list_servers(
    State(state): State<DashboardState>,
) -> Result<Json<Vec<DashboardRow>>, DashboardError> {
    load_rows(&state).await.map(Json)
}

async fn cleanup(
    State(state): State<DashboardState>,
) -> Result<Json<CleanupResponse>, DashboardError> {
    let dashboard = Arc::clone(&state.dashboard);
    let report = tokio::task::spawn_blocking(move || dashboard.cleanup())
        .await
        .map_err(|e| DashboardError::Task {
            message: e.to_string(),
            location: ErrorLocation::from(Location::caller()),
        })??;

    Ok(Json(CleanupResponse {
        message: format!("Removed {} stale entries", report.removed),
        removed: report.removed,
        active_servers: report.active,
    }))
}

async fn health(State(state): State<DashboardState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: DASHBOARD_SERVICE,
        port: state.dashboard.dashboard_port(),
    })
}

async fn load_rows(state: &DashboardState) -> Result<Vec<DashboardRow>, DashboardError> {
    let dashboard = Arc::clone(&state.dashboard);
    let mut rows = tokio::task::spawn_blocking(move || dashboard.rows(Utc::now()))
        .await
        .map_err(|e| DashboardError::Task {
            message: e.to_string(),
            location: ErrorLocation::from(Location::caller()),
        })??;

    if state.probe_health {
        mark_unresponsive(&mut rows).await;
    }

    Ok(rows)
}

pub fn render_page(rows: &[DashboardRow], poll_interval: Duration, dashboard_port: u16) -> String {
    let mut page = String::new();

    let _ = write!(
        page,
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <meta http-equiv=\"refresh\" content=\"{}\">\n\
         <title>TodoTracker Dashboard</title>\n</head>\n<body>\n\
         <h1>TodoTracker Dashboard</h1>\n\
         <p>{} active server(s) &middot; dashboard port {dashboard_port}</p>\n",
        poll_interval.as_secs().max(1),
        rows.len()
    );

    if rows.is_empty() {
        page.push_str("<p>No TodoTracker servers are running.</p>\n");
    } else {
        page.push_str(
            "<table>\n<tr><th>Project</th><th>Port</th><th>PID</th><th>Uptime</th>\
             <th>Status</th><th>Database</th></tr>\n",
        );
        for row in rows {
            let status = match row.status {
                InstanceStatus::Running => "running",
                InstanceStatus::Unresponsive => "unresponsive",
            };
            let _ = writeln!(
                page,
                "<tr><td><a href=\"{url}\">{name}</a></td><td>{port}</td><td>{pid}</td>\
                 <td>{uptime}</td><td>{status}</td><td>{db}</td></tr>",
                url = escape_html(&row.url),
                name = escape_html(&row.project_name),
                port = row.port,
                pid = row.pid,
                uptime = escape_html(&row.uptime),
                db = escape_html(&row.db_path),
            );
        }
        page.push_str("</table>\n");
    }

    page.push_str("</body>\n</html>\n");
    page
}

/// Escapes `&`, `<`, `>`, `"` and `'`; enough for text nodes and quoted
/// attribute values.
pub(crate) fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}
