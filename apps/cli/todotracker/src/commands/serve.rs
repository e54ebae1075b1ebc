use crate::context::AppContext;
use crate::error::TodotrackerError;
use crate::shutdown::ShutdownSignal;

use registry_core::error::IdentityError;
use registry_core::{
    BIND_ADDRESS, HEALTH_ENDPOINT, Heartbeat, ProjectIdentity, ServerLifecycle, StartOutcome,
    TODOTRACKER_BINARY, TODOTRACKER_HOSTNAME,
};

use common::ErrorLocation;
use models::ServerEntry;

use std::panic::Location;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::response::Json;
use axum::routing::get;
use clap::Args;
use log::{debug, info, warn};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::task::{JoinHandle, spawn_blocking};
use tokio::time::{MissedTickBehavior, interval};

#[derive(Debug, Clone, Default, Args)]
pub struct ServeArgs {
    /// Project database (defaults to TODOTRACKER_DB_PATH, then the nearest .todos/project.db)
    #[arg(long)]
    pub db_path: Option<PathBuf>,
    /// Display name (defaults to TODOTRACKER_PROJECT_NAME, then .todos/config.json, then the directory name)
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProjectHealth {
    pub status: &'static str,
    pub service: &'static str,
    pub project_name: String,
    pub db_path: String,
    pub port: u16,
    pub pid: u32,
}

/// Register this process for the resolved project and serve until shutdown.
///
/// If a live server already serves the same database, prints its URL and
/// returns without binding anything.
pub async fn run(ctx: &AppContext, args: ServeArgs) -> Result<(), TodotrackerError> {
    let cwd = std::env::current_dir().map_err(|e| IdentityError::CurrentDir {
        location: ErrorLocation::from(Location::caller()),
        source: e,
    })?;
    let identity =
        ProjectIdentity::resolve(args.db_path.as_deref(), args.name.as_deref(), &cwd)?;

    // Before registering, so a SIGTERM during startup still deregisters.
    let shutdown = ShutdownSignal::install()?;

    let lifecycle = ServerLifecycle::new(ctx.store.clone(), &ctx.config);
    let pid = std::process::id();
    let outcome = spawn_blocking(move || lifecycle.start(&identity, pid))
        .await
        .map_err(TodotrackerError::task)??;

    let registration = match outcome {
        StartOutcome::ReusingExisting(existing) => {
            println!(
                "TodoTracker is already running for {} at {} (PID {})",
                existing.project_name,
                existing.url(TODOTRACKER_HOSTNAME),
                existing.pid
            );
            return Ok(());
        }
        StartOutcome::Registered(registration) => registration,
    };

    // Dropping the registration on any early return below deregisters it.
    let entry = registration.entry().clone();
    let listener = TcpListener::bind((BIND_ADDRESS, entry.port))
        .await
        .map_err(|e| TodotrackerError::io(format!("Failed to bind port {}", entry.port), e))?;

    println!(
        "TodoTracker server for {} running at {}",
        entry.project_name,
        entry.url(TODOTRACKER_HOSTNAME)
    );

    let heartbeat = spawn_heartbeat(registration.heartbeat(), ctx.config.heartbeat_interval());

    let served = axum::serve(listener, project_router(entry))
        .with_graceful_shutdown(shutdown.recv())
        .await;

    heartbeat.abort();

    let removed = spawn_blocking(move || registration.release())
        .await
        .map_err(TodotrackerError::task)??;
    info!("Deregistered {removed} registry entries");

    served.map_err(|e| TodotrackerError::io("Server stopped unexpectedly", e))
}

pub fn project_router(entry: ServerEntry) -> Router {
    Router::new()
        .route("/", get(landing))
        .route(HEALTH_ENDPOINT, get(health))
        .with_state(Arc::new(entry))
}

async fn landing(State(entry): State<Arc<ServerEntry>>) -> String {
    format!(
        "TodoTracker server for {} ({})\n",
        entry.project_name,
        entry.db_path.display()
    )
}

async fn health(State(entry): State<Arc<ServerEntry>>) -> Json<ProjectHealth> {
    Json(ProjectHealth {
        status: "ok",
        service: TODOTRACKER_BINARY,
        project_name: entry.project_name.clone(),
        db_path: entry.db_path.display().to_string(),
        port: entry.port,
        pid: entry.pid,
    })
}

fn spawn_heartbeat(heartbeat: Heartbeat, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately; registration already stamped the entry.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let beat = heartbeat.clone();
            match spawn_blocking(move || beat.beat()).await {
                Ok(Ok(true)) => debug!("Heartbeat recorded"),
                Ok(Ok(false)) => {}
                Ok(Err(e)) => warn!("Heartbeat failed: {e}"),
                Err(e) => warn!("Heartbeat task failed: {e}"),
            }
        }
    })
}
