use crate::context::AppContext;
use crate::error::TodotrackerError;
use crate::shutdown::ShutdownSignal;

use registry_core::dashboard::server::{self, DashboardState};
use registry_core::{BindProbe, Dashboard, TODOTRACKER_BASE_URL};

use log::info;
use tokio::task::spawn_blocking;

/// Run the dashboard until Ctrl-C or SIGTERM.
///
/// A previous dashboard still holding the port is stopped first. The
/// dashboard never records itself in the registry.
pub async fn run(ctx: &AppContext) -> Result<(), TodotrackerError> {
    let shutdown = ShutdownSignal::install()?;
    let dashboard = Dashboard::new(ctx.store.clone(), &ctx.config);
    let port = dashboard.dashboard_port();

    let claimer = dashboard.clone();
    spawn_blocking(move || claimer.claim_port(&BindProbe))
        .await
        .map_err(TodotrackerError::task)??;

    let refresher = dashboard.clone();
    let survivors = spawn_blocking(move || refresher.refresh())
        .await
        .map_err(TodotrackerError::task)??;

    let listener = server::bind(port).await?;
    println!(
        "TodoTracker dashboard running at {TODOTRACKER_BASE_URL}:{port} ({} active server(s))",
        survivors.len()
    );

    let state = DashboardState::new(dashboard, ctx.config.dashboard_poll());
    server::serve(listener, state, shutdown.recv()).await?;

    info!("Dashboard stopped");
    Ok(())
}
