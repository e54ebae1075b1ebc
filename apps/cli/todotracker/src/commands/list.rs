use crate::context::AppContext;
use crate::error::TodotrackerError;
use crate::output::{Format, print_rows};

use registry_core::Dashboard;
use registry_core::dashboard::mark_unresponsive;

use chrono::Utc;
use tokio::task::spawn_blocking;

/// Print live servers. Dead entries are swept on the way.
pub async fn run(ctx: &AppContext, format: Format) -> Result<(), TodotrackerError> {
    let dashboard = Dashboard::new(ctx.store.clone(), &ctx.config);
    let mut rows = spawn_blocking(move || dashboard.rows(Utc::now()))
        .await
        .map_err(TodotrackerError::task)??;

    mark_unresponsive(&mut rows).await;
    print_rows(&rows, format)
}
