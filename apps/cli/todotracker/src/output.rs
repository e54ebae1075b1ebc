use crate::error::TodotrackerError;

use registry_core::{CleanupReport, DashboardRow, InstanceStatus};

use common::ErrorLocation;

use std::panic::Location;

use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Json,
    Pretty,
}

pub const NO_SERVERS_MESSAGE: &str = "No TodoTracker servers are running.";

#[track_caller]
pub fn print_rows(rows: &[DashboardRow], format: Format) -> Result<(), TodotrackerError> {
    match format {
        Format::Json => {
            let json = serde_json::to_string_pretty(rows).map_err(|e| TodotrackerError::Output {
                message: format!("Failed to serialize servers: {e}"),
                location: ErrorLocation::from(Location::caller()),
            })?;
            println!("{json}");
        }
        Format::Pretty => print!("{}", format_rows(rows)),
    }
    Ok(())
}

/// Fixed-width table, one server per line.
pub fn format_rows(rows: &[DashboardRow]) -> String {
    if rows.is_empty() {
        return format!("{NO_SERVERS_MESSAGE}\n");
    }

    let name_width = rows
        .iter()
        .map(|r| r.project_name.chars().count())
        .max()
        .unwrap_or(0)
        .max("PROJECT".len());

    let mut out = format!(
        "{:<name_width$}  {:>5}  {:>7}  {:>7}  {:<12}  {}\n",
        "PROJECT", "PORT", "PID", "UPTIME", "STATUS", "URL"
    );
    for row in rows {
        let status = match row.status {
            InstanceStatus::Running => "running",
            InstanceStatus::Unresponsive => "unresponsive",
        };
        out.push_str(&format!(
            "{:<name_width$}  {:>5}  {:>7}  {:>7}  {:<12}  {}\n",
            row.project_name, row.port, row.pid, row.uptime, status, row.url
        ));
    }
    out
}

pub fn format_cleanup(report: &CleanupReport) -> String {
    let noun = if report.removed == 1 { "entry" } else { "entries" };
    format!(
        "Removed {} stale {noun}; {} active server(s)",
        report.removed, report.active
    )
}
