//! Logging for the todotracker binary.
//!
//! Provides dual output (stderr with colors + file) with thread-safe initialization.
//! Stdout is left to command output so `list --format json` stays parseable.

use crate::error::TodotrackerError;

use common::ErrorLocation;

use std::io::stderr;
use std::path::Path;
use std::sync::Once;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use fern::Dispatch;
use fern::colors::Color::{Blue, Green, Magenta, Red, Yellow};
use fern::colors::ColoredLevelConfig;
use humantime::format_rfc3339;
use log::{LevelFilter, debug, warn};

/// Thread-safe initialization guard.
static INIT_LOGGER_ONCE: Once = Once::new();

/// Tracks if logger initialization was already attempted.
static LOGGER_ALREADY_CALLED: AtomicBool = AtomicBool::new(false);

pub const LOG_FILE_NAME: &str = "todotracker.log";

/// Log target written to the file only. Fatal errors use it because the
/// user already sees them as the single `error: ... | remedy: ...` line.
pub const FILE_ONLY_TARGET: &str = "todotracker::file_only";

const LOGGER_INITIALIZED_MESSAGE_PREFIX: &str = "Logger initialized with level: ";

const LOGGER_ALREADY_INITIALIZED_MESSAGE: &str = "Logger already initialized";

/// Verbosity chosen on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogLevels {
    /// Level written to the log file.
    pub file: LevelFilter,
    /// Level echoed to stderr.
    pub console: LevelFilter,
}

impl LogLevels {
    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            Self {
                file: LevelFilter::Debug,
                console: LevelFilter::Debug,
            }
        } else {
            Self {
                file: LevelFilter::Info,
                console: LevelFilter::Warn,
            }
        }
    }
}

/// Initialize the logger with dual output (stderr + file).
///
/// Safe to call multiple times. Subsequent calls log a warning and return Ok.
///
/// # Errors
///
/// Returns an error if the log file cannot be created or the dispatch fails to apply.
pub fn initialize(log_dir: &Path, levels: LogLevels) -> Result<(), TodotrackerError> {
    if LOGGER_ALREADY_CALLED.swap(true, Ordering::SeqCst) {
        warn!("{LOGGER_ALREADY_INITIALIZED_MESSAGE}");
        return Ok(());
    }

    let mut result = Ok(());

    INIT_LOGGER_ONCE.call_once(|| {
        result = initialize_internal(log_dir, levels);
        if result.is_ok() {
            debug!("{LOGGER_INITIALIZED_MESSAGE_PREFIX}{:?}", levels.file);
        }
    });

    result
}

#[track_caller]
fn initialize_internal(log_dir: &Path, levels: LogLevels) -> Result<(), TodotrackerError> {
    let log_file_path = log_dir.join(LOG_FILE_NAME);

    let color_configuration = ColoredLevelConfig::new()
        .debug(Blue)
        .info(Green)
        .warn(Yellow)
        .error(Red)
        .trace(Magenta);

    let base_dispatch = Dispatch::new().level(levels.file.max(levels.console));

    let console_dispatch = Dispatch::new()
        .level(levels.console)
        .filter(|metadata| metadata.target() != FILE_ONLY_TARGET)
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{date} - {level}] {message} [{file}:{line}]",
                date = format_rfc3339(SystemTime::now()),
                level = color_configuration.color(record.level()),
                message = message,
                file = record.file().unwrap_or("unknown"),
                line = record.line().unwrap_or(0),
            ))
        })
        .chain(stderr());

    let file_dispatch = Dispatch::new()
        .level(levels.file)
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{date} - {level}] [pid {pid}] {message} [{file}:{line}]",
                date = format_rfc3339(SystemTime::now()),
                level = record.level(),
                pid = std::process::id(),
                message = message,
                file = record.file().unwrap_or("unknown"),
                line = record.line().unwrap_or(0)
            ))
        })
        .chain(
            fern::log_file(&log_file_path).map_err(|e| TodotrackerError::Logger {
                message: format!("Failed to create log file: {e}"),
                location: ErrorLocation::from(std::panic::Location::caller()),
            })?,
        );

    base_dispatch
        .chain(console_dispatch)
        .chain(file_dispatch)
        .apply()
        .map_err(|e| TodotrackerError::Logger {
            message: format!("Failed to initialize logger: {e}"),
            location: ErrorLocation::from(std::panic::Location::caller()),
        })?;

    Ok(())
}
