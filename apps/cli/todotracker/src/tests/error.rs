// Unit tests for error module
// Tests the single-line report shown to users

use crate::error::TodotrackerError;

use registry_core::error::{LifecycleError, RegistryError};

use common::{ErrorLocation, Remedy};

use std::panic::Location;
use std::path::PathBuf;
use std::time::Duration;

/// **VALUE**: Fatal errors print as `error: <what> | remedy: <how>` on one line.
///
/// **WHY THIS MATTERS**: Wrappers that launch `todotracker serve` surface only the
/// first stderr line to the user.
///
/// **BUG THIS CATCHES**: Would catch the remedy being dropped when a core error is
/// wrapped, or a newline sneaking into the Display impl.
#[test]
fn given_core_error_when_reported_then_single_line_with_inner_remedy() {
    // GIVEN: A lock timeout from the registry
    let err = TodotrackerError::from(RegistryError::LockTimeout {
        location: ErrorLocation::from(Location::caller()),
        path: PathBuf::from("/home/u/.todotracker/servers.lock"),
        waited: Duration::from_secs(10),
    });

    // WHEN
    let line = err.report_line();

    // THEN
    assert!(line.starts_with("error: Registry Lock Timeout Error:"));
    assert!(line.contains(" | remedy: "));
    assert!(line.ends_with(err.remedy()));
    assert!(err.remedy().contains("stale lock file"));
    assert!(!line.contains('\n'));
}

#[test]
fn given_port_exhausted_when_reported_then_names_range() {
    let err = TodotrackerError::from(LifecycleError::PortExhausted {
        first: 8070,
        last: 8169,
        location: ErrorLocation::from(Location::caller()),
    });

    let line = err.report_line();

    assert!(line.contains("8070-8169"));
    assert!(line.contains("port_range"));
}

#[test]
fn given_io_error_when_built_then_keeps_source() {
    let err = TodotrackerError::io(
        "Failed to bind port 8070",
        std::io::Error::from(std::io::ErrorKind::AddrInUse),
    );

    assert!(err.to_string().starts_with("IO Error: Failed to bind port 8070"));
    assert!(std::error::Error::source(&err).is_some());
}
