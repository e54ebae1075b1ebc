use registry_core::error::{
    CoreError, DashboardError, IdentityError, LifecycleError, RegistryError,
};

use common::{ErrorLocation, Remedy};

use std::panic::Location;
use std::path::PathBuf;
use std::time::Duration;

fn here() -> ErrorLocation {
    ErrorLocation::from(Location::caller())
}

/// **VALUE**: Errors render as one line: kind, detail, then location.
///
/// **WHY THIS MATTERS**: The binary prints `error: <display> | remedy: <remedy>`
/// on a single line; a multi-line message would break that contract.
#[test]
fn given_lock_timeout_when_displayed_then_single_line_with_location() {
    // GIVEN
    let error = RegistryError::LockTimeout {
        location: here(),
        path: PathBuf::from("/home/u/.todotracker/servers.lock"),
        waited: Duration::from_secs(10),
    };

    // WHEN
    let message = error.to_string();

    // THEN
    assert!(message.starts_with("Registry Lock Timeout Error: /home/u/.todotracker/servers.lock"));
    assert!(message.contains("10s"));
    assert!(message.ends_with(']'));
    assert!(!message.contains('\n'));
}

#[test]
fn given_lock_timeout_when_remedy_requested_then_mentions_stale_lock() {
    let error = RegistryError::LockTimeout {
        location: here(),
        path: PathBuf::from("servers.lock"),
        waited: Duration::from_secs(10),
    };

    assert!(error.remedy().contains("stale lock file"));
    assert!(error.is_transient());
}

#[test]
fn given_port_exhausted_when_displayed_then_names_range_and_remedy() {
    let error = LifecycleError::PortExhausted {
        first: 8070,
        last: 8169,
        location: here(),
    };

    assert!(error.to_string().contains("8070-8169"));
    assert!(error.remedy().contains("port_range"));
    assert!(!error.is_transient());
}

/// **BUG THIS CATCHES**: Would catch `CoreError` losing the inner remedy and
/// falling back to a generic one.
#[test]
fn given_wrapped_errors_when_remedy_requested_then_delegates_to_inner() {
    let identity = CoreError::from(IdentityError::DatabaseNotFound {
        start: PathBuf::from("/tmp"),
        location: here(),
    });
    let dashboard = CoreError::from(DashboardError::from(RegistryError::Serialize {
        location: here(),
        reason: String::from("bad"),
    }));

    assert!(identity.remedy().contains("--db-path"));
    assert!(dashboard.remedy().contains("servers.json"));
}

#[test]
fn given_transient_registry_error_inside_lifecycle_when_checked_then_transient() {
    let error = LifecycleError::from(RegistryError::Write {
        location: here(),
        path: PathBuf::from("servers.json"),
        source: std::io::Error::other("disk full"),
    });

    assert!(error.is_transient());
}
