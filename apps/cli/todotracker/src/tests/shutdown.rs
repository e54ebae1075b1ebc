// Unit tests for shutdown signal installation

use crate::shutdown::ShutdownSignal;

use std::process::Command;
use std::time::Duration;

/// **VALUE**: A SIGTERM delivered after install but before anyone awaits the
/// signal is not lost.
///
/// **WHY THIS MATTERS**: `serve` installs the handlers before registering and only
/// starts waiting once the server is bound. A SIGTERM in between must still end in
/// a graceful shutdown that removes the registry entry, not in the default
/// disposition killing the process.
///
/// **BUG THIS CATCHES**: Would catch handlers being installed lazily on first poll.
#[tokio::test]
async fn given_installed_signal_when_sigterm_arrives_before_waiting_then_recv_resolves() {
    // GIVEN: Handlers installed, nobody waiting yet
    let shutdown = ShutdownSignal::install().unwrap();

    // WHEN: SIGTERM reaches this process before recv() is polled
    let status = Command::new("kill")
        .args(["-TERM", &std::process::id().to_string()])
        .status()
        .unwrap();
    assert!(status.success());
    tokio::time::sleep(Duration::from_millis(100)).await;

    // THEN: The pending signal completes recv()
    let received = tokio::time::timeout(Duration::from_secs(5), shutdown.recv()).await;
    assert!(received.is_ok(), "recv() should resolve on the buffered SIGTERM");
}
