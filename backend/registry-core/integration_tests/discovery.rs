use crate::helpers::LiveProcess;

use registry_core::discovery::health::check_health;
use registry_core::discovery::port::{PortOwner, port_owner};
use registry_core::discovery::process::{is_alive, stop_pid};
use registry_core::{BindProbe, PortProbe};

use std::net::TcpListener;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ----------------------------------------------------------------------------
// BindProbe
// ----------------------------------------------------------------------------

/// **VALUE**: A port bound on the wildcard address reads as occupied.
///
/// **BUG THIS CATCHES**: Would catch "address in use" being reported as a hard
/// error, which would abort allocation instead of moving to the next port.
#[test]
fn given_bound_port_when_probed_then_not_free() {
    // GIVEN: We hold a listener on an ephemeral port
    let listener = TcpListener::bind("0.0.0.0:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    // WHEN / THEN
    assert!(!BindProbe.is_free(port).unwrap());

    // AND: Once released it is free again
    drop(listener);
    assert!(BindProbe.is_free(port).unwrap());
}

#[test]
fn given_bound_port_when_port_owner_queried_then_never_errors() {
    let listener = TcpListener::bind("0.0.0.0:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let owner = port_owner(port).unwrap();

    // Socket-to-pid mapping may be hidden in restricted containers.
    if let Some(owner) = owner {
        assert_eq!(owner.pid, std::process::id());
    }
}

#[test]
fn given_owner_with_binary_in_command_when_checked_then_is_todotracker() {
    let owner = PortOwner {
        pid: 42,
        name: String::from("todotracker"),
        command: String::from("/usr/local/bin/todotracker dashboard"),
    };
    let stranger = PortOwner {
        pid: 43,
        name: String::from("nginx"),
        command: String::from("nginx -g daemon off;"),
    };

    assert!(owner.is_todotracker("todotracker"));
    assert!(!stranger.is_todotracker("todotracker"));
    assert_eq!(owner.to_string(), "todotracker (PID 42)");
}

// ----------------------------------------------------------------------------
// Liveness and stop_pid()
// ----------------------------------------------------------------------------

#[test]
fn given_own_pid_when_is_alive_then_true() {
    assert!(is_alive(std::process::id()));
    assert!(!is_alive(0));
    assert!(!is_alive(u32::MAX));
}

#[test]
fn given_nonexistent_pid_when_stop_pid_called_then_returns_false() {
    assert!(!stop_pid(u32::MAX));
}

/// **VALUE**: Prevents taking down init by refusing PID 1.
///
/// **BUG THIS CATCHES**: Would catch the guard being removed, turning a corrupt
/// port-owner lookup into an attempt to kill the whole system.
#[test]
fn given_pid_1_when_stop_pid_called_then_refuses_and_returns_false() {
    assert!(!stop_pid(1));
}

#[test]
fn given_own_pid_when_stop_pid_called_then_refuses_and_returns_false() {
    assert!(!stop_pid(std::process::id()));
    assert!(is_alive(std::process::id()));
}

/// **VALUE**: A live child is terminated and observed as gone.
///
/// **WHY THIS MATTERS**: Dashboard takeover relies on `stop_pid` returning only
/// after the old dashboard released its port.
#[test]
fn given_live_child_when_stop_pid_called_then_terminates_it() {
    // GIVEN
    let child = LiveProcess::spawn();
    assert!(is_alive(child.pid()));

    // WHEN
    let stopped = stop_pid(child.pid());

    // THEN: Gone, or at worst a zombie awaiting our reap
    assert!(stopped);
    assert!(!is_alive(child.pid()));
}

// ----------------------------------------------------------------------------
// check_health()
// ----------------------------------------------------------------------------

#[tokio::test]
async fn given_healthy_server_when_check_health_called_then_returns_true() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    // WHEN / THEN
    assert!(check_health(&server.uri()).await);
}

#[tokio::test]
async fn given_failing_server_when_check_health_called_then_returns_false() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    assert!(!check_health(&server.uri()).await);
}

#[tokio::test]
async fn given_unreachable_port_when_check_health_called_then_returns_false() {
    let vacant = {
        let probe = TcpListener::bind("127.0.0.1:0").unwrap();
        probe.local_addr().unwrap().port()
    };

    assert!(!check_health(&format!("http://127.0.0.1:{vacant}")).await);
}

#[tokio::test]
async fn given_malformed_url_when_check_health_called_then_returns_false() {
    assert!(!check_health("not-a-valid-url").await);
    assert!(!check_health("").await);
}
