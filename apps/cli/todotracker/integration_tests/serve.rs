use crate::helpers::{project, read_registry, todotracker, write_config};

use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::sleep;
use std::time::{Duration, Instant};

const STARTUP_TIMEOUT: Duration = Duration::from_secs(20);

struct ServerProcess(Child);

impl Drop for ServerProcess {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

fn wait_for_entry(home: &Path, pid: u32) -> serde_json::Value {
    let deadline = Instant::now() + STARTUP_TIMEOUT;
    loop {
        let registry = read_registry(home);
        if let Some(entry) = registry["servers"]
            .as_array()
            .and_then(|servers| servers.iter().find(|s| s["pid"] == pid))
        {
            return entry.clone();
        }
        assert!(Instant::now() < deadline, "server never registered");
        sleep(Duration::from_millis(100));
    }
}

fn terminate(pid: u32) {
    let status = Command::new("kill")
        .args(["-TERM", &pid.to_string()])
        .status()
        .unwrap();
    assert!(status.success(), "kill -TERM {pid} failed");
}

fn wait_for_exit(server: &mut ServerProcess) -> ExitStatus {
    let deadline = Instant::now() + STARTUP_TIMEOUT;
    loop {
        if let Some(status) = server.0.try_wait().unwrap() {
            return status;
        }
        assert!(Instant::now() < deadline, "server never exited");
        sleep(Duration::from_millis(50));
    }
}

async fn wait_for_health(port: u64) -> serde_json::Value {
    let deadline = Instant::now() + STARTUP_TIMEOUT;
    loop {
        if let Ok(response) = reqwest::get(format!("http://127.0.0.1:{port}/api/health")).await
            && response.status().is_success()
        {
            return response.json().await.unwrap();
        }
        assert!(Instant::now() < deadline, "server never became healthy");
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

/// **VALUE**: End to end: a started server registers, answers health checks, and a
/// crashed one is cleaned up by the next maintenance run.
///
/// **WHY THIS MATTERS**: SIGKILL skips every shutdown hook. Recovery from it is the
/// main reason the registry sweeps by pid liveness.
#[tokio::test]
async fn given_serve_when_killed_then_cleanup_removes_its_entry() {
    // GIVEN: A home with a port range well away from common services
    let home = tempfile::tempdir().unwrap();
    write_config(home.path(), 47_310, 40);
    let (_tmp, db) = project("acme");

    // WHEN: The server starts
    let child = todotracker(home.path())
        .args(["serve", "--name", "Acme", "--db-path"])
        .arg(&db)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();
    let server = ServerProcess(child);
    let pid = server.0.id();

    // THEN: It is registered in range and reports its project on /api/health
    let entry = wait_for_entry(home.path(), pid);
    let port = entry["port"].as_u64().unwrap();
    assert!((47_311..=47_350).contains(&port));
    assert_eq!(entry["project_name"], "Acme");

    let health = wait_for_health(port).await;
    assert_eq!(health["status"], "ok");
    assert_eq!(health["project_name"], "Acme");
    assert_eq!(health["pid"], pid);

    // WHEN: It dies without deregistering
    drop(server);

    // THEN: cleanup sweeps the stale entry
    let output = todotracker(home.path()).arg("cleanup").output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Removed 1 stale entry"));
    assert_eq!(read_registry(home.path())["servers"], serde_json::json!([]));
}

/// **VALUE**: `list` shows a running server with a live status.
#[tokio::test]
async fn given_running_server_when_list_json_then_row_is_running() {
    let home = tempfile::tempdir().unwrap();
    write_config(home.path(), 47_360, 40);
    let (_tmp, db) = project("beta");

    let child = todotracker(home.path())
        .args(["serve", "--db-path"])
        .arg(&db)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();
    let server = ServerProcess(child);
    let entry = wait_for_entry(home.path(), server.0.id());
    wait_for_health(entry["port"].as_u64().unwrap()).await;

    let output = todotracker(home.path())
        .args(["list", "--format", "json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(rows[0]["project_name"], "beta");
    assert_eq!(rows[0]["port"], entry["port"]);
    assert_eq!(rows[0]["status"], "running");
}

/// **VALUE**: SIGTERM shuts the server down gracefully and it removes its own
/// entry on the way out.
///
/// **WHY THIS MATTERS**: This is the normal way a server stops. Its port must be
/// free for the next start straight away, without waiting for some later sweep.
///
/// **BUG THIS CATCHES**: Would catch the signal handler not triggering graceful
/// shutdown, or the registration being leaked instead of released.
#[cfg(unix)]
#[tokio::test]
async fn given_running_server_when_sigterm_then_exits_cleanly_and_deregisters() {
    // GIVEN: A running, healthy server
    let home = tempfile::tempdir().unwrap();
    write_config(home.path(), 47_410, 40);
    let (_tmp, db) = project("gamma");

    let child = todotracker(home.path())
        .args(["serve", "--db-path"])
        .arg(&db)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();
    let mut server = ServerProcess(child);
    let pid = server.0.id();
    let entry = wait_for_entry(home.path(), pid);
    wait_for_health(entry["port"].as_u64().unwrap()).await;

    // WHEN: It receives SIGTERM
    terminate(pid);
    let status = wait_for_exit(&mut server);

    // THEN: Exit 0, and the entry is already gone with no cleanup run
    assert!(status.success(), "exit status was {status}");
    assert_eq!(read_registry(home.path())["servers"], serde_json::json!([]));
}
