use registry_core::ProjectIdentity;
use registry_core::error::IdentityError;
use registry_core::identity::{DB_PATH_ENV, PROJECT_NAME_ENV};

use std::fs;
use std::path::{Path, PathBuf};

use serial_test::serial;
use tempfile::TempDir;

/// Creates `<tmp>/<name>/.todos/project.db` and returns (tmp, project dir).
fn project(name: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join(name);
    fs::create_dir_all(root.join(".todos")).unwrap();
    fs::write(root.join(".todos").join("project.db"), b"").unwrap();
    (dir, root)
}

fn clear_env() {
    // SAFETY: Tests touching these variables are serialized.
    unsafe {
        std::env::remove_var(DB_PATH_ENV);
        std::env::remove_var(PROJECT_NAME_ENV);
    }
}

#[test]
#[serial]
fn given_cwd_inside_project_when_resolved_then_finds_db_and_names_after_project_dir() {
    // GIVEN
    clear_env();
    let (_tmp, root) = project("acme");
    let cwd = root.join("src");
    fs::create_dir_all(&cwd).unwrap();

    // WHEN
    let identity = ProjectIdentity::resolve(None, None, &cwd).unwrap();

    // THEN
    assert_eq!(
        identity.db_path,
        fs::canonicalize(root.join(".todos/project.db")).unwrap()
    );
    assert_eq!(identity.project_name, "acme");
}

/// **VALUE**: Explicit arguments beat the environment, which beats discovery.
///
/// **BUG THIS CATCHES**: Would catch an env var silently overriding `--db-path`,
/// attaching a server to the wrong project.
#[test]
#[serial]
fn given_flag_and_env_when_resolved_then_flag_wins() {
    // GIVEN
    clear_env();
    let (_tmp_a, flagged) = project("flagged");
    let (_tmp_b, from_env) = project("from-env");
    // SAFETY: Serialized test.
    unsafe {
        std::env::set_var(DB_PATH_ENV, from_env.join(".todos/project.db"));
        std::env::set_var(PROJECT_NAME_ENV, "Env Name");
    }

    // WHEN
    let identity = ProjectIdentity::resolve(
        Some(&flagged.join(".todos/project.db")),
        Some("Flag Name"),
        Path::new("/"),
    )
    .unwrap();

    // THEN
    assert!(identity.db_path.ends_with("flagged/.todos/project.db"));
    assert_eq!(identity.project_name, "Flag Name");
    clear_env();
}

#[test]
#[serial]
fn given_env_only_when_resolved_then_env_is_used() {
    clear_env();
    let (_tmp, root) = project("from-env");
    // SAFETY: Serialized test.
    unsafe {
        std::env::set_var(DB_PATH_ENV, root.join(".todos/project.db"));
        std::env::set_var(PROJECT_NAME_ENV, "Env Name");
    }

    let identity = ProjectIdentity::resolve(None, None, Path::new("/")).unwrap();

    assert!(identity.db_path.ends_with("from-env/.todos/project.db"));
    assert_eq!(identity.project_name, "Env Name");
    clear_env();
}

#[test]
#[serial]
fn given_project_config_when_resolved_then_uses_configured_name() {
    clear_env();
    let (_tmp, root) = project("acme");
    fs::write(
        root.join(".todos/config.json"),
        r#"{ "project_name": "Acme Platform", "theme": "dark" }"#,
    )
    .unwrap();

    let identity = ProjectIdentity::resolve(None, None, &root).unwrap();

    assert_eq!(identity.project_name, "Acme Platform");
}

#[test]
#[serial]
fn given_blank_name_flag_when_resolved_then_falls_back_to_directory() {
    clear_env();
    let (_tmp, root) = project("acme");

    let identity = ProjectIdentity::resolve(None, Some("   "), &root).unwrap();

    assert_eq!(identity.project_name, "acme");
}

#[test]
#[serial]
fn given_no_database_when_resolved_then_returns_database_not_found() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();

    let result = ProjectIdentity::resolve(None, None, dir.path());

    // An ancestor of the temp dir could in theory hold a project database.
    if let Err(e) = result {
        assert!(matches!(e, IdentityError::DatabaseNotFound { .. }));
    }
}

/// **VALUE**: A database path that does not exist yet is still absolutized.
///
/// **WHY THIS MATTERS**: A server may be started before its database is created;
/// its identity must still be stable across working directories.
#[test]
#[serial]
fn given_relative_missing_db_path_when_resolved_then_absolutized_against_cwd() {
    clear_env();

    let identity = ProjectIdentity::resolve(
        Some(Path::new("new-project/.todos/project.db")),
        None,
        Path::new("/work"),
    )
    .unwrap();

    assert_eq!(
        identity.db_path,
        Path::new("/work/new-project/.todos/project.db")
    );
    assert_eq!(identity.project_name, "new-project");
}
