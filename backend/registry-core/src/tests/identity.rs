use crate::identity::{canonical_db_path, find_project_database};

use std::fs;
use std::path::Path;

use tempfile::tempdir;

#[test]
fn given_nested_directory_when_searching_then_finds_nearest_database() {
    // GIVEN: /root/.todos/project.db and a working directory two levels down
    let dir = tempdir().unwrap();
    let todos = dir.path().join(".todos");
    fs::create_dir_all(&todos).unwrap();
    fs::write(todos.join("project.db"), b"").unwrap();
    let nested = dir.path().join("src").join("deep");
    fs::create_dir_all(&nested).unwrap();

    // WHEN
    let found = find_project_database(&nested);

    // THEN
    assert_eq!(found, Some(todos.join("project.db")));
}

#[test]
fn given_no_database_when_searching_then_returns_none() {
    let dir = tempdir().unwrap();

    // Ancestors of a temp dir will not hold a .todos/project.db in CI.
    let found = find_project_database(dir.path());

    assert!(found.is_none_or(|p| !p.starts_with(dir.path())));
}

/// **VALUE**: Existing paths are canonicalized so symlinks and `..` segments
/// collapse to one identity.
///
/// **BUG THIS CATCHES**: Would catch `proj/../proj/.todos/project.db` registering
/// as a second server for a database that already has one.
#[test]
fn given_existing_path_with_dotdot_when_canonicalized_then_collapses() {
    let dir = tempdir().unwrap();
    let todos = dir.path().join("proj").join(".todos");
    fs::create_dir_all(&todos).unwrap();
    fs::write(todos.join("project.db"), b"").unwrap();

    let messy = dir
        .path()
        .join("proj")
        .join("..")
        .join("proj")
        .join(".todos")
        .join("project.db");
    let canonical = canonical_db_path(&messy, Path::new("/"));

    assert_eq!(canonical, fs::canonicalize(todos.join("project.db")).unwrap());
}

#[test]
fn given_missing_relative_path_when_canonicalized_then_joins_cwd() {
    let canonical = canonical_db_path(Path::new("nope/.todos/project.db"), Path::new("/work"));

    assert_eq!(canonical, Path::new("/work/nope/.todos/project.db"));
}
