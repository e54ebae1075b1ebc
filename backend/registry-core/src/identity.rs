//! Which project a server is for, and what to call it.
//!
//! The database path is the identity: two servers with the same canonical
//! path serve the same project.

use crate::error::IdentityError;

use common::ErrorLocation;

use std::env;
use std::fs;
use std::panic::Location;
use std::path::{Path, PathBuf};

use log::{debug, trace};
use serde::Deserialize;

pub const TODOS_DIR: &str = ".todos";
pub const DB_FILE_NAME: &str = "project.db";
pub const PROJECT_CONFIG_FILE: &str = "config.json";

pub const DB_PATH_ENV: &str = "TODOTRACKER_DB_PATH";
pub const PROJECT_NAME_ENV: &str = "TODOTRACKER_PROJECT_NAME";

const FALLBACK_PROJECT_NAME: &str = "project";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectIdentity {
    pub project_name: String,
    pub db_path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct ProjectConfig {
    project_name: Option<String>,
}

impl ProjectIdentity {
    pub fn new(project_name: impl Into<String>, db_path: impl Into<PathBuf>) -> Self {
        Self {
            project_name: project_name.into(),
            db_path: db_path.into(),
        }
    }

    /// Resolve the identity for a server started from `cwd`.
    ///
    /// Database path: `db_path`, then `TODOTRACKER_DB_PATH`, then the nearest
    /// `.todos/project.db` at or above `cwd`.
    ///
    /// Name: `name`, then `TODOTRACKER_PROJECT_NAME`, then `project_name` in
    /// `.todos/config.json`, then the directory holding `.todos`, then `cwd`.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::DatabaseNotFound` if no database path is given
    /// and none is found.
    #[track_caller]
    pub fn resolve(
        db_path: Option<&Path>,
        name: Option<&str>,
        cwd: &Path,
    ) -> Result<Self, IdentityError> {
        let raw = match db_path {
            Some(path) => path.to_path_buf(),
            None => match non_empty_env(DB_PATH_ENV) {
                Some(path) => PathBuf::from(path),
                None => find_project_database(cwd).ok_or_else(|| {
                    IdentityError::DatabaseNotFound {
                        start: cwd.to_path_buf(),
                        location: ErrorLocation::from(Location::caller()),
                    }
                })?,
            },
        };

        let db_path = canonical_db_path(&raw, cwd);

        let project_name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(String::from)
            .or_else(|| non_empty_env(PROJECT_NAME_ENV))
            .or_else(|| project_name_from_config(&db_path))
            .unwrap_or_else(|| derive_project_name(&db_path, cwd));

        debug!(
            "Resolved project {project_name} at {}",
            db_path.display()
        );

        Ok(Self {
            project_name,
            db_path,
        })
    }
}

/// Nearest `.todos/project.db` at or above `start`.
pub fn find_project_database(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(TODOS_DIR).join(DB_FILE_NAME))
        .find(|candidate| {
            trace!("Looking for database at {}", candidate.display());
            candidate.is_file()
        })
}

/// Canonical form of `path` if it exists, otherwise its absolute form
/// relative to `cwd`.
pub fn canonical_db_path(path: &Path, cwd: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };

    fs::canonicalize(&absolute).unwrap_or(absolute)
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn project_name_from_config(db_path: &Path) -> Option<String> {
    let config_path = db_path.parent()?.join(PROJECT_CONFIG_FILE);
    let contents = fs::read_to_string(&config_path).ok()?;

    match serde_json::from_str::<ProjectConfig>(&contents) {
        Ok(config) => config
            .project_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty()),
        Err(e) => {
            debug!("Ignoring {}: {e}", config_path.display());
            None
        }
    }
}

fn derive_project_name(db_path: &Path, cwd: &Path) -> String {
    let from_db = db_path
        .parent()
        .filter(|dir| dir.file_name().is_some_and(|n| n == TODOS_DIR))
        .and_then(Path::parent)
        .and_then(Path::file_name);

    from_db
        .or_else(|| cwd.file_name())
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| String::from(FALLBACK_PROJECT_NAME))
}
