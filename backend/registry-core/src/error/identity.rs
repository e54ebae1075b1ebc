use common::{ErrorLocation, Remedy};

use std::io::Error as IoError;
use std::path::PathBuf;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum IdentityError {
    #[error("Database Not Found Error: no .todos/project.db at or above {start} {location}")]
    DatabaseNotFound {
        start: PathBuf,
        location: ErrorLocation,
    },

    #[error("Working Directory Error: {source} {location}")]
    CurrentDir {
        location: ErrorLocation,
        #[source]
        source: IoError,
    },
}

impl Remedy for IdentityError {
    fn remedy(&self) -> &'static str {
        match self {
            IdentityError::DatabaseNotFound { .. } => {
                "run inside a project containing .todos/project.db, or pass --db-path"
            }
            IdentityError::CurrentDir { .. } => "run from an existing, readable directory",
        }
    }
}
