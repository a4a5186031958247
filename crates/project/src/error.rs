//! Error type for project operations.

use std::path::PathBuf;

/// Errors from scaffolding and discovery.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No initialized project found here or in any parent directory
    #[error("no goalkit project found at or above {0}")]
    NotInitialized(PathBuf),

    /// The directory already holds a project
    #[error("project already initialized at {0}")]
    AlreadyInitialized(PathBuf),

    /// Project name is not path-safe
    #[error("invalid project name '{0}'")]
    InvalidName(String),
}
