//! Goal Kit project scaffolding.
//!
//! Creates and discovers the on-disk project layout: a `.goalkit/` data
//! directory with the project configuration, a `VISION.md` marker and a
//! `goals/` directory. This crate owns all persistence; the automation
//! engine itself never touches disk.

#![warn(missing_docs)]

mod config;
mod context;
mod error;

pub use config::ProjectConfig;
pub use context::{init_project, is_initialized, ProjectContext};
pub use error::ProjectError;

/// Result alias for project operations.
pub type Result<T> = std::result::Result<T, ProjectError>;
