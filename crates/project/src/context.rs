//! Project scaffolding and root discovery.
//!
//! Layout written by `init_project`:
//!
//! ```text
//! <root>/.goalkit/project.json    configuration
//! <root>/VISION.md                vision marker
//! <root>/goals/                   goal documents
//! ```

use std::path::{Path, PathBuf};

use regex::Regex;
use tokio::fs;
use tracing::info;

use crate::config::ProjectConfig;
use crate::error::ProjectError;
use crate::Result;

const DATA_DIR: &str = ".goalkit";
const CONFIG_FILE: &str = "project.json";
const VISION_FILE: &str = "VISION.md";
const GOALS_DIR: &str = "goals";

const VISION_TEMPLATE: &str = "\
# Vision

Describe the long-term goal of this project: what it delivers, for whom,
and what done looks like.

## Goals

Add one document per goal under `goals/`.
";

/// An initialized project: its root directory and parsed configuration.
///
/// Passed explicitly to whoever needs project state; there is no ambient
/// global.
#[derive(Debug, Clone)]
pub struct ProjectContext {
    root: PathBuf,
    config: ProjectConfig,
}

impl ProjectContext {
    /// Walk up from `start` looking for an initialized project.
    pub async fn discover(start: impl AsRef<Path>) -> Result<Self> {
        let start = start.as_ref();
        let mut dir = Some(start);
        while let Some(candidate) = dir {
            let config_path = candidate.join(DATA_DIR).join(CONFIG_FILE);
            if fs::try_exists(&config_path).await? {
                let raw = fs::read_to_string(&config_path).await?;
                let config: ProjectConfig = serde_json::from_str(&raw)?;
                return Ok(Self {
                    root: candidate.to_path_buf(),
                    config,
                });
            }
            dir = candidate.parent();
        }
        Err(ProjectError::NotInitialized(start.to_path_buf()))
    }

    /// The project root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The parsed configuration.
    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// The `.goalkit` data directory.
    pub fn data_dir(&self) -> PathBuf {
        self.root.join(DATA_DIR)
    }

    /// The `goals/` directory.
    pub fn goals_dir(&self) -> PathBuf {
        self.root.join(GOALS_DIR)
    }

    /// Write the configuration back to disk.
    pub async fn save_config(&self) -> Result<()> {
        let path = self.data_dir().join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(&self.config)?;
        fs::write(&path, json.as_bytes()).await?;
        Ok(())
    }

    /// Mutable access to the configuration; call `save_config` afterwards.
    pub fn config_mut(&mut self) -> &mut ProjectConfig {
        &mut self.config
    }
}

/// Whether `dir` (itself, not its parents) holds an initialized project.
pub async fn is_initialized(dir: impl AsRef<Path>) -> bool {
    fs::try_exists(dir.as_ref().join(DATA_DIR).join(CONFIG_FILE))
        .await
        .unwrap_or(false)
}

/// Scaffold a project in `dir`.
///
/// Creates the data and goals directories, writes the configuration and a
/// vision template. An existing `VISION.md` is left alone; an existing
/// project is an error.
pub async fn init_project(
    dir: impl AsRef<Path>,
    name: &str,
    description: &str,
) -> Result<ProjectContext> {
    let root = dir.as_ref().to_path_buf();
    if !valid_name(name) {
        return Err(ProjectError::InvalidName(name.to_string()));
    }
    if is_initialized(&root).await {
        return Err(ProjectError::AlreadyInitialized(root));
    }

    fs::create_dir_all(root.join(DATA_DIR)).await?;
    fs::create_dir_all(root.join(GOALS_DIR)).await?;

    let config = ProjectConfig::new(name, description);
    let json = serde_json::to_string_pretty(&config)?;
    fs::write(root.join(DATA_DIR).join(CONFIG_FILE), json.as_bytes()).await?;

    let vision_path = root.join(VISION_FILE);
    if !fs::try_exists(&vision_path).await? {
        fs::write(&vision_path, VISION_TEMPLATE.as_bytes()).await?;
    }

    info!(project = name, root = %root.display(), "project initialized");
    Ok(ProjectContext { root, config })
}

/// Names must be usable as a path segment: a letter followed by letters,
/// digits, `-` or `_`, at most 64 characters.
fn valid_name(name: &str) -> bool {
    match Regex::new(r"^[A-Za-z][A-Za-z0-9_-]{0,63}$") {
        Ok(re) => re.is_match(name),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use goalkit_core::ResourceKind;

    #[tokio::test]
    async fn test_init_writes_layout() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = init_project(dir.path(), "demo", "a demo").await.unwrap();

        assert!(dir.path().join(".goalkit/project.json").exists());
        assert!(dir.path().join("VISION.md").exists());
        assert!(dir.path().join("goals").is_dir());
        assert_eq!(ctx.config().name, "demo");
        assert!(is_initialized(dir.path()).await);
    }

    #[tokio::test]
    async fn test_init_twice_fails() {
        let dir = tempfile::tempdir().unwrap();
        init_project(dir.path(), "demo", "").await.unwrap();
        let err = init_project(dir.path(), "demo", "").await.unwrap_err();
        assert!(matches!(err, ProjectError::AlreadyInitialized(_)));
    }

    #[tokio::test]
    async fn test_init_rejects_unsafe_names() {
        let dir = tempfile::tempdir().unwrap();
        for bad in ["", "../evil", "has space", "0starts-with-digit", "a/b"] {
            let err = init_project(dir.path(), bad, "").await.unwrap_err();
            assert!(matches!(err, ProjectError::InvalidName(_)), "{bad:?}");
        }
        assert!(!is_initialized(dir.path()).await);
    }

    #[tokio::test]
    async fn test_discover_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        init_project(dir.path(), "demo", "").await.unwrap();

        let nested = dir.path().join("src/deep/module");
        fs::create_dir_all(&nested).await.unwrap();

        let ctx = ProjectContext::discover(&nested).await.unwrap();
        assert_eq!(ctx.root(), dir.path());
        assert_eq!(ctx.config().name, "demo");
        assert_eq!(ctx.config().resources.get(&ResourceKind::Cpu), 100.0);
    }

    #[tokio::test]
    async fn test_discover_fails_outside_projects() {
        let dir = tempfile::tempdir().unwrap();
        let err = ProjectContext::discover(dir.path()).await.unwrap_err();
        assert!(matches!(err, ProjectError::NotInitialized(_)));
    }

    #[tokio::test]
    async fn test_save_config_round_trips_changes() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = init_project(dir.path(), "demo", "").await.unwrap();

        ctx.config_mut().resources.set(ResourceKind::Cpu, 250.0);
        ctx.save_config().await.unwrap();

        let reloaded = ProjectContext::discover(dir.path()).await.unwrap();
        assert_eq!(reloaded.config().resources.get(&ResourceKind::Cpu), 250.0);
    }
}
