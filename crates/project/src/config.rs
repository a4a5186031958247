//! Project configuration model.

use serde::{Deserialize, Serialize};

use goalkit_core::{ResourceKind, ResourceRequirements, Time};

/// Persisted project configuration, stored as `.goalkit/project.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name
    pub name: String,

    /// Description
    pub description: String,

    /// When the project was initialized
    pub created_at: Time,

    /// Resource pool capacities used when running plans
    pub resources: ResourceRequirements,
}

impl ProjectConfig {
    /// Create a configuration with the default resource capacities
    /// (100 units each of cpu and memory).
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        let mut resources = ResourceRequirements::new();
        resources.set(ResourceKind::Cpu, 100.0);
        resources.set(ResourceKind::Memory, 100.0);
        Self {
            name: name.into(),
            description: description.into(),
            created_at: chrono::Utc::now(),
            resources,
        }
    }
}
