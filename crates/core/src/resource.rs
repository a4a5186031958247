//! Resource kinds and requirement maps.
//!
//! Resources are a fixed set of well-known kinds plus an escape hatch for
//! custom names. Kinds serialize as plain lowercase strings so plan files
//! stay readable, and order deterministically so reports are stable.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// A kind of schedulable resource.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceKind {
    /// CPU share (percent or abstract units)
    Cpu,
    /// Memory
    Memory,
    /// Disk bandwidth or space
    Disk,
    /// Network bandwidth
    Network,
    /// A user-defined resource
    Custom(String),
}

impl ResourceKind {
    /// The canonical string name of this kind.
    pub fn as_str(&self) -> &str {
        match self {
            ResourceKind::Cpu => "cpu",
            ResourceKind::Memory => "memory",
            ResourceKind::Disk => "disk",
            ResourceKind::Network => "network",
            ResourceKind::Custom(name) => name,
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ResourceKind {
    fn from(s: &str) -> Self {
        match s {
            "cpu" => ResourceKind::Cpu,
            "memory" => ResourceKind::Memory,
            "disk" => ResourceKind::Disk,
            "network" => ResourceKind::Network,
            other => ResourceKind::Custom(other.to_string()),
        }
    }
}

impl std::str::FromStr for ResourceKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl Serialize for ResourceKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ResourceKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        // Unknown names become Custom, so this never fails
        Ok(ResourceKind::from(s.as_str()))
    }
}

/// A map from resource kind to a required (or available) quantity.
///
/// Backed by a `BTreeMap` so iteration order is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceRequirements(BTreeMap<ResourceKind, f64>);

impl ResourceRequirements {
    /// Create an empty requirement map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the required quantity for a kind, replacing any previous value.
    pub fn set(&mut self, kind: ResourceKind, amount: f64) {
        self.0.insert(kind, amount);
    }

    /// Get the required quantity for a kind, 0 when absent.
    pub fn get(&self, kind: &ResourceKind) -> f64 {
        self.0.get(kind).copied().unwrap_or(0.0)
    }

    /// Iterate (kind, amount) pairs in kind order.
    pub fn iter(&self) -> impl Iterator<Item = (&ResourceKind, f64)> {
        self.0.iter().map(|(k, v)| (k, *v))
    }

    /// True when no resource is required.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of named kinds.
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl FromIterator<(ResourceKind, f64)> for ResourceRequirements {
    fn from_iter<I: IntoIterator<Item = (ResourceKind, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips_as_string() {
        let json = serde_json::to_string(&ResourceKind::Memory).unwrap();
        assert_eq!(json, "\"memory\"");
        let back: ResourceKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ResourceKind::Memory);
    }

    #[test]
    fn test_custom_kind_keeps_its_name() {
        let kind: ResourceKind = "gpu".parse().unwrap();
        assert_eq!(kind, ResourceKind::Custom("gpu".to_string()));
        assert_eq!(kind.to_string(), "gpu");
    }

    #[test]
    fn test_requirements_default_to_zero() {
        let mut reqs = ResourceRequirements::new();
        reqs.set(ResourceKind::Cpu, 20.0);
        assert_eq!(reqs.get(&ResourceKind::Cpu), 20.0);
        assert_eq!(reqs.get(&ResourceKind::Disk), 0.0);
    }
}
