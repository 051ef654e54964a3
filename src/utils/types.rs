use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Variable name → raw value, ordered by name.
pub type EnvironmentMap = BTreeMap<String, String>;

/// One line of `docker ps`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSummary {
    pub id: String,
    pub name: String,
}

/// The parts of `docker inspect` this tool cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerDetails {
    pub id: String,
    pub name: String,
    pub image: String,
    pub command: Vec<String>,
    pub env: Vec<String>,
    pub labels: BTreeMap<String, String>,
}

impl ContainerDetails {
    pub fn summary(&self) -> ContainerSummary {
        ContainerSummary {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }
}

/// Record of a container's identity and configuration, enough to restart it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSnapshot {
    pub name: String,
    pub image: String,
    #[serde(rename = "cmd")]
    pub command: Vec<String>,
    #[serde(rename = "env")]
    pub environment: Vec<String>,
    pub labels: BTreeMap<String, String>,
}

impl From<&ContainerDetails> for ContainerSnapshot {
    fn from(d: &ContainerDetails) -> Self {
        Self {
            name: d.name.clone(),
            image: d.image.clone(),
            command: d.command.clone(),
            environment: d.env.clone(),
            labels: d.labels.clone(),
        }
    }
}

/// First 8 characters of a container ID.
pub fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}
