use crate::inspector::Inspector;
use crate::utils::{ContainerDetails, ContainerSummary, DockerenvError, Result};
use std::collections::BTreeSet;

/// In-memory runtime with fixed containers.
#[derive(Debug, Default, Clone)]
pub struct MemoryInspector {
    containers: Vec<ContainerDetails>,
    failing: BTreeSet<String>,
}

impl MemoryInspector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_container(mut self, details: ContainerDetails) -> Self {
        self.containers.push(details);
        self
    }

    /// Listed, but every inspect of it fails.
    pub fn with_failing(mut self, id: &str) -> Self {
        self.failing.insert(id.to_string());
        self
    }

    fn find(&self, id: &str) -> Option<&ContainerDetails> {
        self.containers
            .iter()
            .find(|c| c.id == id)
            .or_else(|| self.containers.iter().find(|c| c.name == id))
            .or_else(|| self.containers.iter().find(|c| !id.is_empty() && c.id.starts_with(id)))
    }
}

impl Inspector for MemoryInspector {
    fn list_containers(&self) -> Result<Vec<ContainerSummary>> {
        Ok(self.containers.iter().map(ContainerDetails::summary).collect())
    }

    fn inspect(&self, id: &str) -> Result<ContainerDetails> {
        let found = self
            .find(id)
            .ok_or_else(|| DockerenvError::ContainerNotFound(id.to_string()))?;

        if self.failing.contains(&found.id) {
            return Err(DockerenvError::Inspect {
                id: id.to_string(),
                message: "simulated runtime failure".to_string(),
            });
        }

        Ok(found.clone())
    }
}
