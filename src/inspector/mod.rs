//! 容器运行时抽象：列出容器、inspect、解析环境变量

pub mod docker;
pub mod memory;

pub use docker::DockerCli;
pub use memory::MemoryInspector;

use crate::utils::{ContainerDetails, ContainerSummary, DockerenvError, EnvironmentMap, Result};

pub trait Inspector {
    /// Running containers known to the runtime.
    fn list_containers(&self) -> Result<Vec<ContainerSummary>>;

    /// Full ID, ID prefix or name.
    fn inspect(&self, id: &str) -> Result<ContainerDetails>;

    fn get_all_values(&self, id: &str) -> Result<EnvironmentMap> {
        let details = self.inspect(id)?;
        Ok(environment_map(&details.env))
    }

    fn get_value(&self, id: &str, name: &str) -> Result<String> {
        self.get_all_values(id)?
            .remove(name)
            .ok_or_else(|| DockerenvError::VariableNotFound {
                container: id.to_string(),
                name: name.to_string(),
            })
    }
}

/// Splits `KEY=VALUE` on the first `=`.
pub fn parse_env_entry(entry: &str) -> Result<(&str, &str)> {
    entry
        .split_once('=')
        .ok_or_else(|| DockerenvError::MalformedEntry(entry.to_string()))
}

/// Builds the environment map, skipping entries without `=`.
pub fn environment_map(entries: &[String]) -> EnvironmentMap {
    let mut values = EnvironmentMap::new();
    for entry in entries {
        match parse_env_entry(entry) {
            Ok((key, value)) => {
                values.insert(key.to_string(), value.to_string());
            }
            Err(e) => log::warn!("skipping {}", e),
        }
    }
    values
}
