use crate::utils::{DockerenvError, EnvironmentMap};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// `KEY="VALUE"` file per container.
    #[default]
    Env,
    /// All containers in one YAML document.
    Yaml,
    /// Accepted on the command line but has no writer.
    Json,
    /// Parameter-store layout, logged only.
    Ssm,
    /// Env files uploaded to object storage.
    S3,
}

impl FromStr for ExportFormat {
    type Err = DockerenvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "env" => Ok(ExportFormat::Env),
            "yaml" | "yml" => Ok(ExportFormat::Yaml),
            "json" => Ok(ExportFormat::Json),
            "ssm" => Ok(ExportFormat::Ssm),
            "s3" => Ok(ExportFormat::S3),
            other => Err(DockerenvError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Env => write!(f, "env"),
            ExportFormat::Yaml => write!(f, "yaml"),
            ExportFormat::Json => write!(f, "json"),
            ExportFormat::Ssm => write!(f, "ssm"),
            ExportFormat::S3 => write!(f, "s3"),
        }
    }
}

/// Renders `KEY="VALUE"` lines in key order.
pub fn render_env_file(values: &EnvironmentMap) -> String {
    let mut txt = String::new();
    for (key, value) in values {
        txt.push_str(&format!("{}=\"{}\"\n", key, value));
    }
    txt
}
