use thiserror::Error;

#[derive(Error, Debug)]
pub enum DockerenvError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot reach container runtime: {0}")]
    Connection(String),

    #[error("Error inspecting container '{id}': {message}")]
    Inspect { id: String, message: String },

    #[error("Container {0} not found")]
    ContainerNotFound(String),

    #[error("Variable {name} not set in container {container}")]
    VariableNotFound { container: String, name: String },

    #[error("Malformed environment entry: {0:?}")]
    MalformedEntry(String),

    #[error("Invalid path prefix {0:?}: must start with '/'")]
    InvalidPrefix(String),

    #[error("YAML serialize: {0}")]
    Serialization(#[from] serde_yaml::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Failed to write {target}: {message}")]
    Write { target: String, message: String },

    #[error("Failed to create key pair from cert+key PEM: {0}")]
    KeyPair(String),

    #[error("Error parsing certificate {index}: {message}")]
    CertParse { index: usize, message: String },

    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, DockerenvError>;
