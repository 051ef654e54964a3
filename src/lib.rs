//! Inspect the environment of running Docker containers: list and read
//! variables, export them to files or object storage, and pretty-print the
//! TLS certificates they carry.

pub mod export;
pub mod inspector;
pub mod tls;
pub mod utils;
pub mod values;

pub use utils::{Config, DockerenvError, Result};
