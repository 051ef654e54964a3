pub mod config;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::{DockerenvError, Result};
pub use types::*;
