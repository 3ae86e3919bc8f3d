use auth_policy::PolicyError;
use error_common::{Classified, ErrorKind};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid policy configuration for resource `{resource}`: {source}")]
    Policy {
        resource: String,
        #[source]
        source: PolicyError,
    },
}

impl Classified for ConfigError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::ConfigurationError
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
