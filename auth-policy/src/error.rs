use error_common::{Classified, ErrorKind};
use thiserror::Error;

/// Policy configuration errors. All of them are raised at startup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("Empty policy set: {0}")]
    EmptyPolicySet(String),

    #[error("Group membership policy requires at least one group: {0}")]
    EmptyGroupSet(String),

    #[error("Invalid action name: {0:?}")]
    InvalidActionName(String),

    #[error("No policy resolves for action `{0}`")]
    UnresolvedAction(String),

    #[error("Duplicate action: {0}")]
    DuplicateAction(String),
}

impl Classified for PolicyError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::ConfigurationError
    }
}

pub type Result<T> = std::result::Result<T, PolicyError>;
