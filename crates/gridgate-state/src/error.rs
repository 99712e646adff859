//! Error types for the provisioning backend.

use gridgate_core::TopologyError;
use thiserror::Error;

/// Result type alias for state store operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors that can occur during state store operations.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to open database: {0}")]
    Open(String),

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("table error: {0}")]
    Table(String),

    #[error("read error: {0}")]
    Read(String),

    #[error("write error: {0}")]
    Write(String),

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("deserialization error: {0}")]
    Deserialize(String),

    #[error("actor '{actor}' may not write generated fields of secret '{secret}'")]
    WriteDenied { secret: String, actor: String },

    #[error("{kind} '{name}' already exists with a different definition")]
    Immutable { kind: &'static str, name: String },
}

impl From<StateError> for TopologyError {
    fn from(err: StateError) -> Self {
        TopologyError::Provisioning(err.to_string())
    }
}
