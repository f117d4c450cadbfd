use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Unsupported topology: {0}")]
    UnsupportedTopology(String),

    #[error("Invalid subnet: {0}")]
    InvalidSubnet(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid network configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Conflicting objects named {0}")]
    ObjectConflict(String),

    #[error("Network not found: {0}")]
    NetworkNotFound(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
