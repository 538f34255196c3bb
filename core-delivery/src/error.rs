use crate::validation::ValidationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("OneDrive is not connected.")]
    NotConnected,

    #[error(transparent)]
    Graph(#[from] provider_onedrive::GraphError),

    #[error("Configuration store error: {0}")]
    Config(#[from] core_config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DeliveryError>;
