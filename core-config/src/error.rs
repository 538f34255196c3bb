use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Settings storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Token cache unavailable: {0}")]
    CacheUnavailable(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
