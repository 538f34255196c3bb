use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("App credentials are not configured")]
    NoCredentials,

    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),

    #[error("Token refresh failed: {0}")]
    TokenRefreshFailed(String),

    #[error("Not authenticated with OneDrive")]
    NotAuthenticated,

    #[error("Permission denied at {endpoint}: check the app's delegated permissions")]
    PermissionDenied { endpoint: String },

    #[error("Graph request failed with HTTP {status} at {endpoint}")]
    RequestFailed { endpoint: String, status: u16 },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Path resolution failed: {0}")]
    PathResolution(String),

    #[error("Malformed response at {endpoint}: {reason}")]
    Malformed { endpoint: String, reason: String },

    #[error("Configuration store error: {0}")]
    Store(#[from] core_config::ConfigError),
}

pub type Result<T> = std::result::Result<T, GraphError>;
