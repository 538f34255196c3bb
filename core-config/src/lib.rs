//! # Configuration & Token Store
//!
//! Persists the operator-supplied app credentials, the OAuth token set,
//! and the default upload folder for the OneDrive storage integration.
//!
//! ## Token expiry model
//!
//! The access token is written to a fast-expiring cache with a 300-second
//! safety margin in addition to the durable store. The cache entry — not
//! timestamp arithmetic — is the expiry signal: once it lapses,
//! [`ConfigStore::is_token_expired`] reports `true` and the next request
//! forces a refresh, regardless of the durable expiry value.
//!
//! ## Credential rotation
//!
//! Changing either the client id or the client secret invalidates every
//! stored token; [`ConfigStore::save_credentials`] enforces the purge at
//! the save boundary.

pub mod error;
pub mod store;

pub use error::{ConfigError, Result};
pub use store::{ConfigStore, TOKEN_CACHE_MARGIN_SECS, URL_PREFIX};
