//! Storage Abstractions
//!
//! Key/value traits for the two places the plugin keeps state: a durable
//! options store and a fast-expiring cache. The cache is a first-class
//! seam because the access token's cache entry — not timestamp math — is
//! the primary expiry signal.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

/// Durable key-value settings storage.
///
/// Backs the operator-facing configuration (app credentials, selected
/// folder) and the persistent copy of the OAuth tokens. Typical backends:
/// the host CMS options table, SQLite, or a config file.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::SettingsStore;
///
/// async fn save(store: &dyn SettingsStore) -> bridge_traits::Result<()> {
///     store.set_string("onedrive_client_id", "app-id").await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Store a string value
    async fn set_string(&self, key: &str, value: &str) -> Result<()>;

    /// Retrieve a string value. Returns `Ok(None)` if the key is absent.
    async fn get_string(&self, key: &str) -> Result<Option<String>>;

    /// Store an integer value
    async fn set_i64(&self, key: &str, value: i64) -> Result<()>;

    /// Retrieve an integer value. Returns `Ok(None)` if the key is absent.
    async fn get_i64(&self, key: &str) -> Result<Option<i64>>;

    /// Delete a key. Deleting an absent key succeeds.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check if a key exists
    async fn has_key(&self, key: &str) -> Result<bool>;
}

/// Fast-expiring cache storage.
///
/// Entries vanish once their time-to-live elapses; a TTL of zero means the
/// entry is already absent on the next read. Absence is meaningful to
/// callers (an absent access-token entry forces a refresh), so
/// implementations must not resurrect expired values.
#[async_trait]
pub trait TransientCache: Send + Sync {
    /// Store a value that expires after `ttl`.
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Retrieve a live value. Expired or missing entries return `Ok(None)`.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Remove an entry. Removing an absent entry succeeds.
    async fn delete(&self, key: &str) -> Result<()>;
}
