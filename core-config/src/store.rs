//! Credential and token persistence over the host storage seams.

use crate::error::{ConfigError, Result};
use bridge_traits::storage::{SettingsStore, TransientCache};
use bridge_traits::BridgeError;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Safety margin subtracted from the provider-reported token lifetime.
///
/// A token that Graph says lives 3600 s is cached for 3300 s, so no request
/// ever rides a token into its final five minutes.
pub const TOKEN_CACHE_MARGIN_SECS: u64 = 300;

/// Scheme marker prefixed to OneDrive-backed file references when they are
/// stored in the host's per-product "file location" field.
pub const URL_PREFIX: &str = "onedrive://";

const KEY_CLIENT_ID: &str = "onedrive_client_id";
const KEY_CLIENT_SECRET: &str = "onedrive_client_secret";
const KEY_ACCESS_TOKEN: &str = "onedrive_access_token";
const KEY_REFRESH_TOKEN: &str = "onedrive_refresh_token";
const KEY_TOKEN_EXPIRY: &str = "onedrive_token_expiry";
const KEY_FOLDER: &str = "onedrive_folder";

/// Configuration and token store.
///
/// Owns the single global credential set and token state shared by every
/// request in the process. Token values are never logged.
#[derive(Clone)]
pub struct ConfigStore {
    settings: Arc<dyn SettingsStore>,
    cache: Arc<dyn TransientCache>,
}

impl ConfigStore {
    pub fn new(settings: Arc<dyn SettingsStore>, cache: Arc<dyn TransientCache>) -> Self {
        Self { settings, cache }
    }

    /// The Azure application (client) id, empty string when unset.
    pub async fn client_id(&self) -> Result<String> {
        Ok(self
            .settings
            .get_string(KEY_CLIENT_ID)
            .await
            .map_err(store_err)?
            .unwrap_or_default())
    }

    /// The Azure client secret, empty string when unset.
    pub async fn client_secret(&self) -> Result<String> {
        Ok(self
            .settings
            .get_string(KEY_CLIENT_SECRET)
            .await
            .map_err(store_err)?
            .unwrap_or_default())
    }

    /// Whether both app credentials are configured.
    pub async fn has_app_credentials(&self) -> Result<bool> {
        Ok(!self.client_id().await?.is_empty() && !self.client_secret().await?.is_empty())
    }

    /// Whether the OAuth flow has been completed at least once.
    ///
    /// Uses the durable token copy, so a lapsed cache entry does not read
    /// as "disconnected" — it reads as "connected, token expired". This
    /// does NOT guarantee the token is usable.
    pub async fn is_connected(&self) -> Result<bool> {
        Ok(self.access_token().await?.is_some() && self.has_app_credentials().await?)
    }

    /// The current access token: live cache entry first, durable fallback.
    pub async fn access_token(&self) -> Result<Option<String>> {
        if let Some(token) = self
            .cache
            .get(KEY_ACCESS_TOKEN)
            .await
            .map_err(cache_err)?
        {
            return Ok(Some(token));
        }

        let stored = self
            .settings
            .get_string(KEY_ACCESS_TOKEN)
            .await
            .map_err(store_err)?;
        Ok(stored.filter(|token| !token.is_empty()))
    }

    /// The long-lived refresh token, if one was ever granted.
    pub async fn refresh_token(&self) -> Result<Option<String>> {
        let stored = self
            .settings
            .get_string(KEY_REFRESH_TOKEN)
            .await
            .map_err(store_err)?;
        Ok(stored.filter(|token| !token.is_empty()))
    }

    /// Absolute Unix timestamp at which the provider said the access token
    /// expires. Informational; expiry decisions use the cache entry.
    pub async fn token_expiry(&self) -> Result<Option<i64>> {
        self.settings
            .get_i64(KEY_TOKEN_EXPIRY)
            .await
            .map_err(store_err)
    }

    /// Whether the access token must be refreshed before use.
    ///
    /// True exactly when the margin-adjusted cache entry is absent. There
    /// is no timestamp math here: the cache lapse itself is the trigger, so
    /// every call after the window elapses forces a refresh attempt.
    pub async fn is_token_expired(&self) -> Result<bool> {
        let cached = self
            .cache
            .get(KEY_ACCESS_TOKEN)
            .await
            .map_err(cache_err)?;
        Ok(cached.is_none())
    }

    /// Persist a freshly granted token set.
    ///
    /// The access token goes to the cache with `expires_in - 300` seconds
    /// of life (floored at zero) and to the durable store as a backup. An
    /// empty `refresh_token` means "keep the previous one" — Graph does not
    /// rotate it on every response.
    pub async fn save_tokens(
        &self,
        access_token: &str,
        refresh_token: &str,
        expires_in: i64,
    ) -> Result<()> {
        let ttl = Duration::from_secs(
            u64::try_from(expires_in)
                .unwrap_or(0)
                .saturating_sub(TOKEN_CACHE_MARGIN_SECS),
        );
        self.cache
            .put(KEY_ACCESS_TOKEN, access_token, ttl)
            .await
            .map_err(cache_err)?;

        self.settings
            .set_string(KEY_ACCESS_TOKEN, access_token)
            .await
            .map_err(store_err)?;

        if !refresh_token.is_empty() {
            self.settings
                .set_string(KEY_REFRESH_TOKEN, refresh_token)
                .await
                .map_err(store_err)?;
        }

        let expiry = Utc::now().timestamp() + expires_in;
        self.settings
            .set_i64(KEY_TOKEN_EXPIRY, expiry)
            .await
            .map_err(store_err)?;

        info!(
            expires_in = expires_in,
            rotated_refresh_token = !refresh_token.is_empty(),
            "Tokens saved"
        );

        Ok(())
    }

    /// Remove every stored token (disconnect). Idempotent.
    pub async fn clear_tokens(&self) -> Result<()> {
        self.cache
            .delete(KEY_ACCESS_TOKEN)
            .await
            .map_err(cache_err)?;
        self.settings
            .delete(KEY_ACCESS_TOKEN)
            .await
            .map_err(store_err)?;
        self.settings
            .delete(KEY_REFRESH_TOKEN)
            .await
            .map_err(store_err)?;
        self.settings
            .delete(KEY_TOKEN_EXPIRY)
            .await
            .map_err(store_err)?;

        info!("Tokens cleared");
        Ok(())
    }

    /// Comparison hook: would saving these credentials rotate the app
    /// registration? Tokens issued under the previous registration become
    /// useless the moment either value changes.
    pub async fn credentials_changed(&self, client_id: &str, client_secret: &str) -> Result<bool> {
        Ok(self.client_id().await? != client_id || self.client_secret().await? != client_secret)
    }

    /// Persist app credentials, purging all tokens when either value
    /// differs from what was stored before. Unchanged saves never purge.
    pub async fn save_credentials(&self, client_id: &str, client_secret: &str) -> Result<()> {
        let changed = self.credentials_changed(client_id, client_secret).await?;

        self.settings
            .set_string(KEY_CLIENT_ID, client_id)
            .await
            .map_err(store_err)?;
        self.settings
            .set_string(KEY_CLIENT_SECRET, client_secret)
            .await
            .map_err(store_err)?;

        if changed {
            debug!("App credentials changed, clearing stored tokens");
            self.clear_tokens().await?;
        }

        Ok(())
    }

    /// The operator-selected default upload folder id.
    pub async fn selected_folder(&self) -> Result<Option<String>> {
        let stored = self
            .settings
            .get_string(KEY_FOLDER)
            .await
            .map_err(store_err)?;
        Ok(stored.filter(|folder| !folder.is_empty()))
    }

    pub async fn set_selected_folder(&self, folder_id: &str) -> Result<()> {
        self.settings
            .set_string(KEY_FOLDER, folder_id)
            .await
            .map_err(store_err)
    }
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore").finish_non_exhaustive()
    }
}

fn store_err(e: BridgeError) -> ConfigError {
    ConfigError::StorageUnavailable(e.to_string())
}

fn cache_err(e: BridgeError) -> ConfigError {
    ConfigError::CacheUnavailable(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use std::collections::HashMap;
    use std::time::Instant;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct MemorySettings {
        values: Mutex<HashMap<String, String>>,
    }

    #[async_trait]
    impl SettingsStore for MemorySettings {
        async fn set_string(&self, key: &str, value: &str) -> BridgeResult<()> {
            self.values
                .lock()
                .await
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn get_string(&self, key: &str) -> BridgeResult<Option<String>> {
            Ok(self.values.lock().await.get(key).cloned())
        }

        async fn set_i64(&self, key: &str, value: i64) -> BridgeResult<()> {
            self.set_string(key, &value.to_string()).await
        }

        async fn get_i64(&self, key: &str) -> BridgeResult<Option<i64>> {
            Ok(self
                .values
                .lock()
                .await
                .get(key)
                .and_then(|v| v.parse().ok()))
        }

        async fn delete(&self, key: &str) -> BridgeResult<()> {
            self.values.lock().await.remove(key);
            Ok(())
        }

        async fn has_key(&self, key: &str) -> BridgeResult<bool> {
            Ok(self.values.lock().await.contains_key(key))
        }
    }

    #[derive(Default)]
    struct MemoryCache {
        entries: Mutex<HashMap<String, (String, Instant)>>,
    }

    #[async_trait]
    impl TransientCache for MemoryCache {
        async fn put(&self, key: &str, value: &str, ttl: Duration) -> BridgeResult<()> {
            self.entries
                .lock()
                .await
                .insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
            Ok(())
        }

        async fn get(&self, key: &str) -> BridgeResult<Option<String>> {
            Ok(self
                .entries
                .lock()
                .await
                .get(key)
                .filter(|(_, deadline)| *deadline > Instant::now())
                .map(|(value, _)| value.clone()))
        }

        async fn delete(&self, key: &str) -> BridgeResult<()> {
            self.entries.lock().await.remove(key);
            Ok(())
        }
    }

    fn store() -> (ConfigStore, Arc<MemoryCache>) {
        let cache = Arc::new(MemoryCache::default());
        let config = ConfigStore::new(Arc::new(MemorySettings::default()), cache.clone());
        (config, cache)
    }

    #[tokio::test]
    async fn test_token_fresh_after_save() {
        let (config, _) = store();

        config.save_tokens("access", "refresh", 3600).await.unwrap();

        assert!(!config.is_token_expired().await.unwrap());
        assert_eq!(
            config.access_token().await.unwrap(),
            Some("access".to_string())
        );
    }

    #[tokio::test]
    async fn test_short_lifetime_floors_ttl_at_zero() {
        let (config, _) = store();

        // 200 s is below the 300 s margin, so the cache entry is born dead
        config.save_tokens("access", "refresh", 200).await.unwrap();

        assert!(config.is_token_expired().await.unwrap());
        // Durable copy is independent of the cache: still connected
        assert_eq!(
            config.access_token().await.unwrap(),
            Some("access".to_string())
        );
        assert!(config.token_expiry().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_expired_once_cache_entry_lapses() {
        let (config, cache) = store();

        config.save_tokens("access", "refresh", 3600).await.unwrap();
        assert!(!config.is_token_expired().await.unwrap());

        // Simulate the TTL elapsing
        cache.delete(super::KEY_ACCESS_TOKEN).await.unwrap();

        assert!(config.is_token_expired().await.unwrap());
        // Durable fallback still serves the token value
        assert_eq!(
            config.access_token().await.unwrap(),
            Some("access".to_string())
        );
    }

    #[tokio::test]
    async fn test_empty_refresh_token_keeps_previous() {
        let (config, _) = store();

        config.save_tokens("a1", "r1", 3600).await.unwrap();
        config.save_tokens("a2", "", 3600).await.unwrap();

        assert_eq!(config.refresh_token().await.unwrap(), Some("r1".to_string()));
        assert_eq!(config.access_token().await.unwrap(), Some("a2".to_string()));
    }

    #[tokio::test]
    async fn test_clear_tokens_is_idempotent() {
        let (config, _) = store();

        config.save_tokens("access", "refresh", 3600).await.unwrap();
        config.clear_tokens().await.unwrap();

        assert_eq!(config.access_token().await.unwrap(), None);
        assert_eq!(config.refresh_token().await.unwrap(), None);
        assert_eq!(config.token_expiry().await.unwrap(), None);
        assert!(config.is_token_expired().await.unwrap());

        config.clear_tokens().await.unwrap();
    }

    #[tokio::test]
    async fn test_credential_change_purges_tokens() {
        let (config, _) = store();

        config.save_credentials("id-1", "secret-1").await.unwrap();
        config.save_tokens("access", "refresh", 3600).await.unwrap();

        // Unchanged save keeps tokens
        config.save_credentials("id-1", "secret-1").await.unwrap();
        assert_eq!(
            config.access_token().await.unwrap(),
            Some("access".to_string())
        );

        // Changed secret purges
        config.save_credentials("id-1", "secret-2").await.unwrap();
        assert_eq!(config.access_token().await.unwrap(), None);
        assert_eq!(config.refresh_token().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_credentials_changed_hook() {
        let (config, _) = store();

        config.save_credentials("id-1", "secret-1").await.unwrap();

        assert!(!config.credentials_changed("id-1", "secret-1").await.unwrap());
        assert!(config.credentials_changed("id-2", "secret-1").await.unwrap());
        assert!(config.credentials_changed("id-1", "secret-2").await.unwrap());
    }

    #[tokio::test]
    async fn test_credentials_without_tokens_not_connected() {
        let (config, _) = store();

        config.save_credentials("id-1", "secret-1").await.unwrap();

        assert!(config.has_app_credentials().await.unwrap());
        assert!(!config.is_connected().await.unwrap());
    }

    #[tokio::test]
    async fn test_connected_needs_credentials_too() {
        let (config, _) = store();

        config.save_tokens("access", "refresh", 3600).await.unwrap();
        assert!(!config.is_connected().await.unwrap());

        config.save_credentials("id-1", "secret-1").await.unwrap();
        // save_credentials on first write counts as a change and purges;
        // re-grant to land in the connected state
        config.save_tokens("access", "refresh", 3600).await.unwrap();
        assert!(config.is_connected().await.unwrap());
    }

    #[tokio::test]
    async fn test_selected_folder_round_trip() {
        let (config, _) = store();

        assert_eq!(config.selected_folder().await.unwrap(), None);
        config.set_selected_folder("folder-id").await.unwrap();
        assert_eq!(
            config.selected_folder().await.unwrap(),
            Some("folder-id".to_string())
        );
    }
}
