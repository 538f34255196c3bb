//! Shared fakes for the adapter tests.

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use bridge_traits::storage::{SettingsStore, TransientCache};
use bytes::Bytes;
use core_config::ConfigStore;
use mockall::mock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

mock! {
    pub Http {}

    #[async_trait]
    impl HttpClient for Http {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
    }
}

#[derive(Default)]
pub struct MemorySettings {
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
pub struct MemoryCache {
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

pub fn resp(status: u16, body: &str) -> HttpResponse {
    HttpResponse {
        status,
        headers: HashMap::new(),
        body: Bytes::from(body.to_string()),
    }
}

pub fn empty_config() -> Arc<ConfigStore> {
    Arc::new(ConfigStore::new(
        Arc::new(MemorySettings::default()),
        Arc::new(MemoryCache::default()),
    ))
}

pub async fn connected_config() -> Arc<ConfigStore> {
    let config = empty_config();
    config
        .save_credentials("client-id", "client-secret")
        .await
        .unwrap();
    config
        .save_tokens("valid-token", "refresh-token", 3600)
        .await
        .unwrap();
    config
}
