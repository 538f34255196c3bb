//! Process-local TTL cache

use async_trait::async_trait;
use bridge_traits::{error::Result, storage::TransientCache};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// In-memory TTL cache.
///
/// Entries carry an absolute deadline; reads past the deadline behave as if
/// the entry never existed. A zero TTL therefore produces an entry that is
/// already absent on the next read, which is how the token store models
/// "expires_in below the safety margin".
///
/// The cache is process-local. A multi-process host should implement
/// [`TransientCache`] over its shared object cache instead.
#[derive(Default)]
pub struct MemoryTransientCache {
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl MemoryTransientCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransientCache for MemoryTransientCache {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let deadline = Instant::now() + ttl;
        let mut entries = self.entries.lock().await;
        entries.insert(key.to_string(), (value.to_string(), deadline));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some((value, deadline)) if *deadline > Instant::now() => Ok(Some(value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.remove(key);
        Ok(())
    }
}
