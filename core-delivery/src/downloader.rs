//! Download-URL resolution for stored file references.

use core_config::{ConfigStore, URL_PREFIX};
use provider_onedrive::GraphClient;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Resolves the host's stored "file location" value to a short-lived
/// signed download URL at request time.
///
/// The same field may hold plain URLs or local paths for products that are
/// not OneDrive-backed, so anything without the scheme marker — and any
/// reference that cannot be resolved right now — is returned unchanged.
/// Pass-through is the contract, not an error.
pub struct Downloader {
    client: Arc<GraphClient>,
    config: Arc<ConfigStore>,
}

impl Downloader {
    pub fn new(client: Arc<GraphClient>, config: Arc<ConfigStore>) -> Self {
        Self { client, config }
    }

    /// Resolve a stored reference to a download URL.
    #[instrument(skip(self))]
    pub async fn generate_url(&self, stored: &str) -> String {
        let Some(reference) = stored.strip_prefix(URL_PREFIX) else {
            return stored.to_string();
        };

        match self.config.is_connected().await {
            Ok(true) => {}
            Ok(false) => {
                debug!("OneDrive not connected, passing reference through");
                return stored.to_string();
            }
            Err(e) => {
                warn!(error = %e, "Could not read connection state");
                return stored.to_string();
            }
        }

        match self.client.download_url(reference).await {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "Failed to resolve download URL");
                stored.to_string()
            }
        }
    }
}
