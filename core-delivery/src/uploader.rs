//! Validated uploads into the configured OneDrive folder.

use crate::browse::format_file_size;
use crate::error::{DeliveryError, Result};
use crate::validation::{self, ValidationError};
use bytes::Bytes;
use core_config::ConfigStore;
use provider_onedrive::{FolderRef, GraphClient};
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing::{info, instrument};

/// Graph rejects single-request uploads above 250 MiB; larger files need a
/// resumable upload session, which this integration does not use.
pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 250 * 1024 * 1024;

/// Result handed back to the host: the stored filename and the display
/// path reconstructed from the upload response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub filename: String,
    pub path: String,
}

/// Validates inbound files and streams them to OneDrive.
pub struct Uploader {
    client: Arc<GraphClient>,
    config: Arc<ConfigStore>,
    max_size: u64,
}

impl Uploader {
    pub fn new(client: Arc<GraphClient>, config: Arc<ConfigStore>) -> Self {
        Self {
            client,
            config,
            max_size: DEFAULT_MAX_UPLOAD_SIZE,
        }
    }

    /// Override the maximum accepted file size.
    pub fn with_max_size(mut self, max_size: u64) -> Self {
        self.max_size = max_size;
        self
    }

    /// Upload a file from disk, streaming the content.
    ///
    /// `folder` of `None` targets the operator's selected default folder,
    /// falling back to the drive root.
    #[instrument(skip(self, source))]
    pub async fn upload_from_path(
        &self,
        filename: &str,
        source: &Path,
        folder: Option<FolderRef>,
    ) -> Result<UploadedFile> {
        validation::validate_filename(filename)?;
        validation::validate_declared_mime(filename)?;

        let metadata = tokio::fs::metadata(source).await?;
        self.check_size(metadata.len())?;

        let head = read_head(source).await?;
        validation::validate_content(filename, &head)?;

        let folder = self.target_folder(folder).await?;
        if !self.config.is_connected().await? {
            return Err(DeliveryError::NotConnected);
        }

        let item = self.client.upload_file_stream(filename, source, &folder).await?;
        let uploaded = UploadedFile {
            path: item.display_path(),
            filename: item.name,
        };

        info!(path = %uploaded.path, "File uploaded");
        Ok(uploaded)
    }

    /// Upload in-memory content.
    #[instrument(skip(self, content), fields(size = content.len()))]
    pub async fn upload_bytes(
        &self,
        filename: &str,
        content: Bytes,
        folder: Option<FolderRef>,
    ) -> Result<UploadedFile> {
        validation::validate_filename(filename)?;
        validation::validate_declared_mime(filename)?;
        self.check_size(content.len() as u64)?;
        validation::validate_content(filename, &content)?;

        let folder = self.target_folder(folder).await?;
        if !self.config.is_connected().await? {
            return Err(DeliveryError::NotConnected);
        }

        let item = self.client.upload_file(filename, content, &folder).await?;
        let uploaded = UploadedFile {
            path: item.display_path(),
            filename: item.name,
        };

        info!(path = %uploaded.path, "File uploaded");
        Ok(uploaded)
    }

    fn check_size(&self, size: u64) -> Result<()> {
        if size == 0 {
            return Err(ValidationError::Empty.into());
        }
        if size > self.max_size {
            return Err(ValidationError::TooLarge {
                max: format_file_size(self.max_size),
            }
            .into());
        }
        Ok(())
    }

    async fn target_folder(&self, folder: Option<FolderRef>) -> Result<FolderRef> {
        if let Some(folder) = folder {
            return Ok(folder);
        }
        Ok(self
            .config
            .selected_folder()
            .await?
            .map(|id| FolderRef::parse(&id))
            .unwrap_or(FolderRef::Root))
    }
}

/// Read the first bytes of a file for content sniffing.
async fn read_head(path: &Path) -> std::io::Result<Vec<u8>> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut buf = [0u8; 16];
    let mut filled = 0;
    while filled < buf.len() {
        let read = file.read(&mut buf[filled..]).await?;
        if read == 0 {
            break;
        }
        filled += read;
    }
    Ok(buf[..filled].to_vec())
}
